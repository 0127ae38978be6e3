use std::path::Path;
use tokio::process::Command;

use crate::models::PageImage;

/// 渲染参数, 对齐扫描件常见的 A4 纸面
const RENDER_DPI: u32 = 220;
const RENDER_WIDTH: u32 = 1700;
const RENDER_HEIGHT: u32 = 2200;

/// PDF 渲染器: 调用 pdftoppm 把每页转成 PNG
#[derive(Debug, Clone, Default)]
pub struct PdfRasterizer;

impl PdfRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// 渲染全部页面, 按页码升序返回 (页码从 1 开始)
    pub async fn render_pages(
        &self,
        pdf_bytes: &[u8],
    ) -> Result<Vec<PageImage>, Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("[PDF] 开始渲染, {} 字节", pdf_bytes.len());
        let work_dir = tempfile::tempdir()?;
        let pdf_path = work_dir.path().join("input.pdf");
        tokio::fs::write(&pdf_path, pdf_bytes).await?;

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(RENDER_DPI.to_string())
            .arg("-scale-to-x")
            .arg(RENDER_WIDTH.to_string())
            .arg("-scale-to-y")
            .arg(RENDER_HEIGHT.to_string())
            .arg(&pdf_path)
            .arg(work_dir.path().join("page"))
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("pdftoppm failed: {}", stderr.trim()).into());
        }

        let mut pages = collect_rendered_pages(work_dir.path()).await?;
        // pdftoppm 多页时会补零 (page-01.png), 按解析出的页码排序
        pages.sort_by_key(|p| p.page);

        if pages.is_empty() {
            return Err("PDF rendered no pages".into());
        }

        tracing::info!("[PDF] 渲染完成, {} 页", pages.len());
        Ok(pages)
    }
}

/// 收集工作目录里的 page-N.png 产物
async fn collect_rendered_pages(
    dir: &Path,
) -> Result<Vec<PageImage>, Box<dyn std::error::Error + Send + Sync>> {
    let mut pages = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(page) = parse_page_number(&name.to_string_lossy()) else {
            continue;
        };
        let data = tokio::fs::read(entry.path()).await?;
        pages.push(PageImage {
            page,
            mime_type: "image/png".to_string(),
            data,
        });
    }
    Ok(pages)
}

/// 从 page-N.png 文件名里取页码
fn parse_page_number(name: &str) -> Option<u32> {
    name.strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
