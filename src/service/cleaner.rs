use bigdecimal::BigDecimal;
use indexmap::map::Entry;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

use crate::models::{CleanedLineItem, OcrLine, PaddleOcrResponse};

/// 金额 token: 可带正负号, 小数点或逗号分隔
/// 数字类统一用 [0-9]: regex 的 \d 含全部 Unicode 数字, 会把解析不了的数字串当成金额
static MONEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?[0-9]+(?:[.,][0-9]+)?").expect("Invalid money regex"));

/// 数量 (数字在前): 3x / 2 qty / 5 quantity
static QTY_BEFORE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]+)\s?(?:x|qty|quantity)\b").expect("Invalid quantity regex")
});

/// 数量 (乘号在前): x2 / qty 4
static QTY_AFTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:x|qty|quantity)\s?([0-9]+)").expect("Invalid quantity regex")
});

/// 项目编码: 2+ 大写字母紧跟 2+ 数字, 如 CD12
static CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2,}[0-9]{2,}").expect("Invalid code regex"));

/// 解析单行 OCR 文本, 提取金额/数量/编码
/// 找不到独立金额 token 的行不是错误, 返回 None 直接丢弃
pub fn parse_line(line: &OcrLine) -> Option<CleanedLineItem> {
    let text = line.text.as_str();

    // 1. 取第一个独立的数字 token 作为金额
    //    紧贴字母或数字的匹配跳过, 避免把 CD12 / x2 里的数字当成金额
    let money = MONEY_REGEX
        .find_iter(text)
        .find(|m| is_standalone(text, m.start(), m.end()))?;

    // 2. 逗号视作千分位剔除后再解析 (12,50 -> 1250)
    let normalized = money.as_str().replace(',', "");
    let amount = BigDecimal::from_str(&normalized).ok()?;

    // 3. 描述 = 原文去掉该金额 token 后两端修剪
    let description = format!("{}{}", &text[..money.start()], &text[money.end()..])
        .trim()
        .to_string();

    // 4. 数量: 数字在前优先 (3x), 其次乘号在前 (x2)
    let quantity = QTY_BEFORE_REGEX
        .captures(text)
        .or_else(|| QTY_AFTER_REGEX.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    // 5. 编码: 首个 2+大写字母 + 2+数字
    let code = CODE_REGEX.find(text).map(|m| m.as_str().to_string());

    Some(CleanedLineItem {
        description,
        amount,
        quantity,
        code,
    })
}

/// 匹配区间两侧是否都不紧贴字母或数字
fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.map_or(false, |c| c.is_ascii_alphanumeric())
        && !after.map_or(false, |c| c.is_ascii_alphanumeric())
}

/// 清洗整页 OCR 响应: 逐行解析, 无金额的行丢弃
pub fn clean_ocr_response(response: &PaddleOcrResponse) -> Vec<CleanedLineItem> {
    tracing::debug!("[Clean] 规范化 OCR 响应: {} 行", response.lines.len());
    response.lines.iter().filter_map(parse_line).collect()
}

/// 合并 key: 描述 + 编码 (无编码记 "none"), 精确区分大小写
pub fn merge_key(item: &CleanedLineItem) -> String {
    format!(
        "{}-{}",
        item.description,
        item.code.as_deref().unwrap_or("none")
    )
}

/// 按默认 key 合并跨页重复的明细行
pub fn merge_line_items(items: Vec<CleanedLineItem>) -> Vec<CleanedLineItem> {
    merge_line_items_by(items, merge_key)
}

/// 合并明细行: 同 key 的金额相加、数量相加, 描述/编码取首次出现的那条
/// 输出顺序 = key 首次出现顺序 (IndexMap 保序)
pub fn merge_line_items_by<F>(items: Vec<CleanedLineItem>, key_of: F) -> Vec<CleanedLineItem>
where
    F: Fn(&CleanedLineItem) -> String,
{
    let count = items.len();
    let mut merged: IndexMap<String, CleanedLineItem> = IndexMap::new();

    for item in items {
        match merged.entry(key_of(&item)) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.amount = &existing.amount + &item.amount;
                // 双方都缺数量时保持缺失, 不落成 0; 相加饱和, 合并不会 panic
                existing.quantity = match (existing.quantity, item.quantity) {
                    (None, None) => None,
                    (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
                };
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
            }
        }
    }

    tracing::debug!("[Clean] 合并完成: {} -> {} 行", count, merged.len());
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn line_without_digits_is_dropped() {
        assert!(parse_line(&line("Subtotal due")).is_none());
        assert!(parse_line(&line("")).is_none());
    }

    #[test]
    fn line_with_only_embedded_digits_is_dropped() {
        // CD12 里的数字紧贴字母, 不算金额
        assert!(parse_line(&line("CD12")).is_none());
        assert!(parse_line(&line("Ward A2")).is_none());
    }

    #[test]
    fn decimal_amount_is_extracted_and_removed_from_description() {
        let item = parse_line(&line("Consultation fee 12.50")).unwrap();
        assert_eq!(item.amount, dec("12.50"));
        assert_eq!(item.description, "Consultation fee");
        assert_eq!(item.quantity, None);
        assert_eq!(item.code, None);
    }

    #[test]
    fn comma_separator_is_stripped_before_parsing() {
        // 12,50 按千分位处理, 解析成 1250
        let item = parse_line(&line("Room charges 12,50")).unwrap();
        assert_eq!(item.amount, dec("1250"));
        assert_eq!(item.description, "Room charges");
    }

    #[test]
    fn negative_amount_keeps_sign() {
        let item = parse_line(&line("Discount -50")).unwrap();
        assert_eq!(item.amount, dec("-50"));
        assert_eq!(item.description, "Discount");
    }

    #[test]
    fn quantity_with_digits_before_marker() {
        let item = parse_line(&line("3x Dressing 45")).unwrap();
        assert_eq!(item.amount, dec("45"));
        assert_eq!(item.quantity, Some(3));
        assert_eq!(item.description, "3x Dressing");
    }

    #[test]
    fn quantity_and_code_do_not_shadow_the_amount() {
        let item = parse_line(&line("Lab Test CD12 x2 150")).unwrap();
        assert_eq!(item.amount, dec("150"));
        assert_eq!(item.quantity, Some(2));
        assert_eq!(item.code, Some("CD12".to_string()));
        assert_eq!(item.description, "Lab Test CD12 x2");
    }

    #[test]
    fn first_standalone_amount_wins() {
        let item = parse_line(&line("Admission 200 deposit 300")).unwrap();
        assert_eq!(item.amount, dec("200"));
        assert_eq!(item.description, "Admission  deposit 300");
    }

    #[test]
    fn non_ascii_digits_are_not_read_as_amounts() {
        // 阿拉伯文数字串不算金额 token, 后面的 ASCII 金额照常提取
        let item = parse_line(&line("Consultation ٥٠٠ 150")).unwrap();
        assert_eq!(item.amount, dec("150"));
        assert_eq!(item.description, "Consultation ٥٠٠");
        assert_eq!(item.quantity, None);
    }

    #[test]
    fn clean_ocr_response_keeps_only_parsable_lines() {
        let response = PaddleOcrResponse {
            raw_text: "Consultation 500\nThank you".to_string(),
            confidence: 0.92,
            lines: vec![line("Consultation 500"), line("Thank you")],
        };
        let cleaned = clean_ocr_response(&response);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].description, "Consultation");
    }

    #[test]
    fn merge_sums_amounts_and_keeps_first_seen_order() {
        let items = vec![
            parse_line(&line("Consultation 500")).unwrap(),
            parse_line(&line("Lab Test CD12 x2 150")).unwrap(),
            parse_line(&line("Consultation 500")).unwrap(),
        ];
        let merged = merge_line_items(items);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].description, "Consultation");
        assert_eq!(merged[0].amount, dec("1000"));
        assert_eq!(merged[0].quantity, None);
        assert_eq!(merged[0].code, None);
        assert_eq!(merged[1].description, "Lab Test CD12 x2");
        assert_eq!(merged[1].amount, dec("150"));
        assert_eq!(merged[1].quantity, Some(2));
        assert_eq!(merged[1].code, Some("CD12".to_string()));
    }

    #[test]
    fn merge_separates_same_description_with_different_codes() {
        let mut a = parse_line(&line("Scan 700")).unwrap();
        let mut b = parse_line(&line("Scan 700")).unwrap();
        a.code = Some("MR01".to_string());
        b.code = None;
        let merged = merge_line_items(vec![a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_keeps_quantity_absent_when_both_sides_lack_it() {
        let items = vec![
            parse_line(&line("Consultation 500")).unwrap(),
            parse_line(&line("Consultation 500")).unwrap(),
        ];
        let merged = merge_line_items(items);
        assert_eq!(merged[0].quantity, None);
    }

    #[test]
    fn merge_treats_one_sided_quantity_as_zero_plus_value() {
        let mut a = parse_line(&line("Injection 80")).unwrap();
        let b = parse_line(&line("Injection 80")).unwrap();
        a.quantity = Some(2);
        let merged = merge_line_items(vec![a, b]);
        assert_eq!(merged[0].quantity, Some(2));
        assert_eq!(merged[0].amount, dec("160"));
    }

    #[test]
    fn merge_saturates_quantity_instead_of_overflowing() {
        let items = vec![
            parse_line(&line("4294967295x Paracetamol 10")).unwrap(),
            parse_line(&line("4294967295x Paracetamol 10")).unwrap(),
        ];
        let merged = merge_line_items(items);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, Some(u32::MAX));
        assert_eq!(merged[0].amount, dec("20"));
    }

    #[test]
    fn merge_is_idempotent() {
        let items = vec![
            parse_line(&line("Consultation 500")).unwrap(),
            parse_line(&line("Consultation 500")).unwrap(),
            parse_line(&line("Pharmacy 120")).unwrap(),
        ];
        let once = merge_line_items(items);
        let twice = merge_line_items(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_is_commutative_up_to_order() {
        let a = parse_line(&line("Consultation 500")).unwrap();
        let b = parse_line(&line("Pharmacy 120")).unwrap();
        let c = parse_line(&line("Consultation 500")).unwrap();

        let mut forward = merge_line_items(vec![a.clone(), b.clone(), c.clone()]);
        let mut backward = merge_line_items(vec![c, b, a]);
        forward.sort_by(|x, y| merge_key(x).cmp(&merge_key(y)));
        backward.sort_by(|x, y| merge_key(x).cmp(&merge_key(y)));
        assert_eq!(forward, backward);
    }

    #[test]
    fn merge_accepts_custom_key_function() {
        let mut a = parse_line(&line("Consultation 500")).unwrap();
        let b = parse_line(&line("Consultation 500")).unwrap();
        a.description = "CONSULTATION".to_string();

        // 默认 key 区分大小写, 两条各自保留
        assert_eq!(merge_line_items(vec![a.clone(), b.clone()]).len(), 2);

        // 自定义 key 归一化大小写后即可合并
        let merged = merge_line_items_by(vec![a, b], |item| {
            format!(
                "{}-{}",
                item.description.to_lowercase(),
                item.code.as_deref().unwrap_or("none")
            )
        });
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].amount, dec("1000"));
        assert_eq!(merged[0].description, "CONSULTATION");
    }
}
