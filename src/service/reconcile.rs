use bigdecimal::{BigDecimal, Zero};

use crate::models::{CleanedLineItem, DocumentTotals, TotalsReconciliation};

/// 回退合计: 合并后明细行金额求和, 空列表记 0
pub fn fallback_total(items: &[CleanedLineItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::zero(), |acc, item| &acc + &item.amount)
}

/// 逐页置信度的算术平均, 保留两位小数
/// 一页都没有时返回 None, 不编造数字
pub fn average_confidence(confidences: &[f64]) -> Option<f64> {
    if confidences.is_empty() {
        return None;
    }
    let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

/// 文档级汇总 (回退合计 + 平均置信度)
pub fn document_totals(items: &[CleanedLineItem], confidences: &[f64]) -> DocumentTotals {
    DocumentTotals {
        fallback_total: fallback_total(items),
        estimated_confidence: average_confidence(confidences),
    }
}

/// 对账: delta = LLM 最终合计 - 回退合计, 保留符号
/// 只报差值, 阈值判定交给调用方
pub fn reconcile(items: &[CleanedLineItem], llm_final_total: &BigDecimal) -> TotalsReconciliation {
    let fallback = fallback_total(items);
    let delta = llm_final_total - &fallback;
    TotalsReconciliation {
        fallback_total: fallback,
        llm_final_total: llm_final_total.clone(),
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(description: &str, amount: &str) -> CleanedLineItem {
        CleanedLineItem {
            description: description.to_string(),
            amount: BigDecimal::from_str(amount).unwrap(),
            quantity: None,
            code: None,
        }
    }

    #[test]
    fn fallback_total_of_empty_list_is_zero() {
        assert_eq!(fallback_total(&[]), BigDecimal::zero());
    }

    #[test]
    fn fallback_total_sums_merged_amounts() {
        let items = vec![item("Consultation", "1000"), item("Lab Test CD12 x2", "150")];
        assert_eq!(fallback_total(&items), BigDecimal::from(1150));
    }

    #[test]
    fn average_confidence_of_no_pages_is_absent() {
        assert_eq!(average_confidence(&[]), None);
    }

    #[test]
    fn average_confidence_rounds_to_two_decimals() {
        assert_eq!(average_confidence(&[0.9, 0.8]), Some(0.85));
        assert_eq!(average_confidence(&[0.92]), Some(0.92));
        assert_eq!(average_confidence(&[0.333, 0.333, 0.333]), Some(0.33));
    }

    #[test]
    fn average_confidence_passes_out_of_range_values_through() {
        // 置信度不做范围校验, 越界值照常参与平均
        assert_eq!(average_confidence(&[1.5, -0.5]), Some(0.5));
        assert_eq!(average_confidence(&[2.0]), Some(2.0));
    }

    #[test]
    fn document_totals_combines_both_views() {
        let items = vec![item("Consultation", "500")];
        let totals = document_totals(&items, &[0.9, 0.8]);
        assert_eq!(totals.fallback_total, BigDecimal::from(500));
        assert_eq!(totals.estimated_confidence, Some(0.85));

        let empty = document_totals(&[], &[]);
        assert_eq!(empty.fallback_total, BigDecimal::zero());
        assert_eq!(empty.estimated_confidence, None);
    }

    #[test]
    fn reconcile_keeps_the_sign_of_the_delta() {
        let items = vec![item("Consultation", "1000"), item("Lab Test CD12 x2", "150")];

        let low = reconcile(&items, &BigDecimal::from(1000));
        assert_eq!(low.fallback_total, BigDecimal::from(1150));
        assert_eq!(low.llm_final_total, BigDecimal::from(1000));
        assert_eq!(low.delta, BigDecimal::from(-150));

        let high = reconcile(&items, &BigDecimal::from(1300));
        assert_eq!(high.delta, BigDecimal::from(150));

        let exact = reconcile(&items, &BigDecimal::from(1150));
        assert_eq!(exact.delta, BigDecimal::zero());
    }
}
