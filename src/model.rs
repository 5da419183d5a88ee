// src/model.rs
//! Receipt record as extracted and stored.
//!
//! Field names serialize to the store's camelCase keys (`checkID`, `userInn`,
//! `ecashTotalSum`, ...). Absent optionals are omitted from the JSON. Amounts
//! are kept as 2-dp decimals in memory and written as JSON numbers.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub type CheckId = u64;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(rename = "checkID")]
    pub check_id: CheckId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_inn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub total_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub cash_total_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub ecash_total_sum: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_taxation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kkt_reg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_drive_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_document_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub no_nds: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub nds0: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub nds10: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub nds20: Option<Decimal>,
}

impl Receipt {
    pub fn new(check_id: CheckId) -> Self {
        Self { check_id, ..Default::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub position_number: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
}

/// Round to exactly two fractional digits, half-to-even. Idempotent.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Parse an amount cell ("123.456", " 7 ", "-0.5") into a 2-dp decimal.
/// Accepts exponent notation too, since the source occasionally emits it.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    let t = t.strip_prefix('+').unwrap_or(t);
    Decimal::from_str(t)
        .or_else(|_| Decimal::from_scientific(t))
        .ok()
        .map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn round2_is_idempotent() {
        for raw in ["1.005", "2.675", "10", "0.125", "-3.14159", "99.999"] {
            let once = round2(dec(raw));
            assert_eq!(round2(once), once, "{raw}");
            assert!(once.scale() <= 2);
        }
    }

    #[test]
    fn parse_amount_rounds_and_is_stable() {
        assert_eq!(parse_amount(" 12.345 "), Some(dec("12.34")));
        assert_eq!(parse_amount("12.355"), Some(dec("12.36")));
        assert_eq!(parse_amount("7"), Some(dec("7")));
        // Parsing the printed result again yields the same value.
        let first = parse_amount("1.999").unwrap();
        assert_eq!(parse_amount(&first.to_string()), Some(first));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("nalog.ru"), None);
        assert_eq!(parse_amount("12,50"), None);
    }

    #[test]
    fn receipt_serializes_with_store_keys() {
        let mut r = Receipt::new(42);
        r.user_inn = Some(s!("7700000000"));
        r.kkt_reg_id = Some(s!("0001"));
        r.ecash_total_sum = Decimal::from_f64(150.5);
        r.nds20 = Some(dec("25.08"));
        r.items.push(LineItem {
            position_number: 1,
            name: s!("Хлеб"),
            price: dec("50.17"),
            quantity: dec("3"),
            sum: dec("150.5"),
        });
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["checkID"], 42);
        assert_eq!(v["userInn"], "7700000000");
        assert_eq!(v["kktRegId"], "0001");
        assert_eq!(v["ecashTotalSum"], 150.5);
        assert_eq!(v["nds20"], 25.08);
        assert_eq!(v["items"][0]["positionNumber"], 1);
        assert_eq!(v["items"][0]["sum"], 150.5);
        assert!(v.get("totalSum").is_none());
        assert!(v.get("metadata").is_none());
    }

    #[test]
    fn receipt_reads_back_from_store_json() {
        let json = r#"{
            "checkID": 7,
            "user": "ООО Ромашка",
            "metadata": {"address": "Москва"},
            "items": [{"positionNumber": 1, "name": "x", "price": 1.5, "quantity": 2.0, "sum": 3.0}],
            "totalSum": 3.0
        }"#;
        let r: Receipt = serde_json::from_str(json).unwrap();
        assert_eq!(r.check_id, 7);
        assert_eq!(r.metadata.unwrap().address, "Москва");
        assert_eq!(r.items[0].price, dec("1.5"));
        assert_eq!(r.total_sum, Some(dec("3")));
        assert_eq!(r.cash_total_sum, None);
    }
}
