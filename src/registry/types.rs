//! SaferWeb スナップショットの型定義
//!
//! APIは同じ項目を数値で返したり文字列で返したり null を返したりするため、
//! 項目ごとに寛容なデシリアライザを通す

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 事業者情報（MC番号単位）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub legal_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub usdot: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mc_mx_ff_numbers: String,
    #[serde(deserialize_with = "lenient_string")]
    pub entity_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub physical_address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub power_units: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    pub drivers: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mcs_150_form_date: String,
    #[serde(deserialize_with = "lenient_mileage")]
    pub mcs_150_mileage_year: MileageYear,
    #[serde(deserialize_with = "lenient_string")]
    pub out_of_service_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub operating_status: String,
    #[serde(deserialize_with = "lenient_list")]
    pub operation_classification: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub carrier_operation: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub cargo_carried: Vec<String>,
}

/// MCS-150 走行距離と対象年
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MileageYear {
    #[serde(deserialize_with = "lenient_string")]
    pub mileage: String,
    #[serde(deserialize_with = "lenient_string")]
    pub year: String,
}

impl CarrierInfo {
    /// スクレイプ対象のUSDOT番号（数値として解釈できる場合のみ）
    pub fn usdot_number(&self) -> Option<u64> {
        self.usdot.trim().parse().ok()
    }

    /// 車両1台かつ "authorized for property" の事業者か
    pub fn is_single_unit_property(&self) -> bool {
        self.power_units == Some(1)
            && self
                .operating_status
                .to_lowercase()
                .contains("authorized for property")
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn lenient_mileage<'de, D>(deserializer: D) -> Result<MileageYear, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<MileageYear>::deserialize(deserializer)?.unwrap_or_default())
}
