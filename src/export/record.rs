use crate::registry::CarrierInfo;

/// CSVヘッダ（列順固定）
pub const CSV_HEADER: [&str; 18] = [
    "MC Number",
    "Email",
    "Legal Name",
    "USDOT Number",
    "MC/MX/FF Numbers",
    "Entity Type",
    "Address",
    "Phone",
    "Power Units",
    "Drivers",
    "MCS-150 Form Date",
    "MCS-150 Mileage",
    "MCS-150 Mileage Year",
    "Out of Service Date",
    "Operating Status",
    "Operation Classification",
    "Carrier Operation",
    "Cargo Carried",
];

/// 出力1行分
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierRecord {
    pub mc_number: u64,
    /// 取得できなかった場合は空
    pub email: String,
    /// レジストリ取得に失敗した場合は None
    pub info: Option<CarrierInfo>,
}

impl CarrierRecord {
    pub fn new(mc_number: u64, email: impl Into<String>, info: Option<CarrierInfo>) -> Self {
        Self {
            mc_number,
            email: email.into(),
            info,
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![self.mc_number.to_string(), self.email.clone()];

        match &self.info {
            Some(info) => row.extend([
                info.legal_name.clone(),
                info.usdot.clone(),
                info.mc_mx_ff_numbers.clone(),
                info.entity_type.clone(),
                info.physical_address.clone(),
                format_phone_number(&info.phone),
                info.power_units.map(|n| n.to_string()).unwrap_or_default(),
                info.drivers.clone(),
                info.mcs_150_form_date.clone(),
                info.mcs_150_mileage_year.mileage.clone(),
                info.mcs_150_mileage_year.year.clone(),
                info.out_of_service_date.clone(),
                info.operating_status.clone(),
                info.operation_classification.join(", "),
                info.carrier_operation.join(", "),
                info.cargo_carried.join(", "),
            ]),
            None => row.resize(CSV_HEADER.len(), String::new()),
        }

        row
    }
}

/// 数字以外を除去し、10桁なら +1 を付ける
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("+1{}", digits)
    } else {
        digits
    }
}
