//! SaferWeb レジストリ API モジュール
//!
//! MC番号ごとに事業者スナップショットを1回取得する

mod client;
mod types;

pub use client::SaferClient;
pub use types::{CarrierInfo, MileageYear};
