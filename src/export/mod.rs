//! CSVエクスポートモジュール
//!
//! MC番号レンジを昇順に処理し、1番号につき1行を書き出す

mod pipeline;
mod range;
mod record;

pub use pipeline::ExportPipeline;
pub use range::{CarrierFilter, McRange};
pub use record::{format_phone_number, CarrierRecord, CSV_HEADER};
