//! ブラウザセッション管理
//!
//! 1回のエクスポートにつきChromeを1つ起動し、終了時に必ず閉じる

mod chrome;

pub use chrome::{ChromeLauncher, ChromeSession};
