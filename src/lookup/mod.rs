//! 事業者登録ページのメールアドレス照会

mod scraper;

pub use scraper::{EmailScraper, EMAIL_XPATH};
