use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("設定が見つかりません: {0}")]
    MissingConfig(String),

    #[error("設定値が不正です: {0}")]
    InvalidConfig(String),

    #[error("ブラウザセッションが切断されました: {0}")]
    SessionClosed(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("SaferWeb APIエラー: {0}")]
    Api(String),

    #[error("SaferWeb APIエラー: MC={mc_number} status={status}")]
    ApiStatus { mc_number: u64, status: u16 },

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("CSV書き込みエラー: {0}")]
    Csv(#[from] csv::Error),
}

impl ScraperError {
    /// 起動環境（ブラウザ・APIキー・設定）の問題か
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            Self::BrowserInit(_) | Self::MissingConfig(_) | Self::InvalidConfig(_)
        )
    }

    /// セッション自体が使えなくなったか（エクスポート全体を中断する）
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionClosed(_))
    }

    /// HTTPレスポンスのステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::SessionClosed(_) => 502,
            _ => 500,
        }
    }
}
