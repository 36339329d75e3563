use crate::error::ScraperError;

/// 照会するMC番号の範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McRange {
    start: u64,
    end: u64,
}

impl McRange {
    pub fn new(start: u64, end: u64) -> Result<Self, ScraperError> {
        if start == 0 || end == 0 {
            return Err(ScraperError::Validation(
                "MC番号は1以上を指定してください".to_string(),
            ));
        }
        if start > end {
            return Err(ScraperError::Validation(format!(
                "開始MC番号({})が終了MC番号({})より大きいです",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 上限件数つきで作成
    pub fn bounded(start: u64, end: u64, max_len: u64) -> Result<Self, ScraperError> {
        let range = Self::new(start, end)?;
        if range.count() > max_len {
            return Err(ScraperError::Validation(format!(
                "一度に照会できるのは{}件までです（指定: {}件）",
                max_len,
                range.count()
            )));
        }
        Ok(range)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// 件数（end - start + 1）
    pub fn count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// 昇順
    pub fn ids(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}

/// 出力対象の絞り込み
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarrierFilter {
    /// 全MC番号を1行ずつ出力
    #[default]
    All,
    /// 車両1台かつ "authorized for property" の事業者のみ
    SingleUnitProperty,
}

impl CarrierFilter {
    pub fn from_form_value(value: Option<&str>) -> Result<Self, ScraperError> {
        match value.map(str::trim) {
            None | Some("") | Some("all") => Ok(Self::All),
            Some("single_unit_property") => Ok(Self::SingleUnitProperty),
            Some(other) => Err(ScraperError::Validation(format!(
                "不明なフィルタ: {}",
                other
            ))),
        }
    }
}
