use crate::errors::{DashboardError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "5D")]
    FiveDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "MAX")]
    Max,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::OneDay,
        Timeframe::FiveDays,
        Timeframe::OneMonth,
        Timeframe::SixMonths,
        Timeframe::YearToDate,
        Timeframe::OneYear,
        Timeframe::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1D",
            Timeframe::FiveDays => "5D",
            Timeframe::OneMonth => "1M",
            Timeframe::SixMonths => "6M",
            Timeframe::YearToDate => "YTD",
            Timeframe::OneYear => "1Y",
            Timeframe::Max => "MAX",
        }
    }

    /// 根据最新交易日计算图表的可见区间
    ///
    /// The start never precedes `earliest`, so short histories are shown whole.
    pub fn visible_range(&self, earliest: NaiveDate, latest: NaiveDate) -> VisibleRange {
        let start = match self {
            Timeframe::OneDay => latest - Duration::days(1),
            Timeframe::FiveDays => latest - Duration::days(5),
            Timeframe::OneMonth => latest.checked_sub_months(Months::new(1)).unwrap_or(earliest),
            Timeframe::SixMonths => latest.checked_sub_months(Months::new(6)).unwrap_or(earliest),
            Timeframe::YearToDate => {
                NaiveDate::from_ymd_opt(latest.year(), 1, 1).unwrap_or(earliest)
            }
            Timeframe::OneYear => latest.checked_sub_months(Months::new(12)).unwrap_or(earliest),
            Timeframe::Max => earliest,
        };

        VisibleRange {
            from: start.max(earliest).format("%Y-%m-%d").to_string(),
            to: latest.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::OneDay
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::DataError(format!("Unknown timeframe: {}", s)))
    }
}

/// Range handed to the chart's `setVisibleRange`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub from: String,
    pub to: String,
}

/// Parses the date part of a history/forecast time key (`YYYY-MM-DD[...]`).
pub fn parse_series_date(time: &str) -> Option<NaiveDate> {
    let date_part = time.get(0..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
