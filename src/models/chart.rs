use serde::{Deserialize, Serialize};

/// 日收盘价记录
///
/// Both fields are optional on the wire; incomplete records are dropped by the
/// series adapter instead of being null-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDataItem {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub close: Option<f64>,
}

impl HistoryDataItem {
    pub fn new(date: &str, close: f64) -> Self {
        Self {
            date: Some(date.to_string()),
            close: Some(close),
        }
    }
}

/// Forecast record as consumed by line series. Price models fill
/// `predicted_value`, GARCH fills `predicted_volatility`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionDataItem {
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_volatility: Option<f64>,
}

impl PredictionDataItem {
    pub fn value(target_date: &str, predicted_value: f64) -> Self {
        Self {
            target_date: Some(target_date.to_string()),
            predicted_value: Some(predicted_value),
            predicted_volatility: None,
        }
    }

    pub fn volatility(target_date: &str, predicted_volatility: f64) -> Self {
        Self {
            target_date: Some(target_date.to_string()),
            predicted_value: None,
            predicted_volatility: Some(predicted_volatility),
        }
    }
}

// 预测记录的字段在接口上均可能缺失，缺字段的记录由序列适配器丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaPredictionOut {
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub predicted_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarchPredictionOut {
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub predicted_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmPredictionOut {
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub predicted_value: Option<f64>,
}

impl ArimaPredictionOut {
    pub fn new(target_date: &str, predicted_value: f64) -> Self {
        Self {
            target_date: Some(target_date.to_string()),
            predicted_value: Some(predicted_value),
        }
    }
}

impl GarchPredictionOut {
    pub fn new(target_date: &str, predicted_volatility: f64) -> Self {
        Self {
            target_date: Some(target_date.to_string()),
            predicted_volatility: Some(predicted_volatility),
        }
    }
}

impl LstmPredictionOut {
    pub fn new(target_date: &str, predicted_value: f64) -> Self {
        Self {
            target_date: Some(target_date.to_string()),
            predicted_value: Some(predicted_value),
        }
    }
}

impl From<&ArimaPredictionOut> for PredictionDataItem {
    fn from(p: &ArimaPredictionOut) -> Self {
        PredictionDataItem {
            target_date: p.target_date.clone(),
            predicted_value: p.predicted_value,
            predicted_volatility: None,
        }
    }
}

impl From<&LstmPredictionOut> for PredictionDataItem {
    fn from(p: &LstmPredictionOut) -> Self {
        PredictionDataItem {
            target_date: p.target_date.clone(),
            predicted_value: p.predicted_value,
            predicted_volatility: None,
        }
    }
}

impl From<&GarchPredictionOut> for PredictionDataItem {
    fn from(p: &GarchPredictionOut) -> Self {
        PredictionDataItem {
            target_date: p.target_date.clone(),
            predicted_value: None,
            predicted_volatility: p.predicted_volatility,
        }
    }
}

/// 单个公司的全部模型预测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub ticker: String,
    pub last_update: String,
    #[serde(default)]
    pub arima_forecast: Vec<Option<ArimaPredictionOut>>,
    #[serde(default)]
    pub garch_forecast: Vec<Option<GarchPredictionOut>>,
    #[serde(default)]
    pub lstm_forecast: Vec<Option<LstmPredictionOut>>,
}

/// Normalized chart point. Candles carry open/high/low/close, line points
/// carry `value`; `time` is always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl SeriesData {
    pub fn candle(time: String, open: f64, close: f64) -> Self {
        Self {
            time,
            open: Some(open),
            high: Some(open.max(close)),
            low: Some(open.min(close)),
            close: Some(close),
            value: None,
        }
    }

    pub fn line(time: String, value: f64) -> Self {
        Self {
            time,
            open: None,
            high: None,
            low: None,
            close: None,
            value: Some(value),
        }
    }
}
