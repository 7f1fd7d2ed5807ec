use crate::chart::theme::ChartColors;
use crate::errors::{DashboardError, Result};
use crate::models::chart::{DashboardData, HistoryDataItem, PredictionDataItem, SeriesData};
use log::debug;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Line,
    Candlestick,
}

impl FromStr for SeriesType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "line" => Ok(SeriesType::Line),
            "candlestick" => Ok(SeriesType::Candlestick),
            other => Err(DashboardError::UnsupportedSeriesType(other.to_string())),
        }
    }
}

/// Per-series styling. Unset fields fall back to the defaults of the series type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_scale_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_up_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_down_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wick_up_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wick_down_color: Option<String>,
}

impl SeriesOptions {
    pub fn defaults_for(series_type: SeriesType) -> Self {
        match series_type {
            SeriesType::Candlestick => Self {
                up_color: Some("#4caf50".to_string()),
                down_color: Some("#ef5350".to_string()),
                border_up_color: Some("#4caf50".to_string()),
                border_down_color: Some("#ef5350".to_string()),
                wick_up_color: Some("#4caf50".to_string()),
                wick_down_color: Some("#ef5350".to_string()),
                ..Default::default()
            },
            SeriesType::Line => Self {
                color: Some("#03a9f4".to_string()),
                line_width: Some(2),
                ..Default::default()
            },
        }
    }

    /// Field-by-field merge: every field set in `overrides` wins.
    pub fn merge(self, overrides: SeriesOptions) -> Self {
        Self {
            title: overrides.title.or(self.title),
            color: overrides.color.or(self.color),
            line_width: overrides.line_width.or(self.line_width),
            price_scale_id: overrides.price_scale_id.or(self.price_scale_id),
            up_color: overrides.up_color.or(self.up_color),
            down_color: overrides.down_color.or(self.down_color),
            border_up_color: overrides.border_up_color.or(self.border_up_color),
            border_down_color: overrides.border_down_color.or(self.border_down_color),
            wick_up_color: overrides.wick_up_color.or(self.wick_up_color),
            wick_down_color: overrides.wick_down_color.or(self.wick_down_color),
        }
    }
}

/// One renderable series, rebuilt from scratch on every data refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    pub data: Vec<SeriesData>,
    pub options: SeriesOptions,
}

/// Raw records accepted by [`create_chart_series`]. `None` entries are holes.
#[derive(Debug, Clone, Copy)]
pub enum SeriesInput<'a> {
    History(&'a [Option<HistoryDataItem>]),
    Forecast(&'a [Option<PredictionDataItem>]),
}

/// 由收盘价序列合成K线
///
/// There is no intraday data, so each candle opens at the previous close (the
/// first candle, or one following a hole, opens at its own close). Items
/// without a date or close are dropped.
pub fn create_candlestick_data(items: &[Option<HistoryDataItem>]) -> Vec<SeriesData> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let item = item.as_ref()?;
            let time = item.date.clone()?;
            let close = item.close?;
            let open = index
                .checked_sub(1)
                .and_then(|prev| items[prev].as_ref())
                .and_then(|prev| prev.close)
                .unwrap_or(close);
            Some(SeriesData::candle(time, open, close))
        })
        .collect()
}

/// Forecast records to line points. The value is `predicted_value`, or
/// `predicted_volatility` for GARCH records.
pub fn create_prediction_line_data(items: &[Option<PredictionDataItem>]) -> Vec<SeriesData> {
    items
        .iter()
        .filter_map(|item| {
            let item = item.as_ref()?;
            let time = item.target_date.clone()?;
            let value = item.predicted_value.or(item.predicted_volatility)?;
            Some(SeriesData::line(time, value))
        })
        .collect()
}

pub fn create_chart_series(
    series_type: &str,
    input: SeriesInput<'_>,
    options: Option<SeriesOptions>,
) -> Result<ChartSeries> {
    let series_type: SeriesType = series_type.parse()?;

    let data = match (series_type, input) {
        (SeriesType::Candlestick, SeriesInput::History(items)) => create_candlestick_data(items),
        (SeriesType::Line, SeriesInput::Forecast(items)) => create_prediction_line_data(items),
        (SeriesType::Candlestick, SeriesInput::Forecast(_)) => {
            return Err(DashboardError::DataError(
                "candlestick series requires history records".to_string(),
            ))
        }
        (SeriesType::Line, SeriesInput::History(_)) => {
            return Err(DashboardError::DataError(
                "line series requires forecast records".to_string(),
            ))
        }
    };

    let defaults = SeriesOptions::defaults_for(series_type);
    let options = match options {
        Some(overrides) => defaults.merge(overrides),
        None => defaults,
    };

    Ok(ChartSeries {
        series_type,
        data,
        options,
    })
}

/// 构建单个公司的全部图表序列：历史K线 + 各模型预测线
///
/// Empty inputs contribute no series.
pub fn create_dashboard_series(
    history: &[Option<HistoryDataItem>],
    predictions: Option<&DashboardData>,
    colors: &ChartColors,
) -> Result<Vec<ChartSeries>> {
    let mut series = Vec::new();

    if !history.is_empty() {
        let options = SeriesOptions {
            title: Some("Close".to_string()),
            up_color: non_empty(&colors.up),
            down_color: non_empty(&colors.down),
            border_up_color: non_empty(&colors.border_up),
            border_down_color: non_empty(&colors.border_down),
            wick_up_color: non_empty(&colors.wick_up),
            wick_down_color: non_empty(&colors.wick_down),
            ..Default::default()
        };
        series.push(create_chart_series(
            "candlestick",
            SeriesInput::History(history),
            Some(options),
        )?);
    }

    if let Some(predictions) = predictions {
        let forecasts: [(&str, &String, Option<&str>, Vec<Option<PredictionDataItem>>); 3] = [
            (
                "ARIMA",
                &colors.forecast_arima,
                None,
                predictions.arima_forecast.iter().map(|p| p.as_ref().map(PredictionDataItem::from)).collect(),
            ),
            (
                "LSTM",
                &colors.forecast_lstm,
                None,
                predictions.lstm_forecast.iter().map(|p| p.as_ref().map(PredictionDataItem::from)).collect(),
            ),
            (
                "GARCH",
                &colors.forecast_other,
                Some("volatility"),
                predictions.garch_forecast.iter().map(|p| p.as_ref().map(PredictionDataItem::from)).collect(),
            ),
        ];

        for (title, color, scale, items) in forecasts {
            if items.is_empty() {
                continue;
            }
            let options = SeriesOptions {
                title: Some(title.to_string()),
                color: non_empty(color),
                price_scale_id: scale.map(str::to_string),
                ..Default::default()
            };
            series.push(create_chart_series("line", SeriesInput::Forecast(&items), Some(options))?);
        }
    }

    debug!("Built {} chart series", series.len());
    Ok(series)
}

// 主题变量缺失时保留默认颜色
fn non_empty(color: &str) -> Option<String> {
    if color.is_empty() {
        None
    } else {
        Some(color.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chart::{ArimaPredictionOut, GarchPredictionOut, LstmPredictionOut};

    fn history(points: &[(&str, f64)]) -> Vec<Option<HistoryDataItem>> {
        points
            .iter()
            .map(|(date, close)| Some(HistoryDataItem::new(date, *close)))
            .collect()
    }

    #[test]
    fn test_candlestick_example() {
        let data = create_candlestick_data(&history(&[("2024-01-01", 10.0), ("2024-01-02", 12.0)]));
        assert_eq!(
            data,
            vec![
                SeriesData::candle("2024-01-01".into(), 10.0, 10.0),
                SeriesData::candle("2024-01-02".into(), 10.0, 12.0),
            ]
        );
        assert_eq!(data[1].high, Some(12.0));
        assert_eq!(data[1].low, Some(10.0));
    }

    #[test]
    fn test_candlestick_high_low_bounds() {
        let items = history(&[
            ("2024-01-01", 10.0),
            ("2024-01-02", 8.5),
            ("2024-01-03", 8.5),
            ("2024-01-04", 11.25),
            ("2024-01-05", 3.0),
        ]);
        let data = create_candlestick_data(&items);
        assert_eq!(data.len(), items.len());
        for point in &data {
            let (open, close) = (point.open.unwrap(), point.close.unwrap());
            assert_eq!(point.high, Some(open.max(close)));
            assert_eq!(point.low, Some(open.min(close)));
            assert_eq!(point.value, None);
        }
        assert_eq!(data[1].open, Some(10.0));
        assert_eq!(data[4].open, Some(11.25));
    }

    #[test]
    fn test_candlestick_skips_holes_and_partial_records() {
        let items = vec![
            Some(HistoryDataItem::new("2024-01-01", 10.0)),
            None,
            Some(HistoryDataItem::new("2024-01-03", 9.0)),
            Some(HistoryDataItem { date: None, close: Some(7.0) }),
            Some(HistoryDataItem { date: Some("2024-01-05".into()), close: None }),
        ];
        let data = create_candlestick_data(&items);
        assert_eq!(data.len(), 2);
        // 前一项为空洞时以自身收盘价开盘
        assert_eq!(data[1].time, "2024-01-03");
        assert_eq!(data[1].open, Some(9.0));
    }

    #[test]
    fn test_candlestick_empty() {
        assert!(create_candlestick_data(&[]).is_empty());
    }

    #[test]
    fn test_line_value_prefers_predicted_value() {
        let items = vec![
            Some(PredictionDataItem::value("2024-02-01", 101.5)),
            Some(PredictionDataItem::volatility("2024-02-02", 0.02)),
            Some(PredictionDataItem {
                target_date: Some("2024-02-03".into()),
                predicted_value: Some(99.0),
                predicted_volatility: Some(0.5),
            }),
        ];
        let data = create_prediction_line_data(&items);
        let values: Vec<f64> = data.iter().map(|p| p.value.unwrap()).collect();
        assert_eq!(values, vec![101.5, 0.02, 99.0]);
        assert!(data.iter().all(|p| p.open.is_none() && p.close.is_none()));
    }

    #[test]
    fn test_line_drops_points_without_time_or_value() {
        let items = vec![
            None,
            Some(PredictionDataItem {
                target_date: Some("2024-02-01".into()),
                ..Default::default()
            }),
            Some(PredictionDataItem {
                target_date: None,
                predicted_value: Some(3.0),
                predicted_volatility: None,
            }),
            Some(PredictionDataItem::value("2024-02-04", 4.0)),
        ];
        let data = create_prediction_line_data(&items);
        assert_eq!(data, vec![SeriesData::line("2024-02-04".into(), 4.0)]);
        assert!(data.len() <= items.len());
    }

    #[test]
    fn test_unsupported_series_type() {
        let result = create_chart_series("area", SeriesInput::History(&[]), None);
        assert!(matches!(result, Err(DashboardError::UnsupportedSeriesType(t)) if t == "area"));
    }

    #[test]
    fn test_mismatched_input_is_rejected() {
        let items = vec![Some(PredictionDataItem::value("2024-02-01", 1.0))];
        assert!(create_chart_series("candlestick", SeriesInput::Forecast(&items), None).is_err());
    }

    #[test]
    fn test_default_options_applied() {
        let series = create_chart_series("line", SeriesInput::Forecast(&[]), None).unwrap();
        assert_eq!(series.options, SeriesOptions::defaults_for(SeriesType::Line));
        assert!(series.data.is_empty());
    }

    #[test]
    fn test_caller_options_merged_over_defaults() {
        let overrides = SeriesOptions {
            up_color: Some("#00ff00".into()),
            ..Default::default()
        };
        let series = create_chart_series(
            "candlestick",
            SeriesInput::History(&history(&[("2024-01-01", 1.0)])),
            Some(overrides),
        )
        .unwrap();
        assert_eq!(series.options.up_color.as_deref(), Some("#00ff00"));
        assert_eq!(series.options.down_color.as_deref(), Some("#ef5350"));
    }

    #[test]
    fn test_series_serializes_type_tag() {
        let series = create_chart_series("candlestick", SeriesInput::History(&[]), None).unwrap();
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["type"], "candlestick");
        assert_eq!(json["options"]["upColor"], "#4caf50");
    }

    #[test]
    fn test_dashboard_series() {
        let predictions = DashboardData {
            ticker: "AAPL".into(),
            last_update: "2024-01-02".into(),
            arima_forecast: vec![Some(ArimaPredictionOut::new("2024-01-03", 12.5))],
            garch_forecast: vec![Some(GarchPredictionOut::new("2024-01-03", 0.3))],
            lstm_forecast: vec![],
        };
        let colors = ChartColors::builtin(false);
        let series = create_dashboard_series(
            &history(&[("2024-01-01", 10.0), ("2024-01-02", 12.0)]),
            Some(&predictions),
            &colors,
        )
        .unwrap();

        let titles: Vec<&str> = series.iter().filter_map(|s| s.options.title.as_deref()).collect();
        assert_eq!(titles, vec!["Close", "ARIMA", "GARCH"]);
        assert_eq!(series[1].options.color.as_deref(), Some(colors.forecast_arima.as_str()));
        assert_eq!(series[2].options.price_scale_id.as_deref(), Some("volatility"));
        assert_eq!(series[2].data[0].value, Some(0.3));
    }

    #[test]
    fn test_dashboard_series_skips_forecast_holes() {
        let predictions = DashboardData {
            ticker: "AAPL".into(),
            last_update: "2024-01-02".into(),
            arima_forecast: vec![],
            garch_forecast: vec![],
            lstm_forecast: vec![
                None,
                Some(LstmPredictionOut {
                    target_date: Some("2024-01-03".into()),
                    predicted_value: None,
                }),
                Some(LstmPredictionOut::new("2024-01-04", 13.0)),
            ],
        };
        let series = create_dashboard_series(&[], Some(&predictions), &ChartColors::builtin(false)).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].options.title.as_deref(), Some("LSTM"));
        assert_eq!(series[0].data, vec![SeriesData::line("2024-01-04".into(), 13.0)]);
    }

    #[test]
    fn test_dashboard_series_empty() {
        let series = create_dashboard_series(&[], None, &ChartColors::builtin(false)).unwrap();
        assert!(series.is_empty());
    }
}
