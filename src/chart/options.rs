use crate::chart::theme::ChartColors;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub auto_size: bool,
    pub layout: LayoutOptions,
    pub grid: GridOptions,
    pub time_scale: TimeScaleOptions,
    pub crosshair: CrosshairOptions,
    pub right_price_scale: PriceScaleOptions,
    pub localization: LocalizationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub background: Background,
    pub text_color: String,
    pub font_size: u32,
    pub font_family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Background {
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOptions {
    pub vert_lines: LineColor,
    pub horz_lines: LineColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineColor {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeScaleOptions {
    pub border_color: String,
    pub time_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrosshairMode {
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineStyle {
    Solid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosshairOptions {
    pub mode: CrosshairMode,
    pub vert_line: CrosshairLine,
    pub horz_line: CrosshairLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosshairLine {
    pub width: u32,
    pub color: String,
    pub style: LineStyle,
    pub label_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_background_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceScaleOptions {
    pub border_color: String,
    pub scale_margins: ScaleMargins,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleMargins {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationOptions {
    pub locale: String,
    pub date_format: String,
}

/// 根据当前主题颜色生成图表配置，每次主题切换后需重新调用
pub fn build_chart_options(colors: &ChartColors) -> ChartOptions {
    ChartOptions {
        auto_size: true,
        layout: LayoutOptions {
            background: Background {
                kind: "solid".to_string(),
                color: colors.background.clone(),
            },
            text_color: colors.text.clone(),
            font_size: 11,
            font_family: "Roboto, sans-serif".to_string(),
        },
        grid: GridOptions {
            vert_lines: LineColor { color: colors.grid.clone() },
            horz_lines: LineColor { color: colors.grid.clone() },
        },
        time_scale: TimeScaleOptions {
            border_color: colors.scale_border.clone(),
            time_visible: true,
        },
        crosshair: CrosshairOptions {
            mode: CrosshairMode::Normal,
            vert_line: CrosshairLine {
                width: 2,
                color: "rgba(224, 227, 235, 0.1)".to_string(),
                style: LineStyle::Solid,
                label_visible: false,
                label_background_color: None,
            },
            horz_line: CrosshairLine {
                width: 2,
                color: colors.crosshair.clone(),
                style: LineStyle::Solid,
                label_visible: true,
                label_background_color: Some(colors.background.clone()),
            },
        },
        right_price_scale: PriceScaleOptions {
            border_color: colors.scale_border.clone(),
            scale_margins: ScaleMargins { top: 0.3, bottom: 0.25 },
        },
        localization: LocalizationOptions {
            locale: "en-US".to_string(),
            date_format: "yyyy-MM-dd".to_string(),
        },
    }
}
