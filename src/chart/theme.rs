use serde::Serialize;
use std::collections::HashMap;

/// 默认深色主题样式表，图表颜色均来自这些 CSS 变量
pub const DEFAULT_STYLESHEET: &str = r#"
:root {
  --color-surface: #1E1E1E;
  --color-chart-up: #4caf50;
  --color-chart-down: #ef5350;
  --color-chart-border: #cccccc;
  --color-chart-wick-black: #000000;
  --color-chart-grid: #2A2A2A;
  --color-chart-text: #D1D4DC;
  --color-chart-crosshair: #9B7DFF;
  --color-chart-border-scale: #cccccc;
  --color-chart-line-forecast-arima: #03a9f4;
  --color-chart-line-forecast-lstm: #ab47bc;
  --color-chart-line-forecast-other: #ffb300;
}

.light-theme {
  --color-surface: #FFFFFF;
  --color-chart-grid: #EDF1F7;
  --color-chart-text: #0C1625;
  --color-chart-crosshair: #2563EB;
  --color-chart-border-scale: #5B6678;
}
"#;

/// Anything that can answer "what is the computed value of this CSS custom
/// property right now".
pub trait ThemeSource {
    fn property(&self, name: &str) -> Option<String>;
}

impl ThemeSource for HashMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Custom property declarations grouped by rule selector.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<(String, Vec<(String, String)>)>,
}

impl Stylesheet {
    /// Extracts `--name: value;` declarations from every rule. Comments and
    /// non-custom properties are ignored; malformed rules are skipped.
    pub fn parse(css: &str) -> Self {
        let mut rules = Vec::new();
        let mut rest = strip_comments(css);

        while let Some(open) = rest.find('{') {
            let selector = rest[..open].trim().to_string();
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };

            let declarations: Vec<(String, String)> = after[..close]
                .split(';')
                .filter_map(|decl| {
                    let (name, value) = decl.split_once(':')?;
                    let name = name.trim();
                    name.starts_with("--")
                        .then(|| (name.to_string(), value.trim().to_string()))
                })
                .collect();

            rules.push((selector, declarations));
            rest = after[close + 1..].to_string();
        }

        Self { rules }
    }

    /// Computed custom properties for the document root, with the rules of the
    /// active theme class (if any) applied on top.
    pub fn computed(&self, theme_class: Option<&str>) -> ComputedStyle {
        let theme_selector = theme_class.map(|class| format!(".{}", class.trim_start_matches('.')));
        let mut properties = HashMap::new();

        for (selector, declarations) in &self.rules {
            if selector == ":root" {
                properties.extend(declarations.iter().cloned());
            }
        }
        if let Some(theme_selector) = theme_selector {
            for (selector, declarations) in &self.rules {
                if *selector == theme_selector {
                    properties.extend(declarations.iter().cloned());
                }
            }
        }

        ComputedStyle { properties }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Default)]
pub struct ComputedStyle {
    properties: HashMap<String, String>,
}

impl ThemeSource for ComputedStyle {
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }
}

/// Trimmed value of a custom property, or an empty string when undefined.
pub fn get_theme_color(source: &dyn ThemeSource, variable: &str) -> String {
    source
        .property(variable)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Named chart color tokens. Resolve again after every theme switch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartColors {
    pub up: String,
    pub down: String,
    pub border: String,
    pub border_up: String,
    pub border_down: String,
    pub wick_up: String,
    pub wick_down: String,
    pub wick: String,
    pub grid: String,
    pub text: String,
    pub crosshair: String,
    pub scale_border: String,
    pub forecast_arima: String,
    pub forecast_lstm: String,
    pub forecast_other: String,
    pub background: String,
}

impl ChartColors {
    pub fn resolve(source: &dyn ThemeSource) -> Self {
        let color = |name: &str| get_theme_color(source, name);
        Self {
            up: color("--color-chart-up"),
            down: color("--color-chart-down"),
            border: color("--color-chart-border"),
            border_up: color("--color-chart-up"),
            border_down: color("--color-chart-down"),
            wick_up: color("--color-chart-up"),
            wick_down: color("--color-chart-down"),
            wick: color("--color-chart-wick-black"),
            grid: color("--color-chart-grid"),
            text: color("--color-chart-text"),
            crosshair: color("--color-chart-crosshair"),
            scale_border: color("--color-chart-border-scale"),
            forecast_arima: color("--color-chart-line-forecast-arima"),
            forecast_lstm: color("--color-chart-line-forecast-lstm"),
            forecast_other: color("--color-chart-line-forecast-other"),
            background: color("--color-surface"),
        }
    }

    /// Colors of the built-in stylesheet, dark or with `.light-theme` applied.
    pub fn builtin(light: bool) -> Self {
        let sheet = Stylesheet::parse(DEFAULT_STYLESHEET);
        let style = sheet.computed(if light { Some("light-theme") } else { None });
        Self::resolve(&style)
    }
}
