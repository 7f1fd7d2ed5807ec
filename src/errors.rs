use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// 非 2xx 响应，`detail` 为服务端返回的 JSON 正文（如果能解析）
    #[error("HTTP status {status}")]
    StatusError { status: u16, detail: Option<Value> },

    #[error("Unsupported series type: {0}")]
    UnsupportedSeriesType(String),

    #[error("Request aborted")]
    Aborted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),
}

impl DashboardError {
    /// Cancelled requests are not failures and must not surface as errors in the UI.
    pub fn is_aborted(&self) -> bool {
        matches!(self, DashboardError::Aborted)
    }

    /// Response body of a non-2xx reply, if any.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            DashboardError::StatusError { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// 从校验错误正文中提取可读的错误信息
///
/// `detail` may be a plain string or a list of `{msg, type, loc}` entries, in
/// which case the messages are joined.
pub fn extract_detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join(", "))
            }
        }
        _ => None,
    }
}
