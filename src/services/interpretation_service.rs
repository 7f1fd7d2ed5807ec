use crate::abort::AbortSignal;
use crate::api::InterpretationApi;
use crate::errors::{DashboardError, Result};
use log::{error, info};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

pub const INTERPRETATION_ERROR: &str = "Failed to fetch interpretation";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpretationState {
    pub symbol: Option<String>,
    pub text: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpretationOutcome {
    Loaded(String),
    /// Cancelled by the caller; nothing was recorded.
    Aborted,
}

/// 模型解读服务
///
/// State changes only when a request completes; an aborted request leaves it
/// exactly as it was.
pub struct InterpretationService {
    api: Arc<dyn InterpretationApi>,
    state: Mutex<InterpretationState>,
}

impl InterpretationService {
    pub fn new(api: Arc<dyn InterpretationApi>) -> Self {
        Self {
            api,
            state: Mutex::new(InterpretationState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, InterpretationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> InterpretationState {
        self.state().clone()
    }

    pub async fn fetch(
        &self,
        symbol: &str,
        model_names: &[String],
        token: Option<&str>,
        signal: &AbortSignal,
    ) -> Result<InterpretationOutcome> {
        if signal.is_aborted() {
            return Ok(InterpretationOutcome::Aborted);
        }

        let result = self
            .api
            .get_interpretation(symbol, model_names, token, signal)
            .await;

        // 信号可能在响应返回后才触发，此时同样视为取消
        if signal.is_aborted() {
            info!("Interpretation request for {} aborted", symbol);
            return Ok(InterpretationOutcome::Aborted);
        }

        let mut state = self.state();
        match result {
            Ok(body) => {
                let text = normalize_interpretation(&body);
                *state = InterpretationState {
                    symbol: Some(symbol.to_string()),
                    text: Some(text.clone()),
                    error: None,
                };
                Ok(InterpretationOutcome::Loaded(text))
            }
            Err(DashboardError::Aborted) => Ok(InterpretationOutcome::Aborted),
            Err(e) => {
                error!("Error fetching interpretation for {}: {}", symbol, e);
                // 旧的解读属于上一个代码，不能与新代码一起保留
                *state = InterpretationState {
                    symbol: Some(symbol.to_string()),
                    text: None,
                    error: Some(INTERPRETATION_ERROR.to_string()),
                };
                Err(e)
            }
        }
    }
}

/// The endpoint answers with plain text, a JSON string, or an object carrying
/// an `interpretation` field.
pub fn normalize_interpretation(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => match map.get("interpretation") {
            Some(Value::String(s)) => s.clone(),
            _ => body.to_string(),
        },
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::{with_abort, AbortController};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FakeInterpretationApi {
        delay: Duration,
        fail: bool,
        fail_symbol: Option<&'static str>,
    }

    #[async_trait]
    impl InterpretationApi for FakeInterpretationApi {
        async fn get_interpretation(
            &self,
            symbol: &str,
            model_names: &[String],
            token: Option<&str>,
            signal: &AbortSignal,
        ) -> Result<String> {
            with_abort(signal, async {
                tokio::time::sleep(self.delay).await;
                if self.fail || self.fail_symbol == Some(symbol) {
                    return Err(DashboardError::StatusError { status: 500, detail: None });
                }
                Ok(format!(
                    r#"{{"interpretation": "{} via {} ({})"}}"#,
                    symbol,
                    model_names.join("+"),
                    token.unwrap_or("anonymous")
                ))
            })
            .await
        }
    }

    fn service(delay_ms: u64, fail: bool) -> InterpretationService {
        InterpretationService::new(Arc::new(FakeInterpretationApi {
            delay: Duration::from_millis(delay_ms),
            fail,
            fail_symbol: None,
        }))
    }

    #[tokio::test]
    async fn test_fetch_records_text() {
        let svc = service(0, false);
        let outcome = svc
            .fetch("AAPL", &["arima".to_string()], Some("tok"), &AbortSignal::never())
            .await
            .unwrap();

        assert_eq!(outcome, InterpretationOutcome::Loaded("AAPL via arima (tok)".to_string()));
        let state = svc.snapshot();
        assert_eq!(state.symbol.as_deref(), Some("AAPL"));
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_abort_before_request_leaves_state() {
        let svc = service(0, false);
        let controller = AbortController::new();
        controller.abort();

        let outcome = svc.fetch("AAPL", &[], None, &controller.signal()).await.unwrap();
        assert_eq!(outcome, InterpretationOutcome::Aborted);
        assert_eq!(svc.snapshot(), InterpretationState::default());
    }

    #[tokio::test]
    async fn test_abort_during_request_leaves_state() {
        let svc = service(200, true);
        let controller = AbortController::new();
        let signal = controller.signal();

        let (outcome, _) = tokio::join!(svc.fetch("AAPL", &[], None, &signal), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.abort();
        });

        assert_eq!(outcome.unwrap(), InterpretationOutcome::Aborted);
        assert_eq!(svc.snapshot(), InterpretationState::default());
    }

    #[tokio::test]
    async fn test_failure_sets_error() {
        let svc = service(0, true);
        let err = svc.fetch("AAPL", &[], None, &AbortSignal::never()).await.unwrap_err();
        assert!(!err.is_aborted());
        assert_eq!(svc.snapshot().error.as_deref(), Some(INTERPRETATION_ERROR));
    }

    #[tokio::test]
    async fn test_failure_drops_previous_symbol_text() {
        let svc = InterpretationService::new(Arc::new(FakeInterpretationApi {
            delay: Duration::ZERO,
            fail: false,
            fail_symbol: Some("MSFT"),
        }));
        svc.fetch("AAPL", &[], None, &AbortSignal::never()).await.unwrap();
        assert!(svc.snapshot().text.is_some());

        assert!(svc.fetch("MSFT", &[], None, &AbortSignal::never()).await.is_err());
        let state = svc.snapshot();
        assert_eq!(state.symbol.as_deref(), Some("MSFT"));
        assert_eq!(state.text, None);
        assert_eq!(state.error.as_deref(), Some(INTERPRETATION_ERROR));
    }

    #[test]
    fn test_normalize_interpretation() {
        assert_eq!(normalize_interpretation("plain text"), "plain text");
        assert_eq!(normalize_interpretation("\"quoted\""), "quoted");
        assert_eq!(normalize_interpretation(r#"{"interpretation": "x"}"#), "x");
        assert_eq!(normalize_interpretation(r#"{"other": 1}"#), r#"{"other": 1}"#);
    }
}
