use crate::api::AuthApi;
use crate::errors::{extract_detail_message, DashboardError, Result};
use crate::router::Route;
use crate::storage::{Storage, TOKEN_KEY};
use log::{error, info};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub token: Option<String>,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().map_or(false, |t| !t.is_empty())
    }
}

/// 认证服务，持有令牌并同步到持久化存储
///
/// Actions return the route the view should navigate to instead of driving a
/// router themselves.
pub struct AuthService {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn Storage>,
    state: Mutex<AuthState>,
}

impl AuthService {
    /// Restores a previously stored token, if any.
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn Storage>) -> Self {
        let token = storage.get_item(TOKEN_KEY).filter(|t| !t.is_empty());
        if token.is_some() {
            info!("Restored session token from storage");
        }
        Self {
            api,
            storage,
            state: Mutex::new(AuthState { token, error: None }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> AuthState {
        self.state().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Registers the account and logs straight in. The failure message is
    /// recorded before the error is returned.
    pub async fn register(&self, email: &str, password: &str) -> Result<Route> {
        self.state().error = None;

        if let Err(e) = self.api.register(email, password).await {
            error!("Registration failed for {}: {}", email, e);
            self.state().error = Some(failure_message(&e, "registration"));
            return Err(e);
        }

        self.login(email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Route> {
        self.state().error = None;

        let token = match self.api.login(email, password).await {
            Ok(token) => token,
            Err(e) => {
                error!("Login failed for {}: {}", email, e);
                self.state().error = Some(failure_message(&e, "login"));
                return Err(e);
            }
        };

        // 内存与存储在同一把锁内更新，并发登录时以最后完成者为准
        let mut state = self.state();
        if let Err(e) = self.storage.set_item(TOKEN_KEY, &token) {
            state.error = Some(failure_message(&e, "login"));
            return Err(e);
        }
        state.token = Some(token);
        info!("Logged in as {}", email);
        Ok(Route::Dashboard)
    }

    /// Forgets the session. Memory is only cleared once the stored token is
    /// gone, so a failed removal leaves the session intact.
    pub fn logout(&self) -> Result<Route> {
        let mut state = self.state();
        if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
            error!("Failed to remove stored token: {}", e);
            return Err(e);
        }
        state.token = None;
        state.error = None;
        info!("Logged out");
        Ok(Route::Login)
    }
}

/// User-facing message for a failed auth request: the server's `detail` when it
/// has one, otherwise a generic fallback.
pub fn failure_message(err: &DashboardError, action: &str) -> String {
    match err {
        DashboardError::StatusError { .. } => err
            .response_body()
            .and_then(extract_detail_message)
            .unwrap_or_else(|| format!("An error occurred during {}.", action)),
        DashboardError::RequestError(_) => format!("An error occurred during {}.", action),
        _ => format!("An unexpected error occurred during {}.", action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeAuthApi {
        login_error: Option<Value>,
        register_error: Option<Value>,
    }

    fn status_error(body: &Value) -> DashboardError {
        DashboardError::StatusError {
            status: 422,
            detail: Some(body.clone()),
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuthApi {
        async fn register(&self, _email: &str, _password: &str) -> Result<()> {
            match &self.register_error {
                Some(body) => Err(status_error(body)),
                None => Ok(()),
            }
        }

        async fn login(&self, email: &str, _password: &str) -> Result<String> {
            if let Some(body) = &self.login_error {
                return Err(status_error(body));
            }
            // slow-* 账号模拟较慢的响应
            if email.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(40)).await;
            }
            Ok(format!("token-{}", email))
        }
    }

    fn service(api: FakeAuthApi) -> (AuthService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (AuthService::new(Arc::new(api), storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let (auth, storage) = service(FakeAuthApi::default());
        assert!(!auth.is_authenticated());

        let next = auth.login("a@b.com", "pw").await.unwrap();
        assert_eq!(next, Route::Dashboard);
        assert!(auth.is_authenticated());
        assert_eq!(auth.token().as_deref(), Some("token-a@b.com"));
        assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("token-a@b.com"));
    }

    #[tokio::test]
    async fn test_login_failure_detail_list() {
        let (auth, storage) = service(FakeAuthApi {
            login_error: Some(json!({"detail": [{"msg": "bad email", "type": "value_error", "loc": ["body"]}]})),
            ..Default::default()
        });

        assert!(auth.login("bad", "pw").await.is_err());
        assert_eq!(auth.error().as_deref(), Some("bad email"));
        assert!(!auth.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_login_failure_without_detail_uses_fallback() {
        let (auth, _) = service(FakeAuthApi {
            login_error: Some(json!({"message": "nope"})),
            ..Default::default()
        });

        assert!(auth.login("a", "pw").await.is_err());
        assert_eq!(auth.error().as_deref(), Some("An error occurred during login."));
    }

    #[tokio::test]
    async fn test_register_logs_in() {
        let (auth, storage) = service(FakeAuthApi::default());
        let next = auth.register("new@b.com", "pw").await.unwrap();
        assert_eq!(next, Route::Dashboard);
        assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("token-new@b.com"));
    }

    #[tokio::test]
    async fn test_register_failure_detail_string() {
        let (auth, _) = service(FakeAuthApi {
            register_error: Some(json!({"detail": "Email already registered"})),
            ..Default::default()
        });

        let err = auth.register("dup@b.com", "pw").await.unwrap_err();
        assert!(matches!(err, DashboardError::StatusError { status: 422, .. }));
        assert_eq!(auth.error().as_deref(), Some("Email already registered"));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_token() {
        let (auth, storage) = service(FakeAuthApi::default());
        auth.login("a@b.com", "pw").await.unwrap();

        assert_eq!(auth.logout().unwrap(), Route::Login);
        assert!(!auth.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_register_ok_then_login_failure() {
        let (auth, storage) = service(FakeAuthApi {
            login_error: Some(json!({"detail": "Incorrect email or password"})),
            ..Default::default()
        });

        let err = auth.register("new@b.com", "pw").await.unwrap_err();
        assert!(matches!(err, DashboardError::StatusError { status: 422, .. }));
        // 注册成功后登录失败，记录的是登录的错误信息
        assert_eq!(auth.error().as_deref(), Some("Incorrect email or password"));
        assert!(!auth.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY), None);
    }

    /// 删除操作失败的存储
    struct StuckStorage {
        inner: MemoryStorage,
    }

    impl Storage for StuckStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, _key: &str) -> Result<()> {
            Err(DashboardError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only storage",
            )))
        }
    }

    #[tokio::test]
    async fn test_logout_keeps_session_when_removal_fails() {
        let storage = Arc::new(StuckStorage {
            inner: MemoryStorage::new(),
        });
        let auth = AuthService::new(Arc::new(FakeAuthApi::default()), storage.clone());
        auth.login("a@b.com", "pw").await.unwrap();

        assert!(auth.logout().is_err());
        // 内存与存储保持一致，重启后恢复的会话与当前一致
        assert!(auth.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY), auth.token());
    }

    #[tokio::test]
    async fn test_restores_token_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "saved").unwrap();
        let auth = AuthService::new(Arc::new(FakeAuthApi::default()), storage);
        assert!(auth.is_authenticated());
        assert_eq!(auth.token().as_deref(), Some("saved"));
    }

    #[tokio::test]
    async fn test_overlapping_logins_last_write_wins() {
        let (auth, storage) = service(FakeAuthApi::default());

        let (slow, fast) = tokio::join!(auth.login("slow@b.com", "pw"), auth.login("fast@b.com", "pw"));
        slow.unwrap();
        fast.unwrap();

        assert_eq!(auth.token().as_deref(), Some("token-slow@b.com"));
        assert_eq!(storage.get_item(TOKEN_KEY), auth.token());
    }

    #[test]
    fn test_failure_message_non_http() {
        let err = DashboardError::DataError("boom".into());
        assert_eq!(
            failure_message(&err, "registration"),
            "An unexpected error occurred during registration."
        );
    }
}
