use crate::abort::AbortSignal;
use crate::errors::Result;
use crate::models::chart::{DashboardData, HistoryDataItem};
use crate::models::company::Company;
use async_trait::async_trait;

/// Company list, price history and model forecasts.
#[async_trait]
pub trait CompanyApi: Send + Sync {
    /// `GET /companies`
    async fn get_companies(&self) -> Result<Vec<Company>>;

    /// `GET /companies/{ticker}/history`, ordered by date. `None` entries are
    /// holes in the payload.
    async fn get_company_history(&self, ticker: &str) -> Result<Vec<Option<HistoryDataItem>>>;

    /// `GET /predictions/{ticker}`
    async fn get_predictions(&self, ticker: &str) -> Result<DashboardData>;
}

/// Account registration and token issuance.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<()>;

    /// Returns the bearer token issued for the credentials.
    async fn login(&self, email: &str, password: &str) -> Result<String>;
}

#[async_trait]
pub trait InterpretationApi: Send + Sync {
    /// Fetches the model interpretation text for `symbol`. Must resolve to
    /// `DashboardError::Aborted` if `signal` fires before or during the call.
    async fn get_interpretation(
        &self,
        symbol: &str,
        model_names: &[String],
        token: Option<&str>,
        signal: &AbortSignal,
    ) -> Result<String>;
}
