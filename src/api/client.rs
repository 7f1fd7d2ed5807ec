use crate::abort::{with_abort, AbortSignal};
use crate::api::base::{AuthApi, CompanyApi, InterpretationApi};
use crate::config::Config;
use crate::errors::{DashboardError, Result};
use crate::models::chart::{DashboardData, HistoryDataItem};
use crate::models::company::Company;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// 看板 REST API 客户端
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(DashboardError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Appends `segments` to the base URL path. Each segment is percent-encoded,
    /// so a ticker containing `/`, `?` or `#` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DashboardError::ConfigError(format!("Invalid API url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::ConfigError(format!("API url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turns a non-2xx reply into `StatusError`, keeping the JSON body when
    /// there is one.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&text).ok();
        warn!("Request failed: HTTP status {}", status);
        Err(DashboardError::StatusError {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CompanyApi for ApiClient {
    async fn get_companies(&self) -> Result<Vec<Company>> {
        let companies: Vec<Company> = self.get_json(&["companies"]).await?;
        info!("Fetched {} companies", companies.len());
        Ok(companies)
    }

    async fn get_company_history(&self, ticker: &str) -> Result<Vec<Option<HistoryDataItem>>> {
        self.get_json(&["companies", ticker, "history"]).await
    }

    async fn get_predictions(&self, ticker: &str) -> Result<DashboardData> {
        self.get_json(&["predictions", ticker]).await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, email: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint(&["api", "v1", "register"])?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::check_status(response).await?;
        info!("Registered account {}", email);
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint(&["api", "v1", "login"])?)
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let token: TokenResponse = serde_json::from_str(&response.text().await?)?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl InterpretationApi for ApiClient {
    async fn get_interpretation(
        &self,
        symbol: &str,
        model_names: &[String],
        token: Option<&str>,
        signal: &AbortSignal,
    ) -> Result<String> {
        let query: Vec<(&str, String)> = model_names
            .iter()
            .map(|name| ("model_names", name.to_lowercase()))
            .collect();

        let mut request = self
            .client
            .get(self.endpoint(&["api", "v1", "interpret", symbol])?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(&query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        with_abort(signal, async move {
            let response = request.send().await?;
            let response = Self::check_status(response).await?;
            Ok::<String, DashboardError>(response.text().await?)
        })
        .await
    }
}
