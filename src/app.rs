use crate::abort::AbortSignal;
use crate::api::{ApiClient, AuthApi, CompanyApi, InterpretationApi};
use crate::chart::options::{build_chart_options, ChartOptions};
use crate::chart::series::ChartSeries;
use crate::chart::theme::{ChartColors, ThemeSource};
use crate::config::Config;
use crate::errors::Result;
use crate::models::company::Company;
use crate::models::timeframe::VisibleRange;
use crate::router::{self, Route};
use crate::services::auth_service::AuthService;
use crate::services::companies_service::CompaniesService;
use crate::services::interpretation_service::{InterpretationOutcome, InterpretationService};
use crate::storage::{FileStorage, Storage};
use log::info;
use serde::Serialize;
use std::sync::Arc;

/// Everything a view needs to draw the chart for the selected company.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    pub options: ChartOptions,
    pub series: Vec<ChartSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_range: Option<VisibleRange>,
}

/// 看板上下文，持有各个服务实例并注入视图层
pub struct Dashboard {
    pub auth: AuthService,
    pub companies: CompaniesService,
    pub interpretation: InterpretationService,
}

impl Dashboard {
    /// Wires the services to the HTTP API and file-backed storage from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(ApiClient::new(config)?);
        let storage = Arc::new(FileStorage::new(config.storage_path()));
        info!("Using API at {}", client.base_url());
        info!("Session storage at {}", storage.path().display());
        Ok(Self::new(client.clone(), client.clone(), client, storage))
    }

    pub fn new(
        auth_api: Arc<dyn AuthApi>,
        company_api: Arc<dyn CompanyApi>,
        interpretation_api: Arc<dyn InterpretationApi>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            auth: AuthService::new(auth_api, storage),
            companies: CompaniesService::new(company_api),
            interpretation: InterpretationService::new(interpretation_api),
        }
    }

    /// Route rendered for `path` given the current session.
    pub fn navigate(&self, path: &str) -> Route {
        router::resolve(path, self.auth.is_authenticated())
    }

    /// Rebuilds options and series from the current theme. Call again after a
    /// theme switch.
    pub fn chart_view(&self, theme: &dyn ThemeSource) -> Result<ChartView> {
        let colors = ChartColors::resolve(theme);
        let state = self.companies.snapshot();
        Ok(ChartView {
            ticker: state.selected_ticker.clone(),
            company: state.selected_company().cloned(),
            options: build_chart_options(&colors),
            series: state.chart_series(&colors)?,
            visible_range: state.visible_range(),
        })
    }

    /// Interpretation for `symbol` using the session's bearer token.
    pub async fn interpret(
        &self,
        symbol: &str,
        model_names: &[String],
        signal: &AbortSignal,
    ) -> Result<InterpretationOutcome> {
        let token = self.auth.token();
        self.interpretation
            .fetch(symbol, model_names, token.as_deref(), signal)
            .await
    }
}
