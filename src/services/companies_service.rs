use crate::api::CompanyApi;
use crate::chart::series::{create_dashboard_series, ChartSeries};
use crate::chart::theme::ChartColors;
use crate::errors::Result;
use crate::models::chart::{DashboardData, HistoryDataItem};
use crate::models::company::Company;
use crate::models::timeframe::{parse_series_date, Timeframe, VisibleRange};
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard};

pub const COMPANIES_ERROR: &str = "Failed to load companies";
pub const CHART_ERROR: &str = "Failed to load chart data";

#[derive(Debug, Clone, PartialEq)]
pub struct CompaniesState {
    pub companies: Vec<Company>,
    pub selected_ticker: Option<String>,
    pub selected_company_name: Option<String>,
    pub time_frame_values: Vec<Timeframe>,
    pub selected_timeframe: Timeframe,
    pub loading: bool,
    pub error: Option<String>,
    pub history_data: Vec<Option<HistoryDataItem>>,
    pub predictions: Option<DashboardData>,
    pub chart_loading: bool,
    pub chart_error: Option<String>,
}

impl Default for CompaniesState {
    fn default() -> Self {
        Self {
            companies: Vec::new(),
            selected_ticker: None,
            selected_company_name: None,
            time_frame_values: Timeframe::ALL.to_vec(),
            selected_timeframe: Timeframe::default(),
            loading: false,
            error: None,
            history_data: Vec::new(),
            predictions: None,
            chart_loading: false,
            chart_error: None,
        }
    }
}

impl CompaniesState {
    pub fn selected_company(&self) -> Option<&Company> {
        let ticker = self.selected_ticker.as_deref()?;
        self.companies.iter().find(|c| c.ticker == ticker)
    }

    /// Chart-ready series for the current history and forecasts.
    pub fn chart_series(&self, colors: &ChartColors) -> Result<Vec<ChartSeries>> {
        create_dashboard_series(&self.history_data, self.predictions.as_ref(), colors)
    }

    /// Visible chart range for the selected timeframe, based on the dated
    /// history points. None without usable history.
    pub fn visible_range(&self) -> Option<VisibleRange> {
        let mut dates = self
            .history_data
            .iter()
            .flatten()
            .filter_map(|item| item.date.as_deref().and_then(parse_series_date));
        let first = dates.next()?;
        let (earliest, latest) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(self.selected_timeframe.visible_range(earliest, latest))
    }
}

struct Inner {
    state: CompaniesState,
    // 每次图表请求递增，过期响应直接丢弃
    chart_generation: u64,
}

/// 公司列表与图表数据服务
pub struct CompaniesService {
    api: Arc<dyn CompanyApi>,
    inner: Mutex<Inner>,
}

impl CompaniesService {
    pub fn new(api: Arc<dyn CompanyApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner {
                state: CompaniesState::default(),
                chart_generation: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> CompaniesState {
        self.inner().state.clone()
    }

    /// Loads the company list and derives change percentages. Selects the first
    /// company when nothing is selected yet.
    pub async fn fetch_companies(&self) {
        {
            let mut inner = self.inner();
            inner.state.loading = true;
            inner.state.error = None;
        }

        let to_select = match self.api.get_companies().await {
            Ok(companies) => {
                let mut inner = self.inner();
                let state = &mut inner.state;
                state.companies = companies.into_iter().map(Company::with_derived_percent).collect();
                state.loading = false;
                info!("Loaded {} companies", state.companies.len());

                let first = match state.selected_ticker {
                    None => state.companies.first().map(|c| c.ticker.clone()),
                    Some(_) => None,
                };
                first
            }
            Err(e) => {
                error!("Error fetching companies: {}", e);
                let mut inner = self.inner();
                inner.state.error = Some(COMPANIES_ERROR.to_string());
                inner.state.loading = false;
                None
            }
        };

        if let Some(ticker) = to_select {
            self.select_company(&ticker).await;
        }
    }

    /// Fetches history and predictions for the selected ticker concurrently.
    /// `chart_loading` is always cleared once the latest request settles; a
    /// response superseded by a newer request leaves the state untouched.
    pub async fn fetch_chart_data(&self) {
        let (ticker, generation) = {
            let mut inner = self.inner();
            let Some(ticker) = inner.state.selected_ticker.clone() else {
                return;
            };
            inner.chart_generation += 1;
            inner.state.chart_loading = true;
            inner.state.chart_error = None;
            (ticker, inner.chart_generation)
        };

        let result = tokio::try_join!(
            self.api.get_company_history(&ticker),
            self.api.get_predictions(&ticker)
        );

        let mut inner = self.inner();
        if inner.chart_generation != generation {
            debug!("Discarding stale chart data for {}", ticker);
            return;
        }

        match result {
            Ok((history, predictions)) => {
                debug!("Loaded {} history points for {}", history.len(), ticker);
                inner.state.history_data = history;
                inner.state.predictions = Some(predictions);
            }
            Err(e) => {
                error!("Error fetching chart data for {}: {}", ticker, e);
                inner.state.chart_error = Some(CHART_ERROR.to_string());
            }
        }
        inner.state.chart_loading = false;
    }

    pub async fn select_company(&self, ticker: &str) {
        {
            let mut inner = self.inner();
            let state = &mut inner.state;
            state.selected_ticker = Some(ticker.to_string());
            state.selected_company_name = state
                .companies
                .iter()
                .find(|c| c.ticker == ticker)
                .map(|c| c.name.clone());
        }
        self.fetch_chart_data().await;
    }

    pub async fn set_timeframe(&self, timeframe: Timeframe) {
        self.inner().state.selected_timeframe = timeframe;
        self.fetch_companies().await;
    }
}
