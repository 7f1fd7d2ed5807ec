// 公开导出的模块，供外部使用
pub mod abort;
pub mod api;
pub mod app;
pub mod chart;
pub mod config;
pub mod errors;
pub mod models;
pub mod router;
pub mod services;
pub mod storage;

// 重新导出常用类型，方便使用
pub use app::Dashboard;
pub use chart::series::{create_chart_series, ChartSeries, SeriesInput, SeriesType};
pub use errors::{DashboardError, Result};
pub use models::chart::{DashboardData, HistoryDataItem, PredictionDataItem, SeriesData};
pub use models::company::Company;
