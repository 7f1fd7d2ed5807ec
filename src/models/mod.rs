pub mod chart;
pub mod company;
pub mod timeframe;
