pub mod options;
pub mod series;
pub mod theme;
