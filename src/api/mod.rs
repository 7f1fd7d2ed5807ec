pub mod base;
pub mod client;

pub use base::{AuthApi, CompanyApi, InterpretationApi};
pub use client::ApiClient;
