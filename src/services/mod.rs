pub mod auth_service;
pub mod companies_service;
pub mod interpretation_service;
