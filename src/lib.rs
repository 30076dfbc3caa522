//! Carbon Footprint Calculator
//!
//! Estimates monthly household or individual greenhouse-gas emissions from
//! survey answers, split by category and gas, with a comparison to the global
//! average and an estimate of achievable reduction.

pub mod activity;
pub mod calculator;
pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod models;
pub mod policy;
pub mod provider;
pub mod sample;

pub use calculator::{build_report, calculate_emissions, calculate_report};
pub use models::{ApiResponse, InputRecord, Report};
pub use provider::{EmissionFactorProvider, ProviderError};
