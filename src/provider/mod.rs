//! Emission factor providers
//!
//! A provider turns an [`ActivityQuery`] into one aggregate CO2e figure in kg.
//! Calls are independent and fallible; the calculator zeroes any category
//! whose lookup fails or comes back empty.

mod climatiq;
mod local;

pub use climatiq::{ClimatiqProvider, estimate_request_body};
pub use local::LocalFactorProvider;

use thiserror::Error;

use crate::activity::{ActivityQuery, Unit};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider rejected the API key (HTTP 401): {0}")]
    Unauthorized(String),
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("factor for {activity_id} is per {stored}, query was in {requested}")]
    UnitMismatch {
        activity_id: String,
        stored: Unit,
        requested: Unit,
    },
    #[error("factor store error: {0}")]
    Store(String),
}

/// Source of CO2e estimates for activity quantities.
///
/// `Ok(None)` means the provider answered but had no usable figure.
pub trait EmissionFactorProvider: Send + Sync {
    fn name(&self) -> &str;

    fn estimate(&self, query: &ActivityQuery) -> Result<Option<f64>, ProviderError>;
}
