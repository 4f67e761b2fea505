//! Google Search Console: service-account auth and URL inspection.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;
#[cfg(test)]
pub mod mock;

pub use auth::AuthenticatedSession;
pub use client::{IndexClientConfig, IndexStatusClient, SearchConsoleClient};
pub use error::{AuthError, InspectionError};
pub use types::CoverageState;
