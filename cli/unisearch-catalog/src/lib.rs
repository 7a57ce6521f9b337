//! HTTP client for the UniSearch catalog API.
//!
//! This crate provides:
//! - HTTP client construction with timeouts and extra headers
//! - The [ClientTrait] seam used by the listing and detail controllers
//! - Error handling for catalog API operations
//! - A canned-response client for tests (feature-gated)
//!
//! ## Usage
//!
//! ```ignore
//! use unisearch_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let client = CatalogClient::new(CatalogClientConfig::new("http://127.0.0.1:8000"))?;
//! let page = client.list_universities(&[("q".into(), "tech".into())]).await?;
//! ```

mod client;
mod config;
mod error;
mod types;

#[cfg(any(test, feature = "tests"))]
pub mod mock;

pub use client::{CatalogClient, ClientTrait};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::CatalogClientError;
pub use reqwest::StatusCode;
pub use types::{CatalogRecord, ExamValidationRequest, ListResponse, ValidatedExam};
