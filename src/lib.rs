//! KAT Obligations Client Library
//!
//! Async client for the Bulgarian Ministry of Interior e-services API that
//! reports outstanding traffic fines (KAT obligations) for individuals and
//! businesses.
//!
//! # Modules
//!
//! - `client`: `KatApiClient`, the public operations.
//! - `classifier`: maps transport outcomes to a payload or one `KatError`.
//! - `config`: endpoint and timeout settings.
//! - `errors`: `KatError` and its type / subtype taxonomy.
//! - `models`: identities, obligations and the upstream wire format.
//! - `parser`: converts a classified payload into typed obligations.
//! - `validation`: local identifier format checks.
//!
//! # Example
//!
//! ```no_run
//! use kat_obligations::{KatApiClient, PersonalDocument};
//!
//! # async fn run() -> Result<(), kat_obligations::KatError> {
//! let client = KatApiClient::new();
//! let result = client
//!     .get_obligations_individual(
//!         "0011223344",
//!         &PersonalDocument::DrivingLicense("123456789".to_string()),
//!     )
//!     .await?;
//! println!("{} obligation(s)", result.obligations.len());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod parser;
pub mod validation;

pub use client::KatApiClient;
pub use config::ClientConfig;
pub use errors::{KatError, KatErrorSubtype, KatErrorType};
pub use models::{Identity, Obligation, ObligationQueryResult, PersonalDocument};
