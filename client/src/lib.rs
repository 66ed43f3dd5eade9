//! Client-side session, identity and profile core for ECOBA CONNECT.
//!
//! The crate follows a hexagonal layout: `domain` holds the session state
//! machine, validation, navigation policy and the driving services; the
//! `domain::ports` module declares the identity provider and profile store
//! contracts; `outbound` provides adapters for those contracts.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::{Session, SessionStore};
