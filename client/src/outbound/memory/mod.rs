//! In-process adapters.
//!
//! The identity gateway provisions profile rows in the paired repository on
//! sign-up, standing in for the provider-side trigger.

mod identity_gateway;
mod profile_repository;

pub use identity_gateway::{GatewayOperation, InMemoryIdentityGateway};
pub use profile_repository::InMemoryProfileRepository;
