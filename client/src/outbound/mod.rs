//! Outbound adapters implementing the domain ports.
//!
//! - **memory**: deterministic in-process identity provider and profile store
//!   for tests and local development
//! - **supabase**: reqwest adapters for the hosted GoTrue and PostgREST APIs
//!
//! Adapters translate between domain types and provider payloads. They
//! contain no session or validation rules.

pub mod memory;
pub mod supabase;
