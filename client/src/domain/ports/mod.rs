//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_gateway;
mod navigator;
mod profile_repository;

#[cfg(test)]
pub use identity_gateway::MockIdentityGateway;
pub use identity_gateway::{IdentityGateway, IdentityGatewayError, SessionChangeListener};
#[cfg(test)]
pub use navigator::MockNavigator;
pub use navigator::Navigator;
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError};
