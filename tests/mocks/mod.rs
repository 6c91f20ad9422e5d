//! Shared mocks and fixtures for integration tests
//!
//! [`InMemoryRemote`] plays the remote query service so the full stack
//! (transport client, repositories, services) runs in-process.

pub mod configs;
pub mod entities;
pub mod remote;

#[allow(unused_imports)]
pub use configs::{backoffice, backoffice_with, test_settings};
#[allow(unused_imports)]
pub use entities::Fixtures;
#[allow(unused_imports)]
pub use remote::InMemoryRemote;
