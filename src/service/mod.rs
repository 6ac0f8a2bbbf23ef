//! Service layer: orchestration of registry writes and broadcasts.

pub mod relay_service;

pub use relay_service::RelayService;
