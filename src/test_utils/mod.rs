//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A builder for assembling a full `AppState` from those mocks

mod app_state_builder;
mod auth_mocks;
mod factories;
mod ledger_mocks;

pub use app_state_builder::*;
pub use auth_mocks::*;
pub use factories::*;
pub use ledger_mocks::*;
