// Declare modules at the root level
pub mod actions;
pub mod chains;
pub mod contract;
pub mod domain;
pub mod error;
pub mod forms;
pub mod inventory;
pub mod metadata;
pub mod pricing;
pub mod session;
pub mod source;
pub mod summary;
pub mod time;
pub mod units;
pub mod validators;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::actions;
    pub use super::chains;
    pub use super::contract;
    pub use super::domain;
    pub use super::error;
    pub use super::forms;
    pub use super::inventory;
    pub use super::metadata;
    pub use super::pricing;
    pub use super::session;
    pub use super::source;
    pub use super::summary;
    pub use super::time;
    pub use super::units;
    pub use super::validators;
}

// Also re-export at root for convenience
pub use actions::*;
pub use chains::*;
pub use contract::*;
pub use domain::*;
pub use error::*;
pub use forms::*;
pub use inventory::*;
pub use metadata::*;
pub use pricing::*;
pub use session::*;
pub use source::*;
pub use summary::*;
pub use time::*;
pub use units::*;
pub use validators::*;
