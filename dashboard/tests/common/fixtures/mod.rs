//! This module provides reusable test utilities:
//! - Mock traffic backend (wiremock)
//! - Sample service list and detail payloads

// Allow unused code in test fixtures - not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_backend;
pub mod test_data;

// Re-export commonly used items
pub use mock_backend::MockBackend;
pub use test_data::*;
