//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `load` - Shared CSV-to-row-model loading
//! - `fields` - Field classification command
//! - `analyze` - Full pipeline command

pub mod analyze;
pub mod fields;
pub mod load;

// Re-export command functions for main.rs
pub use analyze::*;
pub use fields::*;
pub use load::*;
