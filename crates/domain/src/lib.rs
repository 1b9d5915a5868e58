//! # CalBridge Domain
//!
//! Business domain types and models for CalBridge.
//!
//! This crate contains:
//! - Domain data types (CalendarEvent, Subscription, FeedToken)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - The dependency-free ICS parser and generator
//!
//! ## Architecture
//! - No dependencies on other CalBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
// Re-export the ICS codec
pub use utils::ics::{generate_ics, parse_ics, IcsCalendarOptions, ParsedIcsEvent};
