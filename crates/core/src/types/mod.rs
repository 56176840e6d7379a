//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod report;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use report::{ErrorReport, ReportedError};
pub use status::*;
