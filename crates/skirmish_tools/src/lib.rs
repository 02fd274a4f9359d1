//! # Skirmish Development Tools
//!
//! Command-line tools for development:
//! - Encounter data validators

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
