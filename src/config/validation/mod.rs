//! Configuration validation
//!
//! - `trait_def`: core Validate trait definition
//! - `config_validators`: server, storage, logging and top-level validators
//! - `rate_limit_validators`: policy table and degradation validators

mod config_validators;
mod rate_limit_validators;
mod trait_def;

pub use trait_def::Validate;
