//! Pure dispatch domain types and rules.
//!
//! Nothing here touches storage or the network, so the rules that decide
//! unit assignment can be tested without either.

pub mod assignment;
pub mod bolo;
pub mod error;
pub mod incident_stack;
pub mod settings;
pub mod status;
pub mod types;
pub mod unit;
