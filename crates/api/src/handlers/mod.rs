pub mod bolos;
pub mod incidents;
pub mod units;
