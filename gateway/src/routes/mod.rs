pub mod admin;
pub mod balances;
pub mod orders;
pub mod public;
