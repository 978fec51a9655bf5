pub mod admission;
pub mod handlers;
pub mod matching;
pub mod queries;
pub mod reservations;
