pub mod balance;
pub mod constants;
pub mod errors;
pub mod formatting;
pub mod models;
pub mod notifications;
pub mod services;
pub mod session;
pub mod settlement;
