pub mod assistant;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod poller;
pub mod provision;
pub mod session;

#[cfg(test)]
mod fakes;

pub use context::AppContext;
pub use error::{AppError, Result};
