pub mod server;

pub mod actions;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod upstream;

#[cfg(test)]
mod test_support;

pub use crate::config::GatewayConfig;
pub use crate::dispatch::{CommandEnvelope, Dispatcher, ResponseEnvelope};
pub use crate::error::{GatewayError, GatewayResult};
pub use crate::upstream::{BookmarkApi, HoarderClient};
