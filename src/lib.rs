pub mod auth;
pub mod bridge;
pub mod config;
pub mod core;
pub mod document;
pub mod normalize;
pub mod payload;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{AgentBridge, AgentBridgeBuilder};
pub use config::BridgeConfig;
pub use crate::core::error::BridgeError;
pub use crate::core::types::*;
pub use document::DocumentContext;
