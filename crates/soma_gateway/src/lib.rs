//! # Soma Gateway
//!
//! Optional WebSocket surface for the simulation. Every output entry is
//! broadcast to connected listeners together with periodic state frames;
//! clients send speech, actions and environment changes back in.

pub mod hub;
pub mod server;
pub mod types;

pub use hub::Hub;
pub use server::GatewayServer;
pub use types::{ClientMessage, ProtocolError, ServerMessage};
