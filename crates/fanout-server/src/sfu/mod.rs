//! SFU (Selective Forwarding Unit)
//!
//! A publisher's audio and video are received once per room and relayed,
//! packet for packet, to every player attached to that room. Nothing is
//! decoded or transcoded.

mod endpoint;
pub mod forwarding;
mod negotiate;
mod play;
mod publish;
mod registry;
pub mod room;
mod server;
pub mod signal;

pub use endpoint::EndpointFactory;
pub use forwarding::ForwardingStream;
pub use registry::SessionRegistry;
pub use room::{PeerRole, PeerSession, Room};
pub use server::SfuServer;
