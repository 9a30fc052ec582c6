use std::net::SocketAddr;
use std::time::Duration;

use super::{EndpointFactory, SessionRegistry};
use crate::error::Result;
use crate::state::Config;

/// The SFU: owns the endpoint factory and the room registry.
///
/// Built once at startup and shared with the signaling layer; nothing lives
/// in process globals.
pub struct SfuServer {
    pub(super) factory: EndpointFactory,
    pub(super) registry: SessionRegistry,
    pub(super) gather_timeout: Duration,
    pub(super) keyframe_interval: Duration,
}

impl SfuServer {
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let factory = EndpointFactory::new(&config.host_ip, config.webrtc_port).await?;

        Ok(Self {
            factory,
            registry: SessionRegistry::new(),
            gather_timeout: config.gather_timeout(),
            keyframe_interval: config.keyframe_interval(),
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Address of the shared ICE socket
    pub fn ice_addr(&self) -> SocketAddr {
        self.factory.local_addr()
    }

    /// Close every room's connections and release the ICE socket
    pub async fn shutdown(&self) {
        let rooms = self.registry.rooms().await;
        tracing::info!("Shutting down SFU with {} rooms", rooms.len());

        for room in rooms {
            room.close().await;
        }

        self.factory.close().await;
    }
}
