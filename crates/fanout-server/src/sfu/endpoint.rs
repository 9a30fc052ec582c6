//! Transport endpoint factory
//!
//! Builds peer connections that all share one WebRTC API instance: the
//! default codec set, the default interceptor chain, a single UDP socket
//! multiplexed across every ICE session, and a 1:1 NAT mapping so host
//! candidates advertise the server's public address. A loopback host IP
//! skips the mapping and gathers the loopback candidate directly.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::UdpSocket;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice::network_type::NetworkType;
use webrtc::ice::udp_mux::{UDPMux, UDPMuxDefault, UDPMuxParams};
use webrtc::ice::udp_network::UDPNetwork;
use webrtc::ice_transport::ice_candidate_type::RTCIceCandidateType;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;

use crate::error::{Result, SfuError};

pub struct EndpointFactory {
    /// WebRTC API (shared for all connections)
    api: API,
    udp_mux: Arc<UDPMuxDefault>,
    local_addr: SocketAddr,
}

impl EndpointFactory {
    /// Register codecs and interceptors and bind the shared ICE socket.
    ///
    /// Every error here is a [`SfuError::Configuration`]; callers are
    /// expected to abort startup rather than retry.
    pub async fn new(host_ip: &str, port: u16) -> Result<Self> {
        let host_ip = host_ip.trim();
        if host_ip.is_empty() {
            return Err(SfuError::Configuration("host ip is empty".to_string()));
        }
        let advertised = host_ip
            .parse::<IpAddr>()
            .map_err(|e| SfuError::Configuration(format!("invalid host ip {host_ip}: {e}")))?;
        if !advertised.is_ipv4() {
            return Err(SfuError::Configuration(format!("host ip {host_ip} is not IPv4")));
        }

        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(SfuError::configuration)?;

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(SfuError::configuration)?;

        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
            .await
            .map_err(|e| SfuError::Configuration(format!("bind ICE mux port {port}: {e}")))?;
        let local_addr = socket.local_addr().map_err(SfuError::configuration)?;
        let udp_mux = UDPMuxDefault::new(UDPMuxParams::new(socket));

        let mut setting_engine = SettingEngine::default();
        setting_engine.set_udp_network(UDPNetwork::Muxed(udp_mux.clone()));
        // The mux socket is IPv4 and the transport has no ICE-TCP support
        setting_engine.set_network_types(vec![NetworkType::Udp4]);
        if advertised.is_loopback() {
            // Local-only deployment: gather the real loopback candidate instead of
            // rewriting every host candidate to 127.0.0.1
            setting_engine.set_include_loopback_candidate(true);
        } else {
            setting_engine.set_nat_1to1_ips(vec![host_ip.to_string()], RTCIceCandidateType::Host);
        }

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .with_setting_engine(setting_engine)
            .build();

        tracing::info!("ICE mux listening on {} (advertised as {})", local_addr, host_ip);

        Ok(Self {
            api,
            udp_mux,
            local_addr,
        })
    }

    /// Create a new peer connection on the shared mux
    pub async fn new_peer(&self) -> Result<Arc<RTCPeerConnection>> {
        let peer_connection = self
            .api
            .new_peer_connection(RTCConfiguration::default())
            .await
            .map_err(SfuError::configuration)?;

        Ok(Arc::new(peer_connection))
    }

    /// Address of the shared ICE socket
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn close(&self) {
        if let Err(e) = self.udp_mux.close().await {
            tracing::warn!("Error closing ICE mux: {}", e);
        }
    }
}
