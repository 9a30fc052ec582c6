use crate::error::{Result, SfuError};
use crate::sfu::SfuServer;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Address the HTTP signaling listener binds to
    pub bind_address: String,
    /// Public address advertised for every host ICE candidate (1:1 NAT)
    pub host_ip: String,
    /// Port of the shared ICE UDP mux
    pub webrtc_port: u16,
    pub gather_timeout_secs: u64,
    pub keyframe_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            host_ip: "127.0.0.1".to_string(),
            webrtc_port: 8900,
            gather_timeout_secs: 10,
            keyframe_interval_secs: 5,
        }
    }
}

impl Config {
    /// Load from `FANOUT_*` environment variables, falling back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let config: Config = config::Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("host_ip", defaults.host_ip)?
            .set_default("webrtc_port", i64::from(defaults.webrtc_port))?
            .set_default("gather_timeout_secs", defaults.gather_timeout_secs as i64)?
            .set_default("keyframe_interval_secs", defaults.keyframe_interval_secs as i64)?
            .add_source(config::Environment::with_prefix("FANOUT").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.advertises_loopback() {
            tracing::warn!("Advertising loopback host IP {} (unreachable from other hosts!)", config.host_ip);
        }

        Ok(config)
    }

    /// Whether the advertised host IP only reaches this machine
    pub fn advertises_loopback(&self) -> bool {
        self.host_ip
            .trim()
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
    }

    /// Reject timing values the SFU cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.gather_timeout_secs == 0 {
            return Err(SfuError::Configuration(
                "gather_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.keyframe_interval_secs == 0 {
            return Err(SfuError::Configuration(
                "keyframe_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn gather_timeout(&self) -> Duration {
        Duration::from_secs(self.gather_timeout_secs)
    }

    pub fn keyframe_interval(&self) -> Duration {
        Duration::from_secs(self.keyframe_interval_secs)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sfu: Arc<SfuServer>,
}

impl AppState {
    pub fn new(config: Config, sfu: Arc<SfuServer>) -> Self {
        Self { config, sfu }
    }
}
