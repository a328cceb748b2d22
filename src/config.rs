use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::analysis::AnalysisConfig;
use crate::services::hub::DEFAULT_QUEUE_CAPACITY;
use crate::services::session::{KeepaliveConfig, DEFAULT_MAX_IDLE_HEARTBEATS};
use crate::services::store::DEFAULT_MAX_HISTORY;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub max_history: usize,
    pub heartbeat_secs: u64,
    pub max_idle_heartbeats: u32,
    pub queue_capacity: usize,
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_parse("PORT").unwrap_or(8000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            max_history: env_parse("MAX_HISTORY")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(DEFAULT_MAX_HISTORY),
            heartbeat_secs: env_parse("WS_HEARTBEAT_SECS")
                .filter(|v: &u64| *v > 0)
                .unwrap_or(30),
            max_idle_heartbeats: env_parse("WS_MAX_IDLE_HEARTBEATS")
                .unwrap_or(DEFAULT_MAX_IDLE_HEARTBEATS),
            queue_capacity: env_parse("WS_QUEUE_CAPACITY")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            analysis: AnalysisConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn keepalive(&self) -> KeepaliveConfig {
        KeepaliveConfig {
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
            max_idle_heartbeats: self.max_idle_heartbeats,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8000,
            log_level: "info".to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            heartbeat_secs: 30,
            max_idle_heartbeats: DEFAULT_MAX_IDLE_HEARTBEATS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            analysis: AnalysisConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}
