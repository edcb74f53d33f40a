//! Server configuration

use std::net::{IpAddr, SocketAddr};

use crate::error::{Error, Result};
use crate::feed::FeedConfig;
use crate::registry::RegistryConfig;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Session registry options
    pub registry: RegistryConfig,

    /// Upstream feed options
    pub feed: FeedConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            registry: RegistryConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the registry options
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Set the feed options
    pub fn feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }
}

/// Parse a bind address given as `IP:PORT`, `IP`, or `localhost[:PORT]`
pub fn parse_bind_addr(arg: &str) -> Result<SocketAddr> {
    let normalized = arg.trim().replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(Error::InvalidConfig(format!(
        "invalid bind address '{}', expected IP:PORT, IP or 'localhost'",
        arg
    )))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 5000);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.registry.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:5001".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 5001);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .registry(RegistryConfig::default().poll_interval(Duration::from_secs(2)))
            .feed(FeedConfig::default().request_timeout(Duration::from_secs(3)));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.registry.poll_interval, Duration::from_secs(2));
        assert_eq!(config.feed.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("127.0.0.1:5001").unwrap(),
            "127.0.0.1:5001".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(parse_bind_addr("localhost").unwrap().port(), DEFAULT_PORT);
        assert_eq!(parse_bind_addr("localhost:8080").unwrap().port(), 8080);
        assert!(matches!(
            parse_bind_addr("courtside"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
