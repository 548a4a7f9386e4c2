//! Service addressing.
//!
//! A [`Url`] names one service endpoint configuration: a protocol, a network
//! address, a service path, and a free-form parameter bag. The invocation
//! core only ever reads a handful of things off it: the protocol name,
//! named parameters with a default, a stable identity string used as a
//! singleton-cache key, and a human-readable address.

use std::collections::HashMap;
use std::fmt;

/// Parameter key for the service group.
pub const GROUP_KEY: &str = "group";

/// Address of one service endpoint configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub parameters: HashMap<String, String>,
}

impl Url {
    /// Create a URL with an empty parameter bag.
    pub fn new(
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            path: path.into(),
            parameters: HashMap::new(),
        }
    }

    /// Look up a parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Look up a parameter, falling back to `default` when absent or empty.
    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.parameters.get(key) {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }

    /// Insert or overwrite a parameter.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Stable identity string for this service endpoint configuration.
    ///
    /// Two URLs with the same protocol, address, path and group are the same
    /// service for caching purposes (notably the registry singleton cache).
    pub fn identity(&self) -> String {
        format!(
            "{}://{}:{}/{}?group={}",
            self.protocol,
            self.host,
            self.port,
            self.path,
            self.param_or(GROUP_KEY, "")
        )
    }

    /// Human-readable `host:port` address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

/// Error parsing an export descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseExportError {
    export: String,
}

impl fmt::Display for ParseExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid export descriptor: {:?}", self.export)
    }
}

impl std::error::Error for ParseExportError {}

/// Parse an export descriptor of the form `protocol:port`.
///
/// Used when deriving a provider or server configuration from a proxy
/// parameter instead of a full URL.
pub fn parse_export_info(export: &str) -> Result<(String, u16), ParseExportError> {
    let err = || ParseExportError {
        export: export.to_string(),
    };
    let (protocol, port) = export.split_once(':').ok_or_else(err)?;
    if protocol.is_empty() {
        return Err(err());
    }
    let port: u16 = port.parse().map_err(|_| err())?;
    Ok((protocol.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_includes_group() {
        let mut url = Url::new("zookeeper", "10.0.0.1", 2181, "com.example.Echo");
        assert_eq!(
            url.identity(),
            "zookeeper://10.0.0.1:2181/com.example.Echo?group="
        );

        url.set_param(GROUP_KEY, "gray");
        assert_eq!(
            url.identity(),
            "zookeeper://10.0.0.1:2181/com.example.Echo?group=gray"
        );
        assert_eq!(url.address(), "10.0.0.1:2181");
    }

    #[test]
    fn param_or_treats_empty_as_absent() {
        let mut url = Url::new("motan2", "127.0.0.1", 8002, "svc");
        assert_eq!(url.param_or("lb", "random"), "random");

        url.set_param("lb", "");
        assert_eq!(url.param_or("lb", "random"), "random");

        url.set_param("lb", "roundrobin");
        assert_eq!(url.param_or("lb", "random"), "roundrobin");
        assert_eq!(url.param("lb"), Some("roundrobin"));
    }

    #[test]
    fn export_info_parses_protocol_and_port() {
        assert_eq!(
            parse_export_info("motan2:8002"),
            Ok(("motan2".to_string(), 8002))
        );
        assert!(parse_export_info("motan2").is_err());
        assert!(parse_export_info(":8002").is_err());
        assert!(parse_export_info("motan2:eight").is_err());
    }
}
