//! Connection parameters for one SQL Server catalog.

use crate::{Error, Result};
use std::fmt;

/// Default TDS port.
pub const DEFAULT_PORT: u16 = 1433;

/// Everything needed to open a connection to one catalog.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Accept the server certificate without validation.
    pub trust_cert: bool,
}

impl ConnectParams {
    /// Build parameters from a host specification (`host`, `host,port` or
    /// `host:port`) and SQL login credentials.
    pub fn new(
        host: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self> {
        let (host, port) = parse_host(host)?;
        Ok(Self {
            host,
            port,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            trust_cert: false,
        })
    }

    pub fn trust_cert(mut self, trust: bool) -> Self {
        self.trust_cert = trust;
        self
    }

    /// `user@host/database`, as shown to the user. Never includes the
    /// password.
    pub fn endpoint(&self) -> String {
        if self.port == DEFAULT_PORT {
            format!("{}@{}/{}", self.username, self.host, self.database)
        } else {
            format!(
                "{}@{},{}/{}",
                self.username, self.host, self.port, self.database
            )
        }
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

/// Split a host specification into host name and port.
///
/// A comma separates the port in the ADO.NET style (`db01,1444`); a colon
/// is accepted too, except for bracketed IPv6 literals.
pub fn parse_host(spec: &str) -> Result<(String, u16)> {
    let invalid = || Error::InvalidHost {
        host: spec.to_string(),
    };
    let spec_trimmed = spec.trim();
    if spec_trimmed.is_empty() {
        return Err(invalid());
    }

    let split = match spec_trimmed.rsplit_once(',') {
        Some(parts) => Some(parts),
        None if !spec_trimmed.starts_with('[') => spec_trimmed.rsplit_once(':'),
        None => spec_trimmed
            .rsplit_once("]:")
            .map(|(host, port)| (&spec_trimmed[..host.len() + 1], port)),
    };

    match split {
        Some((host, port)) => {
            let port: u16 = port.trim().parse().map_err(|_| invalid())?;
            let host = host.trim();
            if host.is_empty() || port == 0 {
                return Err(invalid());
            }
            Ok((host.to_string(), port))
        }
        None => Ok((spec_trimmed.to_string(), DEFAULT_PORT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host() {
        assert_eq!(parse_host("db01").unwrap(), ("db01".to_string(), 1433));
        assert_eq!(parse_host("db01,1444").unwrap(), ("db01".to_string(), 1444));
        assert_eq!(parse_host("db01:1444").unwrap(), ("db01".to_string(), 1444));
        assert_eq!(
            parse_host("[::1]:1500").unwrap(),
            ("[::1]".to_string(), 1500)
        );
        assert_eq!(parse_host("[::1]").unwrap(), ("[::1]".to_string(), 1433));
    }

    #[test]
    fn test_parse_host_rejects_garbage() {
        assert!(matches!(parse_host(""), Err(Error::InvalidHost { .. })));
        assert!(parse_host("db01,").is_err());
        assert!(parse_host("db01,notaport").is_err());
        assert!(parse_host(",1433").is_err());
        assert!(parse_host("db01:0").is_err());
    }

    #[test]
    fn test_endpoint_hides_password() {
        let params = ConnectParams::new("db01", "sa", "hunter2", "Shop").unwrap();
        assert_eq!(params.endpoint(), "sa@db01/Shop");
        assert!(!format!("{:?}", params).contains("hunter2"));

        let params = ConnectParams::new("db01,1444", "sa", "hunter2", "Shop").unwrap();
        assert_eq!(params.endpoint(), "sa@db01,1444/Shop");
    }
}
