use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The TDS handshake or login failed.
    #[error("could not connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tiberius::error::Error,
    },

    /// The TCP connection could not be established.
    #[error("could not reach {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid host '{host}': expected host, host,port or host:port")]
    InvalidHost { host: String },

    #[error("catalog query failed: {0}")]
    Query(#[from] tiberius::error::Error),

    #[error("unexpected catalog row, column {column}: {message}")]
    Row { column: &'static str, message: String },

    #[error("failed to write {path}: {source}")]
    WriteScript {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("table {table} has a composite primary key ({}), which is not supported", columns.join(", "))]
    CompositePrimaryKey { table: String, columns: Vec<String> },
}

impl Error {
    /// Returns true for errors that only affect a single generated script.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::WriteScript { .. } | Error::CompositePrimaryKey { .. }
        )
    }
}
