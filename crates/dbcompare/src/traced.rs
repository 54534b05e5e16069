//! Traced SQL Server client wrapper.
//!
//! Wraps a `tiberius` client and logs all queries via tracing.

use tiberius::{Client, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;
use tracing::Instrument;

/// The transport `tiberius` runs on: a tokio TCP stream behind the
/// futures-io compat layer.
pub type Transport = Compat<TcpStream>;

/// A traced connection.
///
/// Every query executed through this wrapper runs inside a `db.query` span
/// carrying the SQL text, the number of bound parameters and the number of
/// rows returned.
///
/// # Example
///
/// ```ignore
/// use dbcompare::TracedClient;
///
/// let mut conn = TracedClient::new(client);
/// let rows = conn.query("SELECT name FROM sys.tables WHERE name = @P1", &["Order"]).await?;
/// ```
pub struct TracedClient {
    inner: Client<Transport>,
}

impl TracedClient {
    /// Create a new traced client wrapper.
    pub fn new(client: Client<Transport>) -> Self {
        Self { inner: client }
    }

    /// Execute a query with string parameters bound to `@P1`, `@P2`, ...,
    /// returning the rows of the first result set.
    pub async fn query(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> Result<Vec<Row>, tiberius::error::Error> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );

        let mut query = Query::new(sql);
        for param in params {
            query.bind(param.to_string());
        }

        let rows = async {
            let stream = query.query(&mut self.inner).await?;
            stream.into_first_result().await
        }
        .instrument(span.clone())
        .await?;

        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Close the connection, logging out of the server.
    pub async fn close(self) -> Result<(), tiberius::error::Error> {
        tracing::debug!("closing connection");
        self.inner.close().await
    }
}
