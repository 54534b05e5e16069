//! [`Catalog`] over a live SQL Server connection.

use crate::introspect::{
    COLUMNS_SQL, CONSTRAINTS_SQL, TABLES_SQL, column_from_row, constraint_from_row,
    table_from_row,
};
use crate::{
    Catalog, ColumnDescriptor, ConnectParams, ConstraintInfo, Error, Result, TableName,
    TracedClient,
};
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

/// A connected catalog.
pub struct MssqlCatalog {
    conn: TracedClient,
    database: String,
}

impl MssqlCatalog {
    /// Open a connection with SQL Server authentication.
    pub async fn connect(params: &ConnectParams) -> Result<Self> {
        let endpoint = params.endpoint();

        let mut config = Config::new();
        config.host(&params.host);
        config.port(params.port);
        config.database(&params.database);
        config.application_name("dbcompare");
        config.authentication(AuthMethod::sql_server(&params.username, &params.password));
        if params.trust_cert {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|source| Error::Network {
                endpoint: endpoint.clone(),
                source,
            })?;
        tcp.set_nodelay(true).map_err(|source| Error::Network {
            endpoint: endpoint.clone(),
            source,
        })?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|source| Error::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;

        tracing::info!(%endpoint, "connected");

        Ok(Self {
            conn: TracedClient::new(client),
            database: params.database.clone(),
        })
    }

    /// Log out and drop the connection.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

impl Catalog for MssqlCatalog {
    fn database(&self) -> &str {
        &self.database
    }

    async fn tables(&mut self) -> Result<Vec<TableName>> {
        let rows = self.conn.query(TABLES_SQL, &[&self.database]).await?;
        rows.iter().map(table_from_row).collect()
    }

    async fn columns(&mut self, table: &TableName) -> Result<Vec<ColumnDescriptor>> {
        let rows = self
            .conn
            .query(COLUMNS_SQL, &[&self.database, table.as_str()])
            .await?;
        rows.iter().map(column_from_row).collect()
    }

    async fn constraints(&mut self, table: &TableName) -> Result<Vec<ConstraintInfo>> {
        let rows = self
            .conn
            .query(CONSTRAINTS_SQL, &[&self.database, table.as_str()])
            .await?;
        rows.iter().map(constraint_from_row).collect()
    }
}
