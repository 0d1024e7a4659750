use super::config::AdapterConfig;
use super::escape::quote_literal;
use super::{Adapter, query_rows};
use crate::error::{DbError, DbResult};
use crate::fragment::PreparedStatement;
use crate::ident::quote_ident;
use crate::monitor::{CompositeHook, QueryHook};
use crate::row::Row;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::NoTls;

enum Connection {
    Direct(tokio_postgres::Client),
    #[cfg(feature = "pool")]
    Pooled(deadpool_postgres::Object),
}

/// PostgreSQL adapter over a single session.
///
/// ```ignore
/// let adapter = PgAdapter::connect(
///     AdapterConfig::new().dbname("app").user("app").timezone("UTC"),
/// )
/// .await?;
/// let rows = select("*").from("users").as_table(&adapter).await?;
/// ```
pub struct PgAdapter {
    connection: Connection,
    config: AdapterConfig,
    hooks: CompositeHook,
}

fn connection_error(config: &AdapterConfig, context: &str, err: impl fmt::Display) -> DbError {
    if config.debug {
        DbError::Connection(format!("{context} {}: {err}", config.target()))
    } else {
        DbError::Connection(format!("{context} {}", config.target()))
    }
}

async fn open_direct(config: &AdapterConfig) -> DbResult<Connection> {
    let (client, connection) = config
        .to_pg_config()
        .connect(NoTls)
        .await
        .map_err(|e| connection_error(config, "could not connect to", e))?;

    tokio::spawn(async move {
        if let Err(_err) = connection.await {
            #[cfg(feature = "tracing")]
            tracing::error!(target: "pgfrag", error = %_err, "connection closed with error");
        }
    });
    Ok(Connection::Direct(client))
}

#[cfg(feature = "pool")]
async fn open(config: &AdapterConfig) -> DbResult<Connection> {
    if !config.persistent {
        return open_direct(config).await;
    }
    let pool = crate::pool::shared_pool(config)?;
    let object = pool
        .get()
        .await
        .map_err(|e| connection_error(config, "could not check out a connection to", e))?;
    Ok(Connection::Pooled(object))
}

#[cfg(not(feature = "pool"))]
async fn open(config: &AdapterConfig) -> DbResult<Connection> {
    open_direct(config).await
}

/// Statements that prepare a session for `config`. A `reused` session comes
/// out of a shared pool and is reset first, so nothing set by its previous
/// holder survives.
fn session_setup(config: &AdapterConfig, reused: bool) -> DbResult<Vec<String>> {
    let mut statements = Vec::new();
    if reused {
        statements.push("RESET ALL".to_string());
    }
    statements.push(format!(
        "SET client_encoding TO {}",
        quote_literal(&config.charset)?
    ));
    if let Some(tz) = &config.timezone {
        statements.push(format!("SET TIME ZONE {}", quote_literal(tz)?));
    }
    if let Some(schema) = &config.schema {
        let path: Vec<String> = schema
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(quote_ident)
            .collect();
        if !path.is_empty() {
            statements.push(format!("SET search_path TO {}", path.join(", ")));
        }
    }
    Ok(statements)
}

impl PgAdapter {
    /// Open a session and apply the encoding, time zone and search path
    /// from `config`.
    pub async fn connect(config: AdapterConfig) -> DbResult<Self> {
        let connection = open(&config).await?;
        let adapter = Self {
            connection,
            config,
            hooks: CompositeHook::new(),
        };
        let setup = session_setup(&adapter.config, adapter.is_pooled())?;
        adapter
            .client()
            .batch_execute(&setup.join("; "))
            .await
            .map_err(|e| connection_error(&adapter.config, "session setup failed for", e))?;
        Ok(adapter)
    }

    /// Wrap an already connected client. No session setup is run.
    pub fn from_client(client: tokio_postgres::Client) -> Self {
        Self {
            connection: Connection::Direct(client),
            config: AdapterConfig::default(),
            hooks: CompositeHook::new(),
        }
    }

    /// Add a hook notified around every statement.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks = self.hooks.add(hook);
        self
    }

    /// Add a shared hook, e.g. a `StatsHook` you keep reading.
    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks = self.hooks.add_arc(hook);
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// The underlying driver client.
    pub fn client(&self) -> &tokio_postgres::Client {
        match &self.connection {
            Connection::Direct(client) => client,
            #[cfg(feature = "pool")]
            Connection::Pooled(object) => object,
        }
    }

    /// Whether the session was checked out of a shared pool.
    pub fn is_pooled(&self) -> bool {
        match self.connection {
            Connection::Direct(_) => false,
            #[cfg(feature = "pool")]
            Connection::Pooled(_) => true,
        }
    }
}

impl fmt::Debug for PgAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgAdapter")
            .field("config", &self.config)
            .field("pooled", &self.is_pooled())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Adapter for PgAdapter {
    async fn execute(
        &self,
        statement: &PreparedStatement,
        stop_after: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        query_rows(self.client(), statement, stop_after).await
    }

    fn hook(&self) -> Option<&dyn QueryHook> {
        if self.hooks.is_empty() {
            None
        } else {
            Some(&self.hooks)
        }
    }
}
