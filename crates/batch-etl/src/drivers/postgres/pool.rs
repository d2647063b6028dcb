//! Connection pool construction.

use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::Config as PgConfig;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::drivers::common::TlsBuilder;
use crate::error::{EtlError, Result};

/// Connect timeout for new pool connections.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest a checkout waits for a free connection before failing.
pub const POOL_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a connection pool for `config`.
///
/// No connection is opened here; the first checkout connects.
pub fn build_pool(config: &DatabaseConfig, label: &str) -> Result<Pool> {
    let mut pg_config = PgConfig::new();
    pg_config.host(&config.host);
    pg_config.port(config.port);
    pg_config.dbname(&config.database);
    pg_config.user(&config.user);
    pg_config.password(&config.password);
    pg_config.application_name("batch-etl");
    pg_config.keepalives(true);
    pg_config.keepalives_idle(Duration::from_secs(30));
    pg_config.connect_timeout(CONNECT_TIMEOUT);

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };

    let context = format!("creating {} pool", label);
    let pool = match TlsBuilder::parse(&config.ssl_mode)?.build()? {
        None => {
            warn!(
                "{} connection to {} is not encrypted (ssl_mode=disable)",
                label, config.host
            );
            let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
            Pool::builder(mgr)
                .max_size(config.max_connections)
                .wait_timeout(Some(POOL_WAIT_TIMEOUT))
                .runtime(Runtime::Tokio1)
                .build()
                .map_err(|e| EtlError::pool(e, context))?
        }
        Some(tls) => {
            let mgr = Manager::from_config(pg_config, tls, mgr_config);
            Pool::builder(mgr)
                .max_size(config.max_connections)
                .wait_timeout(Some(POOL_WAIT_TIMEOUT))
                .runtime(Runtime::Tokio1)
                .build()
                .map_err(|e| EtlError::pool(e, context))?
        }
    };

    info!(
        "{} pool configured for {}:{}/{} (max {} connections)",
        label, config.host, config.port, config.database, config.max_connections
    );
    Ok(pool)
}

/// Check out a connection and run a trivial query.
pub async fn test_connection(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;
    client.simple_query("SELECT 1").await?;
    Ok(())
}
