//! Connection pools backing persistent adapters.
//!
//! A [`PgAdapter`](crate::PgAdapter) whose config sets `persistent` checks its
//! connection out of a process-wide pool keyed by
//! [`AdapterConfig::connection_key`] and the password. Adapters with the same
//! key share one pool; the pool lives until [`close_shared_pools`] is called.
//! Session settings are not part of the key: every checkout resets them.

use crate::adapter::AdapterConfig;
use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use tokio_postgres::NoTls;

type PoolKey = (String, Option<String>);

fn registry() -> &'static Mutex<HashMap<PoolKey, Pool>> {
    static POOLS: OnceLock<Mutex<HashMap<PoolKey, Pool>>> = OnceLock::new();
    POOLS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Create a standalone pool for `config`, sized by `config.pool_size`.
pub fn create_pool(config: &AdapterConfig) -> DbResult<Pool> {
    let max_size = config.pool_size;
    create_pool_with_manager_config(config, default_manager_config(), |builder| {
        builder.max_size(max_size)
    })
}

/// Create a pool with an injected `ManagerConfig` and `PoolBuilder` tuning.
pub fn create_pool_with_manager_config(
    config: &AdapterConfig,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> DbResult<Pool> {
    let mgr = Manager::from_config(config.to_pg_config(), NoTls, manager_config);
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| DbError::Pool(e.to_string()))
}

/// The shared pool for `config`'s connection key and password, created on
/// first use.
pub fn shared_pool(config: &AdapterConfig) -> DbResult<Pool> {
    let key = config.pool_key();
    let mut pools = registry().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = pools.get(&key) {
        return Ok(pool.clone());
    }
    let pool = create_pool(config)?;
    pools.insert(key, pool.clone());
    Ok(pool)
}

/// Close and forget every shared pool. Returns how many were closed.
///
/// Connections already checked out stay usable until dropped.
pub fn close_shared_pools() -> usize {
    let mut pools = registry().lock().unwrap_or_else(PoisonError::into_inner);
    let closed = pools.len();
    for (_, pool) in pools.drain() {
        pool.close();
    }
    closed
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
