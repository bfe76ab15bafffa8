// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::*;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::SpinelDBError;
use crate::core::blocking::BlockerManager;
use crate::core::database::Db;
use crate::core::stream_blocking::StreamBlockerManager;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::{filter::EnvFilter, reload};

/// The central struct holding all shared, server-wide state. Wrapped in an
/// `Arc` and passed to every connection handler, providing a single source
/// of truth for the server's configuration and dynamic state.
#[derive(Debug)]
pub struct ServerState {
    /// The single shared, sharded keyspace. There is no `SELECT`.
    pub db: Arc<Db>,
    /// A map of all active client connections, keyed by a unique session ID.
    pub clients: ClientMap,
    /// The server's runtime configuration.
    pub config: Arc<Mutex<Config>>,
    /// Manages clients blocked on list commands (`BLPOP`).
    pub blocker_manager: Arc<BlockerManager>,
    /// Manages clients blocked on stream commands (`XREAD BLOCK`).
    pub stream_blocker_manager: Arc<StreamBlockerManager>,
    /// A handle to the logging filter, allowing for dynamic log level changes.
    pub log_reload_handle: Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>,
    /// Server-wide statistics (connection/command counters).
    pub stats: StatsState,
}

impl ServerState {
    /// Initializes the entire server state from the given configuration.
    pub fn initialize(
        config: Config,
        log_reload_handle: Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>,
    ) -> Result<Arc<ServerState>, SpinelDBError> {
        Ok(Arc::new(Self {
            db: Arc::new(Db::new()),
            clients: Arc::new(DashMap::new()),
            config: Arc::new(Mutex::new(config)),
            blocker_manager: Arc::new(BlockerManager::new()),
            stream_blocker_manager: Arc::new(StreamBlockerManager::new()),
            log_reload_handle,
            stats: StatsState::new(),
        }))
    }
}
