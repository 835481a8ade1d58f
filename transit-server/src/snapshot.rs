//! The published network snapshot.
//!
//! Queries clone an `Arc` to the current [`TransitGraph`] and keep using it
//! for as long as they run. A reload builds a complete new graph off the
//! async runtime and only then swaps it in, so no query ever sees a partial
//! build. At most one reload runs at a time.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::graph::{BuildOptions, DatasetLayout, GraphStats, LoadError, TransitGraph, load_dataset};

/// Error from loading or reloading the network.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("a reload is already in progress")]
    InProgress,

    #[error("network build task failed: {0}")]
    Join(String),
}

/// Where the network is read from and how it is built.
#[derive(Debug, Clone)]
pub struct NetworkSource {
    pub root: PathBuf,
    pub layout: DatasetLayout,
    pub options: BuildOptions,
}

impl NetworkSource {
    pub fn new(root: impl Into<PathBuf>, options: BuildOptions) -> Self {
        Self {
            root: root.into(),
            layout: DatasetLayout::default(),
            options,
        }
    }

    /// Build a graph synchronously.
    pub fn load(&self) -> Result<TransitGraph, LoadError> {
        load_dataset(&self.root, &self.layout, self.options)
    }

    /// Build a graph on the blocking thread pool.
    async fn load_blocking(&self) -> Result<TransitGraph, ReloadError> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| ReloadError::Join(e.to_string()))?
            .map_err(ReloadError::from)
    }
}

/// Shared handle to the current network snapshot.
#[derive(Clone)]
pub struct NetworkHandle {
    current: Arc<RwLock<Arc<TransitGraph>>>,
    reload_lock: Arc<Mutex<()>>,
    source: Arc<NetworkSource>,
}

impl NetworkHandle {
    /// Build the initial snapshot from `source`.
    pub async fn load(source: NetworkSource) -> Result<Self, ReloadError> {
        let graph = source.load_blocking().await?;
        log_stats("network loaded", &graph.stats());
        Ok(Self::from_graph(graph, source))
    }

    /// Publish an already built graph.
    pub fn from_graph(graph: TransitGraph, source: NetworkSource) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(graph))),
            reload_lock: Arc::new(Mutex::new(())),
            source: Arc::new(source),
        }
    }

    /// The current snapshot. Holding it does not block reloads.
    pub async fn snapshot(&self) -> Arc<TransitGraph> {
        let guard = self.current.read().await;
        Arc::clone(&guard)
    }

    pub fn source(&self) -> &NetworkSource {
        &self.source
    }

    /// Rebuild from disk and publish the result.
    ///
    /// On failure the previous snapshot stays published and the error is
    /// returned. A reload requested while another is running fails with
    /// [`ReloadError::InProgress`].
    pub async fn reload(&self) -> Result<GraphStats, ReloadError> {
        let _running = self
            .reload_lock
            .try_lock()
            .map_err(|_| ReloadError::InProgress)?;

        let graph = match self.source.load_blocking().await {
            Ok(graph) => graph,
            Err(e) => {
                warn!(error = %e, "reload failed, keeping the current network");
                return Err(e);
            }
        };
        let stats = graph.stats();

        let mut guard = self.current.write().await;
        *guard = Arc::new(graph);
        drop(guard);

        log_stats("network reloaded", &stats);
        Ok(stats)
    }
}

fn log_stats(message: &str, stats: &GraphStats) {
    info!(
        stops = stats.stops,
        routes = stats.routes,
        trips = stats.trips,
        walking_edges = stats.walking_edges,
        purged_routes = stats.purged_routes,
        "{message}"
    );
}
