//! Process-wide directory of live regions.
//!
//! # Architecture
//!
//! Reads go straight to a shared map: a lookup for a live region returns
//! without suspending. Every write goes through a single worker task that
//! owns creation and eviction, so concurrent first lookups of the same id are
//! coalesced and exactly one region is ever built for it.
//!
//! ```text
//!   get(id) ──hit──▶ Arc<Region>
//!      │
//!     miss ──Create──▶ worker ──build, insert, start TTL──▶ reply
//!                         ▲
//!   TTL task ──Evict──────┘  (only if the map still holds that instance)
//! ```
//!
//! Building a region (terrain plus initial population) is CPU-bound, so the
//! worker hands it to the blocking pool and awaits the result before taking
//! the next request. Requests therefore stay serialized without stalling the
//! async executor.
//!
//! Each region gets a TTL task at creation. When the region goes a full TTL
//! without a keep-alive, the task asks the worker to evict it and then flips
//! the region's eviction signal.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use realm_types::RegionId;
use realm_world::{EntityFactory, PopulationConfig, TerrainProvider};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::RealmConfig;
use crate::error::StoreError;
use crate::region::Region;

type Directory = Arc<RwLock<HashMap<RegionId, Arc<Region>>>>;

enum StoreRequest {
    Create {
        id: RegionId,
        reply: oneshot::Sender<Result<Arc<Region>, StoreError>>,
    },
    Evict {
        region: Arc<Region>,
        done: oneshot::Sender<bool>,
    },
}

/// Handle to the region directory. Cheap to clone.
#[derive(Clone)]
pub struct RegionStore {
    directory: Directory,
    requests: mpsc::Sender<StoreRequest>,
}

impl RegionStore {
    /// Start the store worker and return a handle to it.
    ///
    /// Must be called from within a tokio runtime. The worker runs until
    /// every handle is dropped and every region has been evicted.
    pub fn spawn(
        config: &RealmConfig,
        terrain: Arc<dyn TerrainProvider>,
        entities: Arc<dyn EntityFactory>,
    ) -> Self {
        let directory = Directory::default();
        let (requests, inbox) = mpsc::channel(config.regions.request_queue_capacity.max(1));

        let worker = Worker {
            directory: Arc::clone(&directory),
            terrain,
            entities,
            population: Arc::new(config.population.clone()),
            ttl: config.regions.ttl(),
            requests: requests.downgrade(),
            inbox,
        };
        tokio::spawn(worker.run());

        Self {
            directory,
            requests,
        }
    }

    /// Get the live region for `id`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRegion`] if the id breaks the nesting
    /// rules, [`StoreError::Build`] if creation fails,
    /// [`StoreError::BuildAborted`] if the build task died, or
    /// [`StoreError::WorkerStopped`] if the worker is gone.
    pub async fn get(&self, id: &RegionId) -> Result<Arc<Region>, StoreError> {
        if let Some(region) = self.cached(id) {
            return Ok(region);
        }
        if !id.is_valid() {
            warn!(region = %id, "rejecting invalid region id");
            return Err(StoreError::InvalidRegion { id: id.clone() });
        }

        let (reply, response) = oneshot::channel();
        let request = StoreRequest::Create {
            id: id.clone(),
            reply,
        };
        if self.requests.send(request).await.is_err() {
            return Err(StoreError::WorkerStopped);
        }
        response.await.unwrap_or(Err(StoreError::WorkerStopped))
    }

    /// Parse a canonical id string and get its region.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the string does not parse, and
    /// otherwise the errors of [`get`](Self::get).
    pub async fn lookup(&self, id: &str) -> Result<Arc<Region>, StoreError> {
        let id: RegionId = id.parse()?;
        self.get(&id).await
    }

    /// The live region for `id`, without creating it.
    pub fn cached(&self, id: &RegionId) -> Option<Arc<Region>> {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(Arc::clone)
    }

    /// Whether a live region exists for `id`.
    pub fn contains(&self, id: &RegionId) -> bool {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Reset the idle timer of a live region. Returns `false` if there is
    /// none.
    pub fn keep_alive(&self, id: &RegionId) -> bool {
        self.cached(id).is_some_and(|region| {
            region.keep_alive();
            true
        })
    }

    /// Number of live regions.
    pub fn len(&self) -> usize {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no regions are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Worker {
    directory: Directory,
    terrain: Arc<dyn TerrainProvider>,
    entities: Arc<dyn EntityFactory>,
    population: Arc<PopulationConfig>,
    ttl: Duration,
    requests: mpsc::WeakSender<StoreRequest>,
    inbox: mpsc::Receiver<StoreRequest>,
}

impl Worker {
    async fn run(mut self) {
        while let Some(request) = self.inbox.recv().await {
            match request {
                StoreRequest::Create { id, reply } => {
                    let created = self.create(id).await;
                    let _ = reply.send(created);
                }
                StoreRequest::Evict { region, done } => {
                    let _ = done.send(self.evict(&region));
                }
            }
        }
        debug!("region store worker stopped");
    }

    async fn create(&self, id: RegionId) -> Result<Arc<Region>, StoreError> {
        // A queued request may have lost the race to an earlier one.
        let existing = self
            .directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(Arc::clone);
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let build = {
            let id = id.clone();
            let terrain = Arc::clone(&self.terrain);
            let entities = Arc::clone(&self.entities);
            let population = Arc::clone(&self.population);
            tokio::task::spawn_blocking(move || {
                Region::build(&id, terrain.as_ref(), entities.as_ref(), &population)
            })
        };
        let region = match build.await {
            Ok(Ok(region)) => Arc::new(region),
            Ok(Err(source)) => {
                warn!(region = %id, error = %source, "region creation failed");
                return Err(StoreError::Build { source });
            }
            Err(join_error) => {
                error!(region = %id, error = %join_error, "region build task failed");
                return Err(StoreError::BuildAborted { id });
            }
        };

        self.directory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::clone(&region));
        self.start_ttl(Arc::clone(&region));

        info!(
            region = %id,
            tileset = region.tileset(),
            occupants = region.occupant_count(),
            "region created"
        );
        Ok(region)
    }

    fn evict(&self, region: &Arc<Region>) -> bool {
        let mut directory = self.directory.write().unwrap_or_else(PoisonError::into_inner);
        match directory.get(region.id()) {
            Some(current) if Arc::ptr_eq(current, region) => {
                directory.remove(region.id());
                true
            }
            _ => false,
        }
    }

    fn start_ttl(&self, region: Arc<Region>) {
        let requests = self.requests.upgrade();
        let ttl = self.ttl;
        tokio::spawn(async move {
            region.idle(ttl).await;

            let mut removed = false;
            if let Some(requests) = requests {
                let (done, ack) = oneshot::channel();
                let request = StoreRequest::Evict {
                    region: Arc::clone(&region),
                    done,
                };
                if requests.send(request).await.is_ok() {
                    removed = ack.await.unwrap_or(false);
                }
            }

            region.mark_evicted();
            info!(
                region = %region.id(),
                occupants = region.occupant_count(),
                removed,
                "region evicted"
            );
        });
    }
}
