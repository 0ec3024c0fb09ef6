//! # Submission Coordinator
//!
//! Single task that owns the catalog and the offline queue, decides for every
//! creation request whether to send it now or park it, and replays parked
//! requests when connectivity returns.
//!
//! ## Per-Request State Machine
//! ```text
//!   submit(NewProduct)
//!        │
//!        ▼
//!   validate ──── invalid ───► Err(Validation)   (no I/O)
//!        │
//!        ▼
//!   Received ── disconnected ──► OfflineQueued ──► Ok(Queued)
//!        │
//!        │ connected
//!        ▼
//!   Submitting (spawned task)
//!        │
//!        ├── {"success": true} ──► Confirmed ──► catalog.add ──► Ok(Confirmed)
//!        │
//!        └── anything else ─────► Failed ──► Ok(Failed)
//!                                   (or Queued when requeue_failed_online)
//! ```
//!
//! ## Replay
//! ```text
//!   disconnected ─► connected   (also: startup with pending, replay_now())
//!        │
//!        ▼
//!   read_all() ─► spawned task: create_product × N, at most max_in_flight
//!        │                          at a time
//!        ▼
//!   ReplayFinished posted back to the actor
//!        │
//!        ├── confirmed ids ─► queue.remove(ids) ─► catalog.add(...)
//!        └── failed ids    ─► stay queued
//! ```
//!
//! A transition seen while a replay is running schedules exactly one more
//! replay after it. Only confirmed entries leave the queue; one success never
//! clears the others.
//!
//! ## Concurrency
//! Network calls never run on the actor. They run in spawned tasks that post
//! a completion message back, and the actor applies the result. Catalog and
//! queue writes therefore happen one at a time, in message order.
//!
//! ## Shutdown
//! ```text
//!   Shutdown / last handle dropped
//!        │
//!        ▼
//!   stop taking commands ─► apply completions until no task is in flight
//!        │                  (no follow-up replay is started)
//!        ▼
//!   reply to Shutdown, exit
//! ```
//! An entry the server confirmed is always removed from the queue before the
//! task exits, so the next run does not send it again.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use catalog_core::validation::{validate_new_product, validate_search_query};
use catalog_core::{NewProduct, PendingSubmission, Product, ProductRecord, SubmissionOutcome};
use catalog_db::OfflineQueueRepository;

use crate::api::CatalogApi;
use crate::catalog::CatalogStore;
use crate::config::ReplaySettings;
use crate::connectivity::ConnectivitySource;
use crate::error::{SyncError, SyncResult};
use crate::events::{NoOpEmitter, ReplayReport, SyncEvent, SyncEventEmitter};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 64;

// =============================================================================
// Status
// =============================================================================

/// Snapshot of the coordinator for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorStatus {
    pub is_connected: bool,
    pub pending_count: usize,
    pub catalog_size: usize,
    pub replay_in_flight: bool,
    pub last_replay: Option<ReplayReport>,
}

// =============================================================================
// Messages
// =============================================================================

/// Requests from handles.
enum Command {
    Submit {
        input: NewProduct,
        image: Option<Vec<u8>>,
        reply: oneshot::Sender<SyncResult<SubmissionOutcome>>,
    },
    FetchAll {
        reply: oneshot::Sender<usize>,
    },
    Products {
        reply: oneshot::Sender<Vec<Product>>,
    },
    Search {
        query: String,
        reply: oneshot::Sender<Vec<Product>>,
    },
    Favorites {
        reply: oneshot::Sender<Vec<Product>>,
    },
    ToggleFavorite {
        id: String,
        reply: oneshot::Sender<Option<bool>>,
    },
    Pending {
        reply: oneshot::Sender<Vec<PendingSubmission>>,
    },
    Status {
        reply: oneshot::Sender<CoordinatorStatus>,
    },
    ReplayNow {
        reply: oneshot::Sender<ReplayReport>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Results of spawned network work.
enum Completion {
    Submitted {
        product: Product,
        image: Option<Vec<u8>>,
        result: SyncResult<()>,
        reply: oneshot::Sender<SyncResult<SubmissionOutcome>>,
    },
    Fetched {
        result: SyncResult<Vec<ProductRecord>>,
        reply: oneshot::Sender<usize>,
    },
    Replayed {
        results: Vec<(usize, PendingSubmission, SyncResult<()>)>,
    },
}

// =============================================================================
// Coordinator Handle
// =============================================================================

/// Cloneable handle to a running [`SubmissionCoordinator`].
///
/// Every call is a message to the coordinator task. Once it has stopped,
/// calls return `SyncError::ShuttingDown`.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> SyncResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        rx.await.map_err(|_| SyncError::ShuttingDown)
    }

    /// Creates a product: sent now when connected, queued otherwise.
    ///
    /// ## Returns
    /// - `Ok(Confirmed(product))` - server accepted it, it is in the catalog
    /// - `Ok(Queued)` - stored in the offline queue
    /// - `Ok(Failed)` - server rejected it or could not be reached
    /// - `Err(Validation)` - bad input, nothing happened
    pub async fn submit(
        &self,
        input: NewProduct,
        image: Option<Vec<u8>>,
    ) -> SyncResult<SubmissionOutcome> {
        self.request(|reply| Command::Submit {
            input,
            image,
            reply,
        })
        .await?
    }

    /// Replaces the catalog with the server's list. Returns the new size;
    /// zero (and an empty catalog) when the fetch failed.
    pub async fn fetch_all(&self) -> SyncResult<usize> {
        self.request(|reply| Command::FetchAll { reply }).await
    }

    pub async fn products(&self) -> SyncResult<Vec<Product>> {
        self.request(|reply| Command::Products { reply }).await
    }

    /// Case-insensitive search over name and type.
    pub async fn search(&self, query: &str) -> SyncResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        self.request(|reply| Command::Search { query, reply }).await
    }

    pub async fn favorites(&self) -> SyncResult<Vec<Product>> {
        self.request(|reply| Command::Favorites { reply }).await
    }

    /// Flips the favorite flag. `None` when no product has this id.
    pub async fn toggle_favorite(&self, id: &str) -> SyncResult<Option<bool>> {
        let id = id.to_string();
        self.request(|reply| Command::ToggleFavorite { id, reply })
            .await
    }

    /// Everything in the offline queue, oldest first.
    pub async fn pending(&self) -> SyncResult<Vec<PendingSubmission>> {
        self.request(|reply| Command::Pending { reply }).await
    }

    pub async fn status(&self) -> SyncResult<CoordinatorStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Replays the offline queue and waits for the pass to finish.
    ///
    /// If a replay is already running, waits for the one scheduled after it.
    pub async fn replay_now(&self) -> SyncResult<ReplayReport> {
        self.request(|reply| Command::ReplayNow { reply }).await
    }

    /// Stops the coordinator task.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for spawning a [`SubmissionCoordinator`].
///
/// ## Example
/// ```rust,ignore
/// let (handle, _task) = CoordinatorBuilder::new(config.replay.clone())
///     .with_queue(db.offline_queue())
///     .with_api(Arc::new(HttpCatalogApi::from_config(&config)?))
///     .with_connectivity(&probe)
///     .spawn()?;
/// ```
pub struct CoordinatorBuilder {
    settings: ReplaySettings,
    queue: Option<OfflineQueueRepository>,
    api: Option<Arc<dyn CatalogApi>>,
    connectivity: Option<watch::Receiver<bool>>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl CoordinatorBuilder {
    pub fn new(settings: ReplaySettings) -> Self {
        CoordinatorBuilder {
            settings,
            queue: None,
            api: None,
            connectivity: None,
            emitter: None,
        }
    }

    pub fn with_queue(mut self, queue: OfflineQueueRepository) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_api(mut self, api: Arc<dyn CatalogApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_connectivity(mut self, source: &dyn ConnectivitySource) -> Self {
        self.connectivity = Some(source.subscribe());
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Spawns the coordinator task on the current runtime.
    pub fn spawn(self) -> SyncResult<(CoordinatorHandle, JoinHandle<()>)> {
        let queue = self
            .queue
            .ok_or_else(|| SyncError::InvalidConfig("Offline queue required".into()))?;
        let api = self
            .api
            .ok_or_else(|| SyncError::InvalidConfig("Catalog API required".into()))?;
        let connectivity = self
            .connectivity
            .ok_or_else(|| SyncError::InvalidConfig("Connectivity source required".into()))?;
        let emitter = self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter));

        if self.settings.max_in_flight == 0 {
            return Err(SyncError::InvalidConfig(
                "max_in_flight must be greater than 0".into(),
            ));
        }

        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completions) = mpsc::unbounded_channel();

        let coordinator = SubmissionCoordinator {
            settings: self.settings,
            queue,
            api,
            emitter,
            catalog: CatalogStore::new(),
            connectivity,
            connected: false,
            watching: true,
            completion_tx,
            tasks_in_flight: 0,
            stopping: false,
            session_images: HashMap::new(),
            unremoved: HashSet::new(),
            replay_in_flight: false,
            replay_rerun: false,
            current_waiters: Vec::new(),
            next_waiters: Vec::new(),
            last_replay: None,
        };

        let task = tokio::spawn(coordinator.run(commands, completions));
        Ok((CoordinatorHandle { tx }, task))
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// The actor. Built and started through [`CoordinatorBuilder`].
pub struct SubmissionCoordinator {
    settings: ReplaySettings,
    queue: OfflineQueueRepository,
    api: Arc<dyn CatalogApi>,
    emitter: Arc<dyn SyncEventEmitter>,
    catalog: CatalogStore,

    connectivity: watch::Receiver<bool>,
    /// Last connectivity value this task acted on.
    connected: bool,
    /// False once the connectivity sender is gone.
    watching: bool,

    completion_tx: mpsc::UnboundedSender<Completion>,
    /// Spawned network tasks whose completion has not been applied yet.
    tasks_in_flight: usize,
    stopping: bool,

    /// Image bytes of entries queued during this process lifetime.
    /// Never persisted; lost on restart.
    session_images: HashMap<String, Vec<u8>>,
    /// Confirmed by the server but still in the queue because removing them
    /// failed. Never sent again; removal is retried before the next replay.
    unremoved: HashSet<String>,

    replay_in_flight: bool,
    replay_rerun: bool,
    /// Callers served by the replay in flight.
    current_waiters: Vec<oneshot::Sender<ReplayReport>>,
    /// Callers served by the next replay.
    next_waiters: Vec<oneshot::Sender<ReplayReport>>,
    last_replay: Option<ReplayReport>,
}

impl SubmissionCoordinator {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        self.connected = *self.connectivity.borrow_and_update();
        info!(connected = self.connected, "Submission coordinator started");

        if self.connected && self.pending_count().await > 0 {
            info!("Pending submissions found at startup, replaying");
            self.start_replay().await;
        }

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(Command::Shutdown { reply }) => {
                            self.drain(&mut completions).await;
                            let _ = reply.send(());
                            break;
                        }
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!("All coordinator handles dropped");
                            self.drain(&mut completions).await;
                            break;
                        }
                    }
                }

                Some(completion) = completions.recv() => {
                    self.handle_completion(completion).await;
                }

                changed = self.connectivity.changed(), if self.watching => {
                    match changed {
                        Ok(()) => {
                            let connected = *self.connectivity.borrow_and_update();
                            self.on_connectivity(connected).await;
                        }
                        Err(_) => {
                            warn!("Connectivity source dropped, keeping last known state");
                            self.watching = false;
                        }
                    }
                }
            }
        }

        info!("Submission coordinator stopped");
    }

    /// Applies the results of every spawned task still running.
    async fn drain(&mut self, completions: &mut mpsc::UnboundedReceiver<Completion>) {
        self.stopping = true;

        if self.tasks_in_flight > 0 {
            info!(tasks = self.tasks_in_flight, "Waiting for in-flight submissions");
        }

        while self.tasks_in_flight > 0 {
            match completions.recv().await {
                Some(completion) => self.handle_completion(completion).await,
                None => break,
            }
        }
    }

    /// Runs network work off the actor and posts its completion back.
    fn spawn_task<F>(&mut self, work: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        self.tasks_in_flight += 1;
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    // =========================================================================
    // Commands
    // =========================================================================

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit {
                input,
                image,
                reply,
            } => self.submit(input, image, reply).await,

            Command::FetchAll { reply } => {
                let api = self.api.clone();
                self.spawn_task(async move {
                    let result = api.list_products().await;
                    Completion::Fetched { result, reply }
                });
            }

            Command::Products { reply } => {
                let _ = reply.send(self.catalog.products().to_vec());
            }

            Command::Search { query, reply } => {
                let hits: Vec<Product> = self.catalog.search(&query).into_iter().cloned().collect();
                let _ = reply.send(hits);
            }

            Command::Favorites { reply } => {
                let favs: Vec<Product> = self.catalog.favorites().into_iter().cloned().collect();
                let _ = reply.send(favs);
            }

            Command::ToggleFavorite { id, reply } => {
                let _ = reply.send(self.catalog.toggle_favorite(&id));
            }

            Command::Pending { reply } => {
                let pending = self.queue.read_all().await.unwrap_or_else(|e| {
                    error!(?e, "Failed to read offline queue");
                    Vec::new()
                });
                let _ = reply.send(pending);
            }

            Command::Status { reply } => {
                let status = CoordinatorStatus {
                    is_connected: self.connected,
                    pending_count: self.pending_count().await,
                    catalog_size: self.catalog.len(),
                    replay_in_flight: self.replay_in_flight,
                    last_replay: self.last_replay.clone(),
                };
                let _ = reply.send(status);
            }

            Command::ReplayNow { reply } => {
                self.next_waiters.push(reply);
                self.start_replay().await;
            }

            // Handled in the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn submit(
        &mut self,
        input: NewProduct,
        image: Option<Vec<u8>>,
        reply: oneshot::Sender<SyncResult<SubmissionOutcome>>,
    ) {
        let input = match validate_new_product(input) {
            Ok(input) => input,
            Err(e) => {
                debug!(error = %e, "Rejected invalid product");
                let _ = reply.send(Err(e.into()));
                return;
            }
        };

        let product = Product::user_added(input);

        if !*self.connectivity.borrow() {
            let outcome = self.enqueue(&product, image).await;
            let _ = reply.send(Ok(outcome));
            return;
        }

        debug!(id = %product.id, name = %product.product_name, "Submitting product");

        let api = self.api.clone();
        self.spawn_task(async move {
            let result = api.create_product(&product.record(), image.clone()).await;
            Completion::Submitted {
                product,
                image,
                result,
                reply,
            }
        });
    }

    /// Parks a product in the offline queue.
    ///
    /// A storage failure is logged and still reported as queued; the caller
    /// cannot do anything more useful with it.
    async fn enqueue(&mut self, product: &Product, image: Option<Vec<u8>>) -> SubmissionOutcome {
        let pending = PendingSubmission::new(product, None);

        match self.queue.append(&pending).await {
            Ok(()) => {
                info!(id = %product.id, name = %product.product_name, "Product queued offline");
                if let Some(bytes) = image {
                    self.session_images.insert(product.id.clone(), bytes);
                }
            }
            Err(e) => {
                error!(?e, id = %product.id, "Failed to persist queued product, dropping it");
            }
        }

        self.emitter.emit(&SyncEvent::Queued {
            id: product.id.clone(),
            product_name: product.product_name.clone(),
        });

        SubmissionOutcome::Queued
    }

    // =========================================================================
    // Completions
    // =========================================================================

    async fn handle_completion(&mut self, completion: Completion) {
        self.tasks_in_flight = self.tasks_in_flight.saturating_sub(1);

        match completion {
            Completion::Submitted {
                product,
                image,
                result,
                reply,
            } => {
                let outcome = match result {
                    Ok(()) => {
                        info!(id = %product.id, name = %product.product_name, "Product confirmed");
                        self.add_to_catalog(product.clone(), false);
                        SubmissionOutcome::Confirmed(product)
                    }
                    Err(e) if self.settings.requeue_failed_online => {
                        warn!(error = %e, name = %product.product_name, "Submission failed, queueing");
                        self.enqueue(&product, image).await
                    }
                    Err(e) => {
                        warn!(error = %e, name = %product.product_name, "Submission failed");
                        self.emitter.emit(&SyncEvent::SubmissionFailed {
                            product_name: product.product_name.clone(),
                            reason: e.to_string(),
                        });
                        SubmissionOutcome::Failed
                    }
                };
                let _ = reply.send(Ok(outcome));
            }

            Completion::Fetched { result, reply } => {
                match result {
                    Ok(records) => self.catalog.replace_all(records),
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch products, showing empty catalog");
                        self.catalog.clear();
                    }
                }
                let _ = reply.send(self.catalog.len());
            }

            Completion::Replayed { results } => {
                self.finish_replay(results).await;
                if self.replay_rerun && !self.stopping {
                    self.replay_rerun = false;
                    debug!("Running follow-up replay");
                    self.start_replay().await;
                }
            }
        }
    }

    fn add_to_catalog(&mut self, product: Product, replayed: bool) {
        if self.catalog.add(product.clone()) {
            self.emitter
                .emit(&SyncEvent::ProductAdded { product, replayed });
        }
    }

    // =========================================================================
    // Connectivity & Replay
    // =========================================================================

    async fn on_connectivity(&mut self, connected: bool) {
        if connected == self.connected {
            return;
        }

        self.connected = connected;
        info!(connected, "Connectivity transition");
        self.emitter
            .emit(&SyncEvent::ConnectivityChanged { connected });

        if connected {
            self.start_replay().await;
        }
    }

    async fn start_replay(&mut self) {
        if self.replay_in_flight {
            debug!("Replay already running, scheduling another");
            self.replay_rerun = true;
            return;
        }

        self.current_waiters.append(&mut self.next_waiters);

        if !self.unremoved.is_empty() {
            let ids: Vec<String> = self.unremoved.iter().cloned().collect();
            match self.queue.remove(&ids).await {
                Ok(_) => self.unremoved.clear(),
                Err(e) => error!(?e, "Still unable to remove confirmed submissions"),
            }
        }

        let mut pending = self.queue.read_all().await.unwrap_or_else(|e| {
            error!(?e, "Failed to read offline queue for replay");
            Vec::new()
        });
        pending.retain(|entry| !self.unremoved.contains(&entry.id));

        if pending.is_empty() {
            debug!("Nothing to replay");
            self.complete_replay(ReplayReport::empty());
            return;
        }

        for entry in pending.iter_mut() {
            if entry.image_bytes.is_none() {
                entry.image_bytes = self.session_images.get(&entry.id).cloned();
            }
        }

        info!(count = pending.len(), "Replaying offline queue");
        self.replay_in_flight = true;

        let api = self.api.clone();
        let max_in_flight = self.settings.max_in_flight.max(1);

        self.spawn_task(async move {
            let results = stream::iter(pending.into_iter().enumerate())
                .map(|(index, entry)| {
                    let api = api.clone();
                    async move {
                        let image = entry.image_bytes.clone();
                        let result = api.create_product(&entry.record, image).await;
                        (index, entry, result)
                    }
                })
                .buffer_unordered(max_in_flight)
                .collect::<Vec<_>>()
                .await;

            Completion::Replayed { results }
        });
    }

    async fn finish_replay(&mut self, mut results: Vec<(usize, PendingSubmission, SyncResult<()>)>) {
        self.replay_in_flight = false;

        // Back to queue order
        results.sort_by_key(|(index, _, _)| *index);

        let attempted = results.len();
        let mut confirmed = Vec::new();
        let mut failed = 0;

        for (_, entry, result) in results {
            match result {
                Ok(()) => confirmed.push(entry),
                Err(e) => {
                    failed += 1;
                    warn!(id = %entry.id, error = %e, "Replay submission failed, keeping it queued");
                }
            }
        }

        let ids: Vec<String> = confirmed.iter().map(|p| p.id.clone()).collect();
        if let Err(e) = self.queue.remove(&ids).await {
            error!(?e, "Failed to remove confirmed submissions from the offline queue");
            self.unremoved.extend(ids.iter().cloned());
        }

        for entry in confirmed {
            self.session_images.remove(&entry.id);
            self.add_to_catalog(entry.into_product(), true);
        }

        let report = ReplayReport {
            attempted,
            confirmed: ids.len(),
            failed,
            remaining: self.pending_count().await,
            finished_at: Utc::now(),
        };

        info!(
            attempted = report.attempted,
            confirmed = report.confirmed,
            failed = report.failed,
            remaining = report.remaining,
            "Replay finished"
        );

        self.complete_replay(report);
    }

    fn complete_replay(&mut self, report: ReplayReport) {
        self.emitter.emit(&SyncEvent::ReplayCompleted(report.clone()));

        for waiter in self.current_waiters.drain(..) {
            let _ = waiter.send(report.clone());
        }

        self.last_replay = Some(report);
    }

    async fn pending_count(&self) -> usize {
        self.queue.count().await.unwrap_or_else(|e| {
            error!(?e, "Failed to count offline queue");
            0
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
