//! Lazy-loading, concurrency-safe cache of instantiated voice handles.
//!
//! Model loading is the most expensive operation in the system, so the
//! registry guarantees at most one concurrent load per model name: callers
//! that race the first request for a cold voice wait for the in-flight load
//! and share its outcome instead of triggering duplicate loads. A failed
//! load clears the entry rather than poisoning it, so transient failures do
//! not become permanently fatal for that model.

use crate::error::{VoxError, VoxResult};
use crate::voice::VoiceHandle;
use crate::voice_name;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of a load, broadcast to every waiter of that load
type LoadOutcome = Option<Result<Arc<VoiceHandle>, VoxError>>;

enum EntryState {
    /// A load is in flight; waiters park on the receiver
    Loading(watch::Receiver<LoadOutcome>),
    /// The handle is cached until explicitly evicted
    Loaded(Arc<VoiceHandle>),
}

struct Entry {
    // Distinguishes this entry from a successor created after an eviction,
    // so an eviction that waited out an in-flight load removes exactly the
    // entry it waited on.
    generation: u64,
    state: EntryState,
}

struct Inner {
    entries: HashMap<String, Entry>,
    next_generation: u64,
}

/// The lazy-load cache of voice handles, keyed by canonical model name
pub struct VoiceRegistry {
    voices_dir: PathBuf,
    inner: Mutex<Inner>,
}

enum Ticket {
    /// This caller performs the load and broadcasts the outcome
    Load(watch::Sender<LoadOutcome>, u64),
    /// Another caller's load is in flight; wait for its outcome
    Wait(watch::Receiver<LoadOutcome>),
}

impl VoiceRegistry {
    /// Create a registry over `voices_dir` with an empty cache
    #[must_use]
    pub fn new<P: Into<PathBuf>>(voices_dir: P) -> Self {
        Self {
            voices_dir: voices_dir.into(),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Get the cached handle for `model`, loading it on demand.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no artifact exists for `model` on disk,
    /// and a load error if the artifact fails to instantiate. Load failures
    /// are not cached: a later call retries from scratch.
    pub async fn get_or_load(&self, model: &str) -> VoxResult<Arc<VoiceHandle>> {
        loop {
            if !voice_name::model_exists(&self.voices_dir, model) {
                return Err(VoxError::not_found(model));
            }

            let ticket = {
                let mut inner = self.inner.lock();
                match inner.entries.get(model) {
                    Some(Entry {
                        state: EntryState::Loaded(handle),
                        ..
                    }) => return Ok(handle.clone()),
                    Some(Entry {
                        state: EntryState::Loading(rx),
                        ..
                    }) => Ticket::Wait(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        let generation = inner.next_generation;
                        inner.next_generation += 1;
                        inner.entries.insert(
                            model.to_string(),
                            Entry {
                                generation,
                                state: EntryState::Loading(rx),
                            },
                        );
                        Ticket::Load(tx, generation)
                    }
                }
            };

            match ticket {
                Ticket::Load(tx, generation) => {
                    return self.run_load(model, tx, generation).await;
                }
                Ticket::Wait(rx) => {
                    if let Some(outcome) = wait_for_outcome(rx).await {
                        return outcome;
                    }
                    // The loading caller went away without broadcasting
                    // (e.g. its request was cancelled); retry from scratch.
                    tracing::debug!(model, "in-flight load abandoned, retrying");
                }
            }
        }
    }

    // The expensive work happens here, outside the table lock, so callers
    // for different models proceed unblocked.
    async fn run_load(
        &self,
        model: &str,
        tx: watch::Sender<LoadOutcome>,
        generation: u64,
    ) -> VoxResult<Arc<VoiceHandle>> {
        let result = VoiceHandle::load(&self.voices_dir, model).await.map(Arc::new);

        {
            let mut inner = self.inner.lock();
            match &result {
                Ok(handle) => {
                    if let Some(entry) = inner.entries.get_mut(model) {
                        if entry.generation == generation {
                            entry.state = EntryState::Loaded(handle.clone());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(model, error = %e, "voice load failed, clearing entry");
                    if inner
                        .entries
                        .get(model)
                        .is_some_and(|entry| entry.generation == generation)
                    {
                        inner.entries.remove(model);
                    }
                }
            }
        }

        // Waiters (and racing evictions) observe the same outcome
        let _ = tx.send(Some(result.clone()));
        result
    }

    /// Non-blocking check whether `model` is currently loaded.
    ///
    /// Reporting only; never triggers a load. A model whose load is in
    /// flight is not yet loaded.
    #[must_use]
    pub fn is_loaded(&self, model: &str) -> bool {
        matches!(
            self.inner.lock().entries.get(model),
            Some(Entry {
                state: EntryState::Loaded(_),
                ..
            })
        )
    }

    /// Number of loads the registry has started since construction.
    ///
    /// Callers piggybacking on another caller's in-flight load do not
    /// count, so this stays at 1 no matter how many requests race the first
    /// load of a model.
    #[must_use]
    pub fn loads_started(&self) -> u64 {
        self.inner.lock().next_generation
    }

    /// Number of currently loaded models
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|e| matches!(e.state, EntryState::Loaded(_)))
            .count()
    }

    /// Remove the cached handle for `model`, releasing its resources.
    ///
    /// Idempotent: evicting an absent or never-loaded model is a no-op. An
    /// eviction that races an in-flight load waits for the load to finish
    /// and then removes that load's entry, never interrupting it.
    pub async fn evict(&self, model: &str) {
        let waiter = {
            let mut inner = self.inner.lock();
            match inner.entries.get(model) {
                None => return,
                Some(Entry {
                    state: EntryState::Loaded(_),
                    ..
                }) => {
                    inner.entries.remove(model);
                    tracing::info!(model, "voice evicted");
                    return;
                }
                Some(Entry {
                    generation,
                    state: EntryState::Loading(rx),
                }) => (*generation, rx.clone()),
            }
        };

        // Let the in-flight load finish, then evict exactly that entry. A
        // failed load has already cleared itself; a newer generation belongs
        // to a load that started after this eviction completed its wait.
        let (generation, rx) = waiter;
        let _ = wait_for_outcome(rx).await;

        let mut inner = self.inner.lock();
        if inner
            .entries
            .get(model)
            .is_some_and(|entry| entry.generation == generation)
        {
            inner.entries.remove(model);
            tracing::info!(model, "voice evicted after in-flight load completed");
        }
    }

    /// Best-effort load of a set of models at startup.
    ///
    /// Individual failures are logged per model and do not abort the
    /// remaining preloads. Returns the number of models loaded.
    pub async fn preload<I, S>(&self, models: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut loaded = 0;
        for model in models {
            let model = model.as_ref();
            match self.get_or_load(model).await {
                Ok(_) => loaded += 1,
                Err(e) => {
                    tracing::warn!(model, category = e.category(), error = %e, "preload failed");
                }
            }
        }
        loaded
    }
}

impl std::fmt::Debug for VoiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRegistry")
            .field("voices_dir", &self.voices_dir)
            .field("loaded", &self.loaded_count())
            .finish()
    }
}

/// Wait until the loading caller broadcasts an outcome. Returns `None` if
/// the sender was dropped without one.
async fn wait_for_outcome(mut rx: watch::Receiver<LoadOutcome>) -> Option<VoxResult<Arc<VoiceHandle>>> {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return Some(outcome);
        }
        if rx.changed().await.is_err() {
            return None;
        }
    }
}
