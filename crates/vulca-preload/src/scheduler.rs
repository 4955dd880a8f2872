//! Route preload scheduler coordinating triggers and loads

use crate::idle::schedule_idle;
use crate::{
    Document, IdleHandle, IdleSignal, InteractionEvent, ListenerId, ListenerOptions, Location,
    PreloadConfig, PreloadError, PreloadStats, PreloadedSet, Result, RouteKey,
    RouteLoaderRegistry,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A load was started for the route
    Started(RouteKey),
    /// The route is already preloaded or loading
    AlreadyPreloaded(RouteKey),
    /// The path does not belong to any registered route
    Unresolved,
}

impl TriggerOutcome {
    /// Check if a load was started
    pub fn is_started(&self) -> bool {
        matches!(self, TriggerOutcome::Started(_))
    }
}

struct Inner {
    registry: Arc<RouteLoaderRegistry>,
    location: Location,
    config: PreloadConfig,
    preloaded: PreloadedSet,
    runtime: Handle,
    /// Load tasks not yet joined
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Inner {
    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }
}

/// Opportunistically fetches route modules the user is likely to visit.
///
/// Every trigger (hover, focus, touch, idle) funnels into
/// [`trigger_preload`](Self::trigger_preload), which marks the route before
/// the load starts so each route has at most one load in flight. A failed
/// load evicts the mark and is otherwise ignored: the route still loads on
/// demand at navigation time.
#[derive(Clone)]
pub struct RoutePreloadScheduler {
    inner: Arc<Inner>,
}

impl RoutePreloadScheduler {
    /// Create a scheduler on the current Tokio runtime
    pub fn new(
        registry: Arc<RouteLoaderRegistry>,
        location: Location,
        config: PreloadConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| PreloadError::Config(format!("no Tokio runtime available: {e}")))?;
        Self::with_runtime(registry, location, config, runtime)
    }

    /// Create a scheduler spawning loads on the given runtime
    pub fn with_runtime(
        registry: Arc<RouteLoaderRegistry>,
        location: Location,
        config: PreloadConfig,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate(&registry)?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                location,
                config,
                preloaded: PreloadedSet::new(),
                runtime,
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Resolve a raw path to its route key
    pub fn normalize_route(&self, path: &str) -> Option<RouteKey> {
        self.inner.registry.normalize_route(path)
    }

    /// Preload the route owning `path`. Returns without waiting for the load.
    pub fn trigger_preload(&self, path: &str) -> TriggerOutcome {
        match self.normalize_route(path) {
            Some(key) => self.trigger_route(key),
            None => {
                self.inner.preloaded.record_unresolved();
                trace!(path, "No route for path");
                TriggerOutcome::Unresolved
            }
        }
    }

    /// Preload a route by key
    pub fn trigger_route(&self, key: RouteKey) -> TriggerOutcome {
        let Some(loader) = self.inner.registry.loader(&key) else {
            self.inner.preloaded.record_unresolved();
            return TriggerOutcome::Unresolved;
        };

        if !self.inner.preloaded.try_mark(&key) {
            trace!(route = %key, "Route already preloaded");
            return TriggerOutcome::AlreadyPreloaded(key);
        }

        debug!(route = %key, "Preloading route");

        let inner = Arc::clone(&self.inner);
        let route = key.clone();
        let task = self.inner.runtime.spawn(async move {
            let outcome = AssertUnwindSafe(loader.load()).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => inner.preloaded.mark_loaded(&route),
                Ok(Err(e)) => {
                    inner.preloaded.evict(&route);
                    debug!(route = %route, error = %e, "Route preload failed");
                }
                Err(_) => {
                    inner.preloaded.evict(&route);
                    debug!(route = %route, "Route loader panicked");
                }
            }
        });
        self.inner.track(task);

        TriggerOutcome::Started(key)
    }

    /// Preload every critical route. Returns the number of loads started.
    pub fn trigger_all_critical_preloads(&self) -> usize {
        let keys: Vec<RouteKey> = if self.inner.config.critical_routes.is_empty() {
            self.inner.registry.keys().cloned().collect()
        } else {
            self.inner.config.critical_routes.clone()
        };

        keys.into_iter()
            .map(|key| self.trigger_route(key))
            .filter(TriggerOutcome::is_started)
            .count()
    }

    /// Run the critical preloads at the next idle period, or after the
    /// configured fallback delay if the host never reports one.
    pub fn schedule_idle_preload(&self, idle: Arc<dyn IdleSignal>) -> IdleHandle {
        let scheduler = self.clone();
        schedule_idle(
            &self.inner.runtime,
            idle,
            self.inner.config.idle_timeout(),
            move |wake| {
                let started = scheduler.trigger_all_critical_preloads();
                debug!(?wake, started, "Preloading critical routes");
            },
        )
    }

    /// Handle an interaction event: preload the nearest eligible link.
    pub fn on_interaction(&self, event: &InteractionEvent) -> Option<TriggerOutcome> {
        let link = event.nearest_link()?;
        let path = self.inner.location.preload_path(link)?;
        Some(self.trigger_preload(&path))
    }

    /// Install passive interaction listeners on `document` and schedule the
    /// idle preload. The returned [`Teardown`] reverses both.
    pub fn setup(&self, document: &Arc<Document>, idle: Arc<dyn IdleSignal>) -> Teardown {
        let listeners = self
            .inner
            .config
            .enabled_interactions()
            .into_iter()
            .map(|kind| {
                let scheduler = self.clone();
                document.add_listener(kind, ListenerOptions::passive(), move |event| {
                    scheduler.on_interaction(event);
                })
            })
            .collect::<Vec<_>>();

        let idle = self
            .inner
            .config
            .preload_on_idle
            .then(|| self.schedule_idle_preload(idle));

        debug!(listeners = listeners.len(), "Route preloading set up");

        Teardown {
            document: Arc::clone(document),
            listeners,
            idle,
        }
    }

    /// Check if a route is preloaded or loading
    pub fn is_preloaded(&self, key: &RouteKey) -> bool {
        self.inner.preloaded.contains(key)
    }

    /// Preloaded routes, sorted
    pub fn preloaded(&self) -> Vec<RouteKey> {
        self.inner.preloaded.snapshot()
    }

    /// Get preload statistics
    pub fn stats(&self) -> PreloadStats {
        self.inner.preloaded.stats()
    }

    /// Page location used for link eligibility
    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    /// Wait for every load started so far to finish
    pub async fn wait_for_inflight(&self) {
        let tasks = {
            let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *tasks)
        };
        futures::future::join_all(tasks).await;
    }
}

impl std::fmt::Debug for RoutePreloadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutePreloadScheduler")
            .field("location", &self.inner.location.url().as_str())
            .field("routes", &self.inner.registry.len())
            .field("preloaded", &self.inner.preloaded.len())
            .finish()
    }
}

/// Reverses [`RoutePreloadScheduler::setup`]
#[must_use = "dropping a Teardown leaves listeners installed"]
#[derive(Debug)]
pub struct Teardown {
    document: Arc<Document>,
    listeners: Vec<ListenerId>,
    idle: Option<IdleHandle>,
}

impl Teardown {
    /// Cancel the idle preload and remove every installed listener
    pub fn teardown(self) {
        if let Some(mut idle) = self.idle {
            idle.cancel();
        }

        for id in &self.listeners {
            self.document.remove_listener(*id);
        }

        debug!(listeners = self.listeners.len(), "Route preloading torn down");
    }

    /// Listeners installed by setup
    pub fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }
}
