//! Critical-Route Preloading
//!
//! This crate speculatively fetches the code of VULCA routes a visitor is
//! likely to open next:
//! - Idle-time preloading of critical routes, with a fallback timer
//! - Interaction-driven preloading (pointer over, focus, touch start)
//! - Same-origin / same-context link filtering
//! - Hash-router compatible path normalization
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 RoutePreloadScheduler                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  pointerover ─┐                                              │
//! │  focusin ─────┼─> nearest <a> ─> same origin? ─┐             │
//! │  touchstart ──┘                                │             │
//! │                                                ↓             │
//! │  idle / timeout ─> critical routes ──> trigger_preload(path) │
//! │                                                │             │
//! │                                     normalize_route          │
//! │                                                ↓             │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │              Preloaded Set                            │   │
//! │  │   mark before load ──> loader (detached task)         │   │
//! │  │   failure ──> evict (retry on next trigger)           │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod document;
mod error;
mod idle;
mod location;
mod preloaded;
mod registry;
mod route;
mod scheduler;

pub use config::PreloadConfig;
pub use document::{
    Document, Element, InteractionEvent, InteractionKind, Listener, ListenerId, ListenerOptions,
};
pub use error::{PreloadError, Result};
pub use idle::{IdleHandle, IdleSignal, IdleWake, ManualIdle, NeverIdle};
pub use location::Location;
pub use preloaded::{PreloadState, PreloadStats, PreloadedSet};
pub use registry::{loader_fn, FnLoader, RegistryBuilder, RouteLoader, RouteLoaderRegistry};
pub use route::{normalize_path, RouteKey, RouteRule, RouteTable};
pub use scheduler::{RoutePreloadScheduler, Teardown, TriggerOutcome};

/// Default fallback delay before critical routes preload without an idle period
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 2000;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        loader_fn, Document, IdleSignal, Location, PreloadConfig, Result, RouteKey,
        RouteLoaderRegistry, RoutePreloadScheduler, Teardown,
    };
}
