//! Document-level interaction events and listener registration
//!
//! The host forwards pointer, focus and touch events here; the preload
//! scheduler subscribes to them instead of reaching into global DOM state.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Interaction events that hint at an upcoming navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Pointer entered an element (`pointerover`)
    PointerOver,
    /// Element received focus (`focusin`)
    FocusIn,
    /// Touch started on an element (`touchstart`)
    TouchStart,
}

impl InteractionKind {
    /// All interaction kinds
    pub const ALL: [InteractionKind; 3] = [
        InteractionKind::PointerOver,
        InteractionKind::FocusIn,
        InteractionKind::TouchStart,
    ];

    /// DOM event name
    pub fn event_name(&self) -> &'static str {
        match self {
            InteractionKind::PointerOver => "pointerover",
            InteractionKind::FocusIn => "focusin",
            InteractionKind::TouchStart => "touchstart",
        }
    }
}

/// A node on the event's composed path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name
    pub tag: String,
    /// `href` attribute
    pub href: Option<String>,
    /// `target` attribute
    pub target: Option<String>,
}

impl Element {
    /// Create an element with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            href: None,
            target: None,
        }
    }

    /// Create an `<a href>` element
    pub fn link(href: impl Into<String>) -> Self {
        Self::new("a").with_href(href)
    }

    /// Set href
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Set target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Check if this element is a hyperlink (`<a>` or `<area>` with href)
    pub fn is_link(&self) -> bool {
        self.href.is_some()
            && (self.tag.eq_ignore_ascii_case("a") || self.tag.eq_ignore_ascii_case("area"))
    }

    /// Check if following the link stays in the current browsing context
    pub fn targets_self(&self) -> bool {
        match self.target.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(target) => target.eq_ignore_ascii_case("_self"),
        }
    }
}

/// An interaction event with its composed path (target first, root last)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    /// Event kind
    pub kind: InteractionKind,
    /// Composed path from the target up to the root
    pub path: Vec<Element>,
}

impl InteractionEvent {
    /// Create an event with an explicit composed path
    pub fn new(kind: InteractionKind, path: Vec<Element>) -> Self {
        Self { kind, path }
    }

    /// Create an event whose target has no ancestors of interest
    pub fn on(kind: InteractionKind, target: Element) -> Self {
        Self::new(kind, vec![target])
    }

    /// Nearest hyperlink at or above the target
    pub fn nearest_link(&self) -> Option<&Element> {
        self.path.iter().find(|e| e.is_link())
    }
}

/// Listener handle returned from [`Document::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Options recorded with a listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Listener never cancels the event's default action
    pub passive: bool,
    /// Listener runs in the capture phase
    pub capture: bool,
}

impl ListenerOptions {
    /// Passive bubbling-phase listener
    pub fn passive() -> Self {
        Self {
            passive: true,
            capture: false,
        }
    }
}

/// Event listener callback
pub type Listener = Arc<dyn Fn(&InteractionEvent) + Send + Sync>;

struct Registration {
    kind: InteractionKind,
    options: ListenerOptions,
    listener: Listener,
}

/// Document root: owns listener registrations and dispatches events
#[derive(Default)]
pub struct Document {
    listeners: DashMap<ListenerId, Registration>,
    next_id: AtomicU64,
}

impl Document {
    /// Create a document with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for one interaction kind
    pub fn add_listener<F>(&self, kind: InteractionKind, options: ListenerOptions, f: F) -> ListenerId
    where
        F: Fn(&InteractionEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(
            id,
            Registration {
                kind,
                options,
                listener: Arc::new(f),
            },
        );
        id
    }

    /// Remove a listener. Returns false if it was not installed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Dispatch an event to every listener of its kind, in installation
    /// order. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &InteractionEvent) -> usize {
        // Collected first: listeners may add or remove listeners.
        let mut matching: Vec<(ListenerId, Listener)> = self
            .listeners
            .iter()
            .filter(|r| r.kind == event.kind)
            .map(|r| (*r.key(), Arc::clone(&r.listener)))
            .collect();
        matching.sort_by_key(|(id, _)| *id);

        for (_, listener) in &matching {
            listener(event);
        }

        matching.len()
    }

    /// Options a listener was installed with
    pub fn listener_options(&self, id: ListenerId) -> Option<ListenerOptions> {
        self.listeners.get(&id).map(|r| r.options)
    }

    /// Total installed listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Installed listeners for one kind
    pub fn listener_count_for(&self, kind: InteractionKind) -> usize {
        self.listeners.iter().filter(|r| r.kind == kind).count()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
