//! The demo scope tree: an application window holding a workspace with an editor and a sidebar.
//!
//! ```text
//! app        Router, Toasts, CrashReporter
//! └─ workspace
//!    ├─ editor   Tabs
//!    └─ sidebar  Badge
//! ```

use arbor_event_bus::{
    Dispatch, ErrorHandler, EventBus, EventBusError, EventFailure, EventResult, EventState, Subscriber, event,
};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

#[event]
pub trait Navigation {
    /// Opens `route`; a scope resolves it if it owns that kind of route.
    fn open(&self, route: String) -> EventResult;
}

#[event]
pub trait Notification {
    fn notify(&self, message: String, urgent: bool) -> EventResult;
}

#[derive(Debug, thiserror::Error)]
#[error("route `{0}` escapes the workspace")]
pub struct EscapingRoute(String);

/// Application-wide fallback: resolves every absolute route, rejects traversal.
#[derive(Debug, Default, Subscriber)]
#[subscriber(events(Navigation))]
pub struct Router {
    opened: AtomicUsize,
}

impl Navigation for Router {
    fn open(&self, route: String) -> EventResult {
        if route.contains("..") {
            return Err(EscapingRoute(route).into());
        }
        if !route.starts_with('/') {
            return Ok(EventState::Passed);
        }
        self.opened.fetch_add(1, Ordering::Relaxed);
        info!(scope = "app", %route, "Router opened route");
        Ok(EventState::Resolved)
    }
}

/// Editor-local: claims `/file/...` routes before the router sees them.
#[derive(Debug, Default, Subscriber)]
#[subscriber(events(Navigation))]
pub struct Tabs {
    opened: AtomicUsize,
}

impl Navigation for Tabs {
    fn open(&self, route: String) -> EventResult {
        let Some(path) = route.strip_prefix("/file/") else {
            return Ok(EventState::Passed);
        };
        self.opened.fetch_add(1, Ordering::Relaxed);
        info!(scope = "editor", path, "Opened tab");
        Ok(EventState::Resolved)
    }
}

/// Sidebar-local: counts urgent notifications, lets the rest bubble up.
#[derive(Debug, Default, Subscriber)]
#[subscriber(events(Notification))]
pub struct Badge {
    urgent: AtomicUsize,
}

impl Notification for Badge {
    fn notify(&self, _message: String, urgent: bool) -> EventResult {
        if urgent {
            self.urgent.fetch_add(1, Ordering::Relaxed);
        }
        Ok(EventState::Passed)
    }
}

/// Application-wide notification sink.
#[derive(Debug, Default, Subscriber)]
#[subscriber(events(Notification))]
pub struct Toasts {
    shown: AtomicUsize,
}

impl Notification for Toasts {
    fn notify(&self, message: String, urgent: bool) -> EventResult {
        self.shown.fetch_add(1, Ordering::Relaxed);
        info!(scope = "app", %message, urgent, "Toast shown");
        Ok(EventState::Resolved)
    }
}

/// Last-resort error handler at the root.
#[derive(Debug, Default, Subscriber)]
#[subscriber(error_handler)]
pub struct CrashReporter {
    reports: AtomicUsize,
}

impl ErrorHandler for CrashReporter {
    fn on_error(&self, failure: &EventFailure) -> EventState {
        self.reports.fetch_add(1, Ordering::Relaxed);
        error!(error = %failure, "Subscriber failure reported");
        EventState::Resolved
    }
}

/// Counters read back by the CLI after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub routed: usize,
    pub tabs: usize,
    pub toasts: usize,
    pub urgent: usize,
    pub crashes: usize,
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "routed={} tabs={} toasts={} urgent={} crashes={}",
            self.routed, self.tabs, self.toasts, self.urgent, self.crashes
        )
    }
}

/// The wired tree plus handles to its subscribers.
#[derive(Debug)]
pub struct Scopes {
    app: EventBus,
    workspace: EventBus,
    editor: EventBus,
    sidebar: EventBus,
    router: Arc<Router>,
    tabs: Arc<Tabs>,
    badge: Arc<Badge>,
    toasts: Arc<Toasts>,
    crashes: Arc<CrashReporter>,
}

impl Scopes {
    pub const NAMES: [&'static str; 4] = ["app", "workspace", "editor", "sidebar"];

    /// Builds and wires the tree on top of `dispatcher`.
    ///
    /// # Errors
    /// Propagates [`EventBusError`] from subscribing.
    pub fn build(dispatcher: Arc<dyn Dispatch>) -> Result<Self, EventBusError> {
        let app = EventBus::new_root(dispatcher);
        let workspace = app.new_child();
        let scopes = Self {
            editor: workspace.new_child(),
            sidebar: workspace.new_child(),
            workspace,
            app,
            router: Arc::default(),
            tabs: Arc::default(),
            badge: Arc::default(),
            toasts: Arc::default(),
            crashes: Arc::default(),
        };

        scopes.app.subscribe(Arc::clone(&scopes.router))?;
        scopes.app.subscribe(Arc::clone(&scopes.toasts))?;
        scopes.app.subscribe(Arc::clone(&scopes.crashes))?;
        scopes.editor.subscribe(Arc::clone(&scopes.tabs))?;
        scopes.sidebar.subscribe(Arc::clone(&scopes.badge))?;

        Ok(scopes)
    }

    #[must_use]
    pub fn scope(&self, name: &str) -> Option<&EventBus> {
        match name {
            "app" => Some(&self.app),
            "workspace" => Some(&self.workspace),
            "editor" => Some(&self.editor),
            "sidebar" => Some(&self.sidebar),
            _ => None,
        }
    }

    /// The deepest scope, used as the default publishing point.
    #[must_use]
    pub const fn deepest(&self) -> &EventBus {
        &self.editor
    }

    /// One line per scope: indentation by depth, node id and local registrations.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        Self::NAMES
            .iter()
            .filter_map(|name| self.scope(name).map(|bus| (name, bus)))
            .map(|(name, bus)| {
                format!(
                    "{indent}{name} ({id}) navigation={nav} notification={note} error_handlers={handlers}",
                    indent = "  ".repeat(bus.depth()),
                    id = bus.id(),
                    nav = bus.subscriber_count::<dyn Navigation>(),
                    note = bus.subscriber_count::<dyn Notification>(),
                    handlers = bus.error_handler_count(),
                )
            })
            .collect()
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        Tally {
            routed: self.router.opened.load(Ordering::Relaxed),
            tabs: self.tabs.opened.load(Ordering::Relaxed),
            toasts: self.toasts.shown.load(Ordering::Relaxed),
            urgent: self.badge.urgent.load(Ordering::Relaxed),
            crashes: self.crashes.reports.load(Ordering::Relaxed),
        }
    }

    /// Shuts every scope down, leaves first.
    pub fn shutdown(&self) {
        for bus in [&self.editor, &self.sidebar, &self.workspace, &self.app] {
            bus.shutdown();
        }
    }
}
