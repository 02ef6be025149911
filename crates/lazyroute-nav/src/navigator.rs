use std::sync::{Arc, Mutex, MutexGuard};

use lazyroute_loader::ChunkRegistry;
use lazyroute_router::{RouteDescriptor, RouteParams, RouteTable};
use lazyroute_types::{ChunkId, ComponentRef, ModuleHandle};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::NavigatorConfig;
use crate::error::{NavResult, NavigationError};
use crate::event::{NavigationEvent, NavigationEventKind};
use crate::render::Renderer;

// ---------------------------------------------------------------------------
// Requests, states, outcomes
// ---------------------------------------------------------------------------

/// A navigation as issued: the requested path and its sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
    pub path: String,
    pub seq: u64,
}

/// The navigator's state machine:
/// `Idle -> Resolving -> (Rendering | Failed)`, restarting at `Resolving` on
/// the next navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigatorState {
    Idle,
    Resolving {
        seq: u64,
        path: String,
    },
    Rendering {
        seq: u64,
        path: String,
        component: ComponentRef,
    },
    Failed {
        seq: u64,
        path: String,
        error: NavigationError,
    },
}

impl NavigatorState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving { .. } => "resolving",
            Self::Rendering { .. } => "rendering",
            Self::Failed { .. } => "failed",
        }
    }

    /// Sequence number of the navigation that produced this state.
    pub fn seq(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Resolving { seq, .. }
            | Self::Rendering { seq, .. }
            | Self::Failed { seq, .. } => Some(*seq),
        }
    }
}

/// Result of a navigation that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The component was handed to the renderer.
    Rendered {
        seq: u64,
        component: ComponentRef,
        params: RouteParams,
    },
    /// A newer navigation (`by`) was issued before this one completed; its
    /// result was discarded without reaching the renderer.
    Superseded { seq: u64, by: u64 },
}

impl NavigationOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    pub fn component(&self) -> Option<&ComponentRef> {
        match self {
            Self::Rendered { component, .. } => Some(component),
            Self::Superseded { .. } => None,
        }
    }
}

/// Latest-issued sequence number and the state it produced. Locked together
/// so that checking for staleness and rendering happen atomically with
/// respect to new navigations.
struct Timeline {
    latest: u64,
    state: NavigatorState,
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Resolves paths against a [`RouteTable`] and drives a [`Renderer`].
pub struct Navigator {
    table: Arc<RouteTable>,
    registry: ChunkRegistry,
    renderer: Arc<dyn Renderer>,
    config: NavigatorConfig,
    timeline: Mutex<Timeline>,
    events: broadcast::Sender<NavigationEvent>,
}

impl Navigator {
    pub fn new(
        table: Arc<RouteTable>,
        registry: ChunkRegistry,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self::with_config(table, registry, renderer, NavigatorConfig::default())
    }

    pub fn with_config(
        table: Arc<RouteTable>,
        registry: ChunkRegistry,
        renderer: Arc<dyn Renderer>,
        config: NavigatorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            table,
            registry,
            renderer,
            config,
            timeline: Mutex::new(Timeline {
                latest: 0,
                state: NavigatorState::Idle,
            }),
            events,
        }
    }

    /// Navigate to `path`.
    ///
    /// Suspends only while a deferred route's chunk is loading. On completion
    /// the result is applied only if no newer navigation has been issued in
    /// the meantime; otherwise it is discarded and
    /// [`NavigationOutcome::Superseded`] is returned, even for failures.
    pub async fn navigate(&self, path: &str) -> NavResult<NavigationOutcome> {
        let request = self.begin(path);
        let resolved = self.resolve(&request).await;
        self.finish(request, resolved)
    }

    /// Start loading the chunk behind `path` without navigating.
    ///
    /// Returns `true` if a load was started. Immediate routes and chunks that
    /// are already loading or settled return `false`.
    pub fn preload(&self, path: &str) -> NavResult<bool> {
        let matched = self
            .table
            .match_path(path)
            .ok_or_else(|| NavigationError::RouteNotFound {
                path: path.to_string(),
            })?;
        Ok(matched
            .descriptor
            .chunk_id()
            .map(|chunk| self.registry.prefetch(chunk))
            .unwrap_or(false))
    }

    /// Start loading every deferred chunk in the table. Returns how many
    /// loads were started.
    pub fn preload_all(&self) -> usize {
        let started = self
            .table
            .chunk_ids()
            .iter()
            .filter(|chunk| self.registry.prefetch(chunk))
            .count();
        debug!(started, "preloading all deferred chunks");
        started
    }

    /// Subscribe to navigation events.
    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    /// The current state.
    pub fn state(&self) -> NavigatorState {
        self.lock().state.clone()
    }

    /// Sequence number of the most recently issued navigation (0 if none).
    pub fn latest_seq(&self) -> u64 {
        self.lock().latest
    }

    /// State and latest sequence number, read together.
    pub fn current(&self) -> (NavigatorState, u64) {
        let timeline = self.lock();
        (timeline.state.clone(), timeline.latest)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn registry(&self) -> &ChunkRegistry {
        &self.registry
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    fn begin(&self, path: &str) -> NavigationRequest {
        let mut timeline = self.lock();
        timeline.latest += 1;
        let request = NavigationRequest {
            path: path.to_string(),
            seq: timeline.latest,
        };
        timeline.state = NavigatorState::Resolving {
            seq: request.seq,
            path: request.path.clone(),
        };
        debug!(seq = request.seq, path = %request.path, "navigation started");
        self.publish(&request, NavigationEventKind::Started);
        request
    }

    async fn resolve(&self, request: &NavigationRequest) -> NavResult<(ComponentRef, RouteParams)> {
        let matched =
            self.table
                .match_path(&request.path)
                .ok_or_else(|| NavigationError::RouteNotFound {
                    path: request.path.clone(),
                })?;

        match matched.descriptor {
            RouteDescriptor::Immediate { component } => Ok((component, matched.params)),
            RouteDescriptor::Deferred { chunk, export } => {
                let handle = self.load_chunk(request, &chunk).await?;
                let component = handle.export(&export).cloned().ok_or_else(|| {
                    NavigationError::ExportNotFound {
                        chunk_id: chunk.clone(),
                        export: export.clone(),
                    }
                })?;
                Ok((component, matched.params))
            }
        }
    }

    /// Await the chunk, resetting and retrying failed loads as the retry
    /// policy allows. A superseded navigation does not retry.
    async fn load_chunk(
        &self,
        request: &NavigationRequest,
        chunk: &ChunkId,
    ) -> NavResult<Arc<ModuleHandle>> {
        let mut attempt = 1;
        loop {
            match self.registry.get_or_load(chunk).await {
                Ok(handle) => return Ok(handle),
                Err(error)
                    if attempt < self.config.retry.max_attempts
                        && self.is_latest(request.seq) =>
                {
                    warn!(
                        chunk_id = %chunk,
                        seq = request.seq,
                        attempt,
                        %error,
                        "retrying chunk load"
                    );
                    // Another requester may already have reset or reloaded the
                    // chunk; the next request then joins or reuses that load.
                    if !self.registry.reset_failed(chunk) {
                        debug!(chunk_id = %chunk, "chunk no longer failed; not resetting");
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn finish(
        &self,
        request: NavigationRequest,
        resolved: NavResult<(ComponentRef, RouteParams)>,
    ) -> NavResult<NavigationOutcome> {
        let mut timeline = self.lock();
        if request.seq != timeline.latest {
            let by = timeline.latest;
            debug!(seq = request.seq, by, path = %request.path, "discarding stale navigation");
            self.publish(&request, NavigationEventKind::Superseded { by });
            return Ok(NavigationOutcome::Superseded {
                seq: request.seq,
                by,
            });
        }

        match resolved {
            Ok((component, params)) => {
                timeline.state = NavigatorState::Rendering {
                    seq: request.seq,
                    path: request.path.clone(),
                    component: component.clone(),
                };
                self.renderer.render(&component);
                info!(
                    seq = request.seq,
                    path = %request.path,
                    component = %component,
                    "navigation rendered"
                );
                self.publish(
                    &request,
                    NavigationEventKind::Rendered {
                        component: component.name.clone(),
                    },
                );
                Ok(NavigationOutcome::Rendered {
                    seq: request.seq,
                    component,
                    params,
                })
            }
            Err(error) => {
                timeline.state = NavigatorState::Failed {
                    seq: request.seq,
                    path: request.path.clone(),
                    error: error.clone(),
                };
                self.renderer.render_error(&error);
                warn!(seq = request.seq, path = %request.path, %error, "navigation failed");
                self.publish(
                    &request,
                    NavigationEventKind::Failed {
                        kind: error.kind().to_string(),
                        message: error.to_string(),
                    },
                );
                Err(error)
            }
        }
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.lock().latest == seq
    }

    fn publish(&self, request: &NavigationRequest, kind: NavigationEventKind) {
        // No subscribers is fine.
        let _ = self
            .events
            .send(NavigationEvent::new(request.seq, request.path.clone(), kind));
    }

    fn lock(&self) -> MutexGuard<'_, Timeline> {
        self.timeline.lock().expect("navigator lock poisoned")
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let timeline = self.lock();
        f.debug_struct("Navigator")
            .field("routes", &self.table.len())
            .field("latest", &timeline.latest)
            .field("state", &timeline.state.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::render::RecordingRenderer;
    use lazyroute_loader::{InMemoryTransport, TransportError};
    use lazyroute_types::{ChunkState, ExportSelector};

    struct Fixture {
        transport: Arc<InMemoryTransport>,
        renderer: Arc<RecordingRenderer>,
        navigator: Navigator,
    }

    fn fixture(config: NavigatorConfig) -> Fixture {
        let table = RouteTable::builder()
            .immediate("", ComponentRef::new("Inline"))
            .deferred("dynamic", "dyn-chunk", "default")
            .deferred("settings", "dyn-chunk", "Settings")
            .deferred("broken", "dyn-chunk", "Missing")
            .deferred("users/:id", "users-chunk", "default")
            .build()
            .unwrap();
        let transport = Arc::new(
            InMemoryTransport::new()
                .with_module(
                    ModuleHandle::new("dyn-chunk")
                        .with_default(ComponentRef::new("Dynamic"))
                        .with_export("Settings", ComponentRef::new("Settings")),
                )
                .with_module(
                    ModuleHandle::new("users-chunk").with_default(ComponentRef::new("User")),
                ),
        );
        let renderer = Arc::new(RecordingRenderer::new());
        let navigator = Navigator::with_config(
            Arc::new(table),
            ChunkRegistry::with_transport(transport.clone()),
            renderer.clone(),
            config,
        );
        Fixture {
            transport,
            renderer,
            navigator,
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let f = fixture(NavigatorConfig::default());
        assert_eq!(f.navigator.state(), NavigatorState::Idle);
        assert_eq!(f.navigator.latest_seq(), 0);
    }

    #[tokio::test]
    async fn immediate_route_renders_without_loading() {
        let f = fixture(NavigatorConfig::default());
        let outcome = f.navigator.navigate("").await.unwrap();
        assert_eq!(outcome.component().unwrap().name, "Inline");
        assert_eq!(f.transport.total_fetches(), 0);
        assert_eq!(f.navigator.state().name(), "rendering");
        assert_eq!(f.renderer.rendered(), vec!["Inline"]);
    }

    #[tokio::test]
    async fn named_export_and_params() {
        let f = fixture(NavigatorConfig::default());
        let outcome = f.navigator.navigate("settings").await.unwrap();
        assert_eq!(outcome.component().unwrap().name, "Settings");

        match f.navigator.navigate("users/42").await.unwrap() {
            NavigationOutcome::Rendered { params, seq, .. } => {
                assert_eq!(params.get("id"), Some("42"));
                assert_eq!(seq, 2);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_export_keeps_chunk_loaded() {
        let f = fixture(NavigatorConfig::default());
        let err = f.navigator.navigate("broken").await.unwrap_err();
        assert_eq!(
            err,
            NavigationError::ExportNotFound {
                chunk_id: ChunkId::new("dyn-chunk"),
                export: ExportSelector::named("Missing"),
            }
        );
        let chunk = ChunkId::new("dyn-chunk");
        assert_eq!(f.navigator.registry().state(&chunk), ChunkState::Loaded);

        // Retrying the broken route does not refetch.
        f.navigator.navigate("broken").await.unwrap_err();
        f.navigator.navigate("dynamic").await.unwrap();
        assert_eq!(f.transport.fetch_count(&chunk), 1);
        assert_eq!(f.renderer.errors(), vec!["export-not-found", "export-not-found"]);
    }

    #[tokio::test]
    async fn failure_state_then_recovery_on_next_navigation() {
        let f = fixture(NavigatorConfig::default());
        f.navigator.navigate("nowhere").await.unwrap_err();
        assert!(matches!(f.navigator.state(), NavigatorState::Failed { seq: 1, .. }));

        f.navigator.navigate("").await.unwrap();
        assert!(matches!(f.navigator.state(), NavigatorState::Rendering { seq: 2, .. }));
    }

    #[tokio::test]
    async fn retry_policy_recovers_transient_failure() {
        let f = fixture(NavigatorConfig {
            retry: RetryPolicy::attempts(3),
            ..Default::default()
        });
        f.transport
            .fail_times("dyn-chunk", TransportError::Other("flaky".into()), 2);

        let outcome = f.navigator.navigate("dynamic").await.unwrap();
        assert_eq!(outcome.component().unwrap().name, "Dynamic");
        assert_eq!(f.transport.fetch_count(&ChunkId::new("dyn-chunk")), 3);
        assert!(f.renderer.errors().is_empty());
    }

    #[tokio::test]
    async fn retry_policy_gives_up_after_max_attempts() {
        let f = fixture(NavigatorConfig {
            retry: RetryPolicy::attempts(2),
            ..Default::default()
        });
        f.transport
            .fail("dyn-chunk", TransportError::Other("offline".into()));

        let err = f.navigator.navigate("dynamic").await.unwrap_err();
        assert_eq!(err.kind(), "chunk-load");
        assert_eq!(f.transport.fetch_count(&ChunkId::new("dyn-chunk")), 2);
        assert_eq!(f.renderer.errors(), vec!["chunk-load"]);
    }

    #[tokio::test]
    async fn preload_fetches_without_rendering() {
        let f = fixture(NavigatorConfig::default());
        assert!(f.navigator.preload("users/1").unwrap());
        assert!(!f.navigator.preload("").unwrap());
        assert!(matches!(
            f.navigator.preload("nowhere"),
            Err(NavigationError::RouteNotFound { .. })
        ));
        assert_eq!(f.navigator.latest_seq(), 0);

        f.navigator.navigate("users/1").await.unwrap();
        assert_eq!(f.transport.fetch_count(&ChunkId::new("users-chunk")), 1);
        assert_eq!(f.renderer.rendered(), vec!["User"]);
    }

    #[tokio::test]
    async fn preload_all_starts_each_chunk_once() {
        let f = fixture(NavigatorConfig::default());
        assert_eq!(f.navigator.preload_all(), 2);
        assert_eq!(f.navigator.preload_all(), 0);
        f.navigator.navigate("dynamic").await.unwrap();
        f.navigator.navigate("users/9").await.unwrap();
        assert_eq!(f.transport.total_fetches(), 2);
    }

    #[tokio::test]
    async fn events_bracket_each_navigation() {
        let f = fixture(NavigatorConfig::default());
        let mut events = f.navigator.subscribe();

        f.navigator.navigate("").await.unwrap();
        f.navigator.navigate("nowhere").await.unwrap_err();

        let kinds: Vec<NavigationEventKind> =
            std::iter::from_fn(|| events.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[0], NavigationEventKind::Started);
        assert_eq!(
            kinds[1],
            NavigationEventKind::Rendered {
                component: "Inline".into()
            }
        );
        assert_eq!(kinds[2], NavigationEventKind::Started);
        assert!(matches!(kinds[3], NavigationEventKind::Failed { .. }));
    }
}
