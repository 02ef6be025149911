//! The render collaborator.
//!
//! Rendering is outside lazyroute: the navigator only hands a resolved
//! [`ComponentRef`] (or a failure) to a [`Renderer`]. [`RecordingRenderer`]
//! keeps every call in memory for tests and embedding.

use std::sync::Mutex;

use lazyroute_types::ComponentRef;
use serde::Serialize;

use crate::error::NavigationError;

/// Receives the results of navigations.
///
/// Calls are synchronous and made while the navigator's state is locked, so
/// an implementation must not call back into the same navigator. A later
/// `render` replaces whatever an earlier one displayed.
pub trait Renderer: Send + Sync {
    /// Display a resolved component.
    fn render(&self, component: &ComponentRef);

    /// Display a navigation failure (error boundary).
    fn render_error(&self, error: &NavigationError);
}

/// One call observed by a [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RenderCall {
    Render { component: ComponentRef },
    Error { kind: String, message: String },
}

/// An in-memory [`Renderer`] that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().expect("renderer lock poisoned").clone()
    }

    /// Names of the rendered components, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RenderCall::Render { component } => Some(component.name),
                RenderCall::Error { .. } => None,
            })
            .collect()
    }

    /// Kinds of the reported errors, in order.
    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RenderCall::Error { kind, .. } => Some(kind),
                RenderCall::Render { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().expect("renderer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, component: &ComponentRef) {
        self.calls
            .lock()
            .expect("renderer lock poisoned")
            .push(RenderCall::Render {
                component: component.clone(),
            });
    }

    fn render_error(&self, error: &NavigationError) {
        self.calls
            .lock()
            .expect("renderer lock poisoned")
            .push(RenderCall::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            });
    }
}
