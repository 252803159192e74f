//! # Router Module
//!
//! Maps method + path to the middleware chain registered for it.
//!
//! Patterns use `:name` segments the way route groups are written
//! (`/pets/:id`); `{name}` is accepted as well. Matching returns the
//! [`Route`] together with the captured path parameters.

mod radix;

use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::handler::NativeHandler;
use crate::openapi::Operation;

pub use radix::RadixTree;
pub(crate) use radix::{param_name, split_segments};

/// Maximum number of path parameters stored inline.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters, in pattern order.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered route.
pub struct Route {
    pub method: Method,
    pub pattern: String,
    /// Middlewares followed by the endpoint handler, run in order.
    pub chain: Vec<NativeHandler>,
    /// Documented operation, absent for plain native routes.
    pub operation: Option<Arc<Operation>>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("handlers", &self.chain.len())
            .field("operation", &self.operation.as_ref().map(|op| op.id.as_str()))
            .finish()
    }
}

/// Radix-tree backed route table.
#[derive(Default)]
pub struct Router {
    tree: RadixTree<Route>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route`, replacing any route with the same method and pattern.
    pub fn add_route(&mut self, route: Route) {
        let method = route.method.clone();
        let pattern = route.pattern.clone();
        if self.tree.insert(method.clone(), &pattern, route).is_some() {
            warn!(method = %method, pattern = %pattern, "route replaced");
        }
    }

    /// Find the route matching a request.
    pub fn route(&self, method: &Method, path: &str) -> Option<(Arc<Route>, ParamVec)> {
        self.tree.route(method, path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
