//! Radix tree for method + path route matching.
//!
//! Static segments match exactly and win over parameter segments. Parameter
//! segments are written either framework style (`:id`) or OpenAPI style
//! (`{id}`); both capture one path segment. Lookup backtracks when a static
//! branch dead-ends, so `/users/me/posts` and `/users/:id/comments` coexist.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use super::ParamVec;

/// Parameter name of a pattern segment, if it is one.
pub(crate) fn param_name(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix(':') {
        return Some(name.trim_end_matches('?'));
    }
    segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
}

pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

struct RadixNode<T> {
    segment: String,
    param: Option<Arc<str>>,
    routes: HashMap<Method, Arc<T>>,
    children: Vec<RadixNode<T>>,
    param_children: Vec<RadixNode<T>>,
}

impl<T> RadixNode<T> {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            param: None,
            routes: HashMap::new(),
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(name: &str) -> Self {
        Self {
            param: Some(Arc::from(name)),
            ..Self::new("")
        }
    }

    fn insert(&mut self, segments: &[&str], method: Method, route: Arc<T>) -> Option<Arc<T>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.insert(method, route);
        };

        if let Some(name) = param_name(segment) {
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param.as_deref() == Some(name))
            {
                return child.insert(remaining, method, route);
            }
            let mut child = RadixNode::new_param(name);
            let replaced = child.insert(remaining, method, route);
            self.param_children.push(child);
            return replaced;
        }

        if let Some(child) = self.children.iter_mut().find(|c| c.segment == segment) {
            return child.insert(remaining, method, route);
        }
        let mut child = RadixNode::new(segment);
        let replaced = child.insert(remaining, method, route);
        self.children.push(child);
        replaced
    }

    fn search(&self, segments: &[&str], method: &Method, params: &mut ParamVec) -> Option<Arc<T>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.get(method).cloned();
        };

        for child in self.children.iter().filter(|c| c.segment == segment) {
            if let Some(route) = child.search(remaining, method, params) {
                return Some(route);
            }
        }

        for child in &self.param_children {
            if let Some(name) = &child.param {
                params.push((Arc::clone(name), segment.to_string()));
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
                params.pop();
            }
        }
        None
    }
}

/// Route table keyed by method and path pattern.
pub struct RadixTree<T> {
    root: RadixNode<T>,
    len: usize,
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        Self {
            root: RadixNode::new(""),
            len: 0,
        }
    }
}

impl<T> RadixTree<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `route` under `method` and `pattern`.
    ///
    /// # Returns
    ///
    /// The route previously registered for the same method and pattern.
    pub fn insert(&mut self, method: Method, pattern: &str, route: T) -> Option<Arc<T>> {
        let segments: Vec<&str> = split_segments(pattern).collect();
        let replaced = self.root.insert(&segments, method, Arc::new(route));
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    /// Find the route for `method` and a concrete request `path`.
    pub fn route(&self, method: &Method, path: &str) -> Option<(Arc<T>, ParamVec)> {
        let segments: Vec<&str> = split_segments(path).collect();
        let mut params = ParamVec::new();
        let route = self.root.search(&segments, method, &mut params)?;
        Some((route, params))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
