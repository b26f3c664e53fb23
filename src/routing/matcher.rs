//! Route matching tree.
//!
//! # Responsibilities
//! - Arrange compiled segment lists into a trie (one per subdomain bucket)
//! - Walk a request path against the trie, testing parameter predicates
//! - Distinguish "matched", "method not allowed" and "not found"
//!
//! # Design Decisions
//! - Nodes live in an arena and are addressed by index
//! - Static children are a hash lookup and commit the walk when present
//! - Dynamic children are tried in registration order with backtracking
//!   limited to the current sibling list
//! - The closest enclosing wildcard is the last resort at every level
//! - The walk never mutates the tree and never logs above `trace`

use std::collections::HashMap;

use axum::http::Method;

use super::segment::{split_path, CompiledParam, CompiledSegment};

pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Default)]
struct Node {
    statics: HashMap<String, NodeId>,
    /// Registration order is match priority.
    dynamics: Vec<NodeId>,
    wildcard: Option<NodeId>,
    /// Guard for dynamic and wildcard nodes; `None` for static ones.
    param: Option<CompiledParam>,
    /// Method → index of the route that ends here.
    terminal: HashMap<Method, usize>,
}

/// Why a compiled route could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// Same method and same compiled segments as `existing`.
    Conflict { existing: usize },
    /// Two catch-all parameters with different names at one position.
    Shadowed { existing: String, param: String },
    /// Two different wildcards under one node.
    Wildcard { existing: String, param: String },
}

/// Result of walking one tree.
#[derive(Debug)]
pub enum TreeMatch<'t, 'p> {
    Found {
        route: usize,
        captures: Vec<(&'t str, &'p str)>,
    },
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
    NotFound {
        /// First explicit `else` code of a parameter that rejected the path.
        status: Option<u16>,
    },
}

#[derive(Debug)]
pub struct RouteTree {
    nodes: Vec<Node>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// True when no route has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[ROOT].terminal.is_empty()
    }

    /// Insert `segments` for `method`, pointing at route index `route`.
    ///
    /// The tree is validated before anything is created, so a rejected
    /// route leaves no trace.
    pub fn insert(
        &mut self,
        segments: &[CompiledSegment],
        method: Method,
        route: usize,
    ) -> Result<(), InsertError> {
        self.check(segments, &method)?;

        let mut at = ROOT;
        for segment in segments {
            at = match segment {
                CompiledSegment::Literal(text) => match self.nodes[at].statics.get(text) {
                    Some(&child) => child,
                    None => {
                        let child = self.push(None);
                        self.nodes[at].statics.insert(text.clone(), child);
                        child
                    }
                },
                CompiledSegment::Dynamic(param) => match self.find_dynamic(at, param)? {
                    Some(child) => child,
                    None => {
                        if let Some(catch_all) = self.catch_all(at) {
                            tracing::warn!(
                                param = %param.key(),
                                catch_all = %catch_all,
                                "parameter registered after a catch-all sibling is only tried when the catch-all branch fails"
                            );
                        }
                        let child = self.push(Some(param.clone()));
                        self.nodes[at].dynamics.push(child);
                        child
                    }
                },
                CompiledSegment::Wildcard(param) => match self.find_wildcard(at, param)? {
                    Some(child) => child,
                    None => {
                        let child = self.push(Some(param.clone()));
                        self.nodes[at].wildcard = Some(child);
                        child
                    }
                },
            };
        }

        self.nodes[at].terminal.insert(method, route);
        Ok(())
    }

    /// Dry run of [`RouteTree::insert`].
    fn check(&self, segments: &[CompiledSegment], method: &Method) -> Result<(), InsertError> {
        let mut at = ROOT;
        for segment in segments {
            let next = match segment {
                CompiledSegment::Literal(text) => self.nodes[at].statics.get(text).copied(),
                CompiledSegment::Dynamic(param) => self.find_dynamic(at, param)?,
                CompiledSegment::Wildcard(param) => self.find_wildcard(at, param)?,
            };
            match next {
                Some(child) => at = child,
                // The rest of the route is a fresh branch.
                None => return Ok(()),
            }
        }
        match self.nodes[at].terminal.get(method) {
            Some(&existing) => Err(InsertError::Conflict { existing }),
            None => Ok(()),
        }
    }

    fn push(&mut self, param: Option<CompiledParam>) -> NodeId {
        self.nodes.push(Node {
            param,
            ..Node::default()
        });
        self.nodes.len() - 1
    }

    fn param(&self, id: NodeId) -> Option<&CompiledParam> {
        self.nodes[id].param.as_ref()
    }

    fn catch_all(&self, at: NodeId) -> Option<&str> {
        self.nodes[at]
            .dynamics
            .iter()
            .filter_map(|&id| self.param(id))
            .find(|p| p.accepts_any())
            .map(|p| p.key())
    }

    fn find_dynamic(&self, at: NodeId, param: &CompiledParam) -> Result<Option<NodeId>, InsertError> {
        let siblings = &self.nodes[at].dynamics;
        if let Some(&id) = siblings
            .iter()
            .find(|&&id| self.param(id).is_some_and(|p| p.key() == param.key()))
        {
            return Ok(Some(id));
        }
        if param.accepts_any() {
            if let Some(existing) = self.catch_all(at) {
                return Err(InsertError::Shadowed {
                    existing: existing.to_string(),
                    param: param.key().to_string(),
                });
            }
        }
        Ok(None)
    }

    fn find_wildcard(&self, at: NodeId, param: &CompiledParam) -> Result<Option<NodeId>, InsertError> {
        let Some(id) = self.nodes[at].wildcard else {
            return Ok(None);
        };
        match self.param(id) {
            Some(existing) if existing.key() == param.key() => Ok(Some(id)),
            Some(existing) => Err(InsertError::Wildcard {
                existing: existing.key().to_string(),
                param: param.key().to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Match `path` for `method`.
    pub fn lookup<'t, 'p>(&'t self, method: &Method, path: &'p str) -> TreeMatch<'t, 'p> {
        let mut walk = Walk::new(self, Some(method), path);
        match walk.descend(ROOT, 0) {
            Some(route) => TreeMatch::Found {
                route,
                captures: walk.captures,
            },
            None => match walk.allowed_at {
                Some(node) => TreeMatch::MethodNotAllowed {
                    allowed: self.methods_at(node),
                },
                None => TreeMatch::NotFound {
                    status: walk.else_code,
                },
            },
        }
    }

    /// Methods registered at the node `path` resolves to, regardless of method.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut walk = Walk::new(self, None, path);
        match walk.descend(ROOT, 0) {
            Some(_) => walk.matched.map(|node| self.methods_at(node)).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn methods_at(&self, node: NodeId) -> Vec<Method> {
        let mut methods: Vec<Method> = self.nodes[node].terminal.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}

/// State for one depth-first walk.
struct Walk<'t, 'p, 'm> {
    tree: &'t RouteTree,
    /// `None` accepts any registered method.
    method: Option<&'m Method>,
    path: &'p str,
    /// Non-empty segments with their byte offsets into `path`.
    segments: Vec<(usize, &'p str)>,
    captures: Vec<(&'t str, &'p str)>,
    else_code: Option<u16>,
    allowed_at: Option<NodeId>,
    matched: Option<NodeId>,
}

impl<'t, 'p, 'm> Walk<'t, 'p, 'm> {
    fn new(tree: &'t RouteTree, method: Option<&'m Method>, path: &'p str) -> Self {
        let base = path.as_ptr() as usize;
        let segments = split_path(path)
            .map(|s| (s.as_ptr() as usize - base, s))
            .collect();
        Self {
            tree,
            method,
            path,
            segments,
            captures: Vec::new(),
            else_code: None,
            allowed_at: None,
            matched: None,
        }
    }

    /// Route index registered at `node` for the walked method.
    fn terminal(&mut self, node: NodeId) -> Option<usize> {
        let tree = self.tree;
        let terminal = &tree.nodes[node].terminal;
        let found = match self.method {
            Some(method) => terminal.get(method).copied(),
            None => terminal.values().next().copied(),
        };
        match found {
            Some(route) => {
                self.matched = Some(node);
                Some(route)
            }
            None => {
                if !terminal.is_empty() && self.allowed_at.is_none() {
                    self.allowed_at = Some(node);
                }
                None
            }
        }
    }

    fn reject(&mut self, code: Option<u16>) {
        if self.else_code.is_none() {
            self.else_code = code;
        }
    }

    /// Everything from segment `depth` on, without the trailing slash.
    fn remainder(&self, depth: usize) -> &'p str {
        let path = self.path;
        match self.segments.get(depth) {
            Some(&(offset, _)) => path[offset..].trim_end_matches('/'),
            None => "",
        }
    }

    fn descend(&mut self, at: NodeId, depth: usize) -> Option<usize> {
        let tree = self.tree;
        let node = &tree.nodes[at];

        let Some(&(_, segment)) = self.segments.get(depth) else {
            return self.terminal(at).or_else(|| self.try_wildcard(at, depth));
        };

        if let Some(&child) = node.statics.get(segment) {
            return self
                .descend(child, depth + 1)
                .or_else(|| self.try_wildcard(at, depth));
        }

        // Else codes only count when no sibling takes the segment.
        let mut rejected = None;
        let mut accepted = false;
        for &child in &node.dynamics {
            let Some(param) = tree.nodes[child].param.as_ref() else {
                continue;
            };
            if !param.matches(segment) {
                rejected = rejected.or(param.else_code());
                continue;
            }
            accepted = true;
            let mark = self.captures.len();
            self.captures.push((param.name(), segment));
            if let Some(route) = self.descend(child, depth + 1) {
                return Some(route);
            }
            self.captures.truncate(mark);
        }
        if !accepted {
            self.reject(rejected);
        }

        self.try_wildcard(at, depth)
    }

    fn try_wildcard(&mut self, at: NodeId, depth: usize) -> Option<usize> {
        let tree = self.tree;
        let child = tree.nodes[at].wildcard?;
        let param = tree.nodes[child].param.as_ref()?;
        let rest = self.remainder(depth);
        if !param.matches(rest) {
            self.reject(param.else_code());
            return None;
        }
        let route = self.terminal(child)?;
        self.captures.push((param.name(), rest));
        Some(route)
    }
}
