#![forbid(unsafe_code)]

//! Node free-lists.
//!
//! Recycled nodes are split by provenance: the ready pool holds nodes with
//! fully built content (safe to retarget via `update_row`), the loading
//! pool holds former placeholders (no usable content, must go through
//! `create_row`).

/// Free-list sizes, exposed for conservation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub ready: usize,
    pub loading: usize,
}

#[derive(Debug)]
pub(crate) struct NodePool<N> {
    ready: Vec<N>,
    loading: Vec<N>,
}

impl<N> Default for NodePool<N> {
    fn default() -> Self {
        Self {
            ready: Vec::new(),
            loading: Vec::new(),
        }
    }
}

impl<N> NodePool<N> {
    pub(crate) fn pop_ready(&mut self) -> Option<N> {
        self.ready.pop()
    }

    pub(crate) fn pop_loading(&mut self) -> Option<N> {
        self.loading.pop()
    }

    pub(crate) fn push_ready(&mut self, node: N) {
        self.ready.push(node);
    }

    pub(crate) fn push_loading(&mut self, node: N) {
        self.loading.push(node);
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            ready: self.ready.len(),
            loading: self.loading.len(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.ready.clear();
        self.loading.clear();
    }
}
