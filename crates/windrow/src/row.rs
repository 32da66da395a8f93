#![forbid(unsafe_code)]

//! Single-axis windowing controller.
//!
//! [`RowWindow`] owns the committed visible index range, the live slot
//! sequence, and the node pools. On every scroll event it recomputes the
//! visible range and applies the minimal reconciliation plan, so per-frame
//! work is bounded by the scroll delta, never by the dataset size.
//!
//! # Node selection
//!
//! Each index added to the window picks its node in fixed order: pop from
//! the ready pool and retarget via `update_row`; else pop from the loading
//! pool and rebuild via `create_row` (former placeholders carry no usable
//! content); else allocate fresh. Either delegate call may answer
//! [`RowContent::Loading`], in which case the real node is parked, a
//! placeholder sized to the row takes its slot, and [`RowWindow::settle_loads`]
//! later swaps the finished node in. A placeholder that scrolls away before
//! its load settles aborts the load; the settlement then only does pool
//! bookkeeping.

use std::collections::VecDeque;
use std::ops::Range;

use windrow_core::{
    AxisContext, ScrollDirection, ScrollResult, ShiftPlan, plan_shift, visible_range,
};

use crate::delegate::{RowContent, RowDelegate};
use crate::loading::LoadHandle;
use crate::pool::{NodePool, PoolStats};

/// Live node accounting, exposed for conservation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    /// Slots currently in the window (placeholders included).
    pub rendered: usize,
    pub pool: PoolStats,
    /// Placeholders in the window with a pending load.
    pub live_loading: usize,
    /// Pending loads whose placeholder was already recycled.
    pub in_flight: usize,
}

impl WindowStats {
    /// Total nodes owned by the controller, in any state.
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.rendered + self.pool.ready + self.pool.loading + self.live_loading + self.in_flight
    }
}

struct Slot<N> {
    index: usize,
    node: N,
    /// Placeholder key while a load for this slot is (or was) pending.
    placeholder: Option<u64>,
}

struct LoadingEntry<N> {
    key: u64,
    handle: LoadHandle,
    real: N,
}

type ScrollListener = Box<dyn FnMut(ScrollDirection, ScrollResult)>;

/// Windowing controller for one axis of nodes.
pub struct RowWindow<D: RowDelegate> {
    delegate: D,
    ctx: AxisContext,
    /// Committed window; `None` until initialized or after `remove_all`.
    committed: Option<(usize, usize)>,
    /// Latest raw range, tracked even when the window did not move.
    forced: (usize, usize),
    first_pos: f64,
    slots: VecDeque<Slot<D::Node>>,
    pool: NodePool<D::Node>,
    loading: Vec<LoadingEntry<D::Node>>,
    in_flight: Vec<(LoadHandle, D::Node)>,
    uid: u64,
    puid: u64,
    listeners: Vec<ScrollListener>,
}

impl<D: RowDelegate> RowWindow<D> {
    pub fn new(delegate: D, ctx: AxisContext) -> Self {
        Self {
            delegate,
            ctx,
            committed: None,
            forced: (0, 0),
            first_pos: 0.0,
            slots: VecDeque::new(),
            pool: NodePool::default(),
            loading: Vec::new(),
            in_flight: Vec::new(),
            uid: 0,
            puid: 0,
            listeners: Vec::new(),
        }
    }

    /// Builds the initial window for the given scroll position.
    pub fn initialize(&mut self, offset: f64, viewport: f64) {
        let r = visible_range(offset, viewport, &self.ctx);
        self.forced = (r.first, r.last);
        if self.ctx.is_empty() {
            self.committed = None;
            self.first_pos = 0.0;
            self.delegate.set_offset(0.0, 0.0);
            return;
        }
        self.append(r.first..r.last + 1);
        self.commit(r.first, r.last, r.first_pos);
    }

    /// Reconciles the window against a new scroll position.
    pub fn on_scroll(
        &mut self,
        offset: f64,
        viewport: f64,
        direction: ScrollDirection,
    ) -> ScrollResult {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("row_scroll", offset, viewport).entered();

        let r = visible_range(offset, viewport, &self.ctx);
        self.forced = (r.first, r.last);
        let result = if self.ctx.is_empty() {
            ScrollResult::None
        } else {
            let plan = match self.committed {
                Some((c_first, c_last)) => plan_shift(c_first, c_last, r.first, r.last),
                None => ShiftPlan::Rebuild,
            };
            let result = plan.result();
            match plan {
                ShiftPlan::None => {}
                ShiftPlan::Rebuild => {
                    self.recycle_all();
                    self.append(r.first..r.last + 1);
                }
                ShiftPlan::Forward { trim_front, append } => {
                    self.trim_front(trim_front.len());
                    self.append(append);
                }
                ShiftPlan::Backward { prepend, trim_back } => {
                    self.trim_back(trim_back.len());
                    self.prepend(prepend);
                }
                ShiftPlan::Extend { prepend, append } => {
                    self.prepend(prepend);
                    self.append(append);
                }
            }
            if result != ScrollResult::None {
                self.commit(r.first, r.last, r.first_pos);

                #[cfg(feature = "tracing")]
                tracing::trace!(
                    target: "windrow::row",
                    first = r.first,
                    last = r.last,
                    rendered = self.slots.len(),
                    ?result,
                    "row window shifted"
                );
            }
            result
        };
        for listener in &mut self.listeners {
            listener(direction, result);
        }
        result
    }

    /// Recycles every rendered node and empties the window.
    pub fn remove_all(&mut self) {
        self.recycle_all();
        self.committed = None;
    }

    /// Full teardown and rebuild against a replaced dataset. Pools survive;
    /// pending loads are aborted.
    pub fn recreate(&mut self, ctx: AxisContext, offset: f64, viewport: f64) {
        self.recycle_all();
        self.committed = None;
        self.ctx = ctx;
        self.initialize(offset, viewport);
    }

    /// Applies every settled load: live placeholders are swapped for their
    /// finished node, orphaned loads salvage their node into the ready pool.
    pub fn settle_loads(&mut self) {
        let mut i = 0;
        while i < self.in_flight.len() {
            if self.in_flight[i].0.settlement().is_some() {
                let (_, mut real) = self.in_flight.swap_remove(i);
                self.delegate.reset_row(&mut real);
                self.pool.push_ready(real);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.loading.len() {
            if self.loading[i].handle.settlement().is_none() {
                i += 1;
                continue;
            }
            let entry = self.loading.swap_remove(i);
            match self
                .slots
                .iter_mut()
                .find(|s| s.placeholder == Some(entry.key))
            {
                Some(slot) => {
                    let placeholder = std::mem::replace(&mut slot.node, entry.real);
                    slot.placeholder = None;
                    self.pool.push_loading(placeholder);
                }
                // Unreachable while the entry table is consistent: a
                // recycled placeholder removes its entry first.
                None => {
                    let mut real = entry.real;
                    self.delegate.reset_row(&mut real);
                    self.pool.push_ready(real);
                }
            }
        }
    }

    /// Registers an observer for every scroll reconciliation.
    pub fn add_scroll_listener(
        &mut self,
        listener: impl FnMut(ScrollDirection, ScrollResult) + 'static,
    ) {
        self.listeners.push(Box::new(listener));
    }

    /// Committed window, if any.
    #[must_use]
    pub fn window(&self) -> Option<(usize, usize)> {
        self.committed
    }

    /// Latest raw range, even when the committed window did not change.
    #[must_use]
    pub fn forced_window(&self) -> (usize, usize) {
        self.forced
    }

    /// Leading edge of the first rendered node, in pixels.
    #[must_use]
    pub fn first_pos(&self) -> f64 {
        self.first_pos
    }

    #[must_use]
    pub fn context(&self) -> &AxisContext {
        &self.ctx
    }

    #[must_use]
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    /// Rendered nodes in ascending index order, placeholders flagged.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, bool, &D::Node)> {
        self.slots
            .iter()
            .map(|s| (s.index, s.placeholder.is_some(), &s.node))
    }

    /// Split borrow for composed controllers: the delegate plus mutable
    /// access to every rendered node.
    pub fn parts_mut(
        &mut self,
    ) -> (
        &mut D,
        impl Iterator<Item = (usize, bool, &mut D::Node)> + '_,
    ) {
        (
            &mut self.delegate,
            self.slots
                .iter_mut()
                .map(|s| (s.index, s.placeholder.is_some(), &mut s.node)),
        )
    }

    #[must_use]
    pub fn stats(&self) -> WindowStats {
        WindowStats {
            rendered: self.slots.len(),
            pool: self.pool.stats(),
            live_loading: self.loading.len(),
            in_flight: self.in_flight.len(),
        }
    }

    pub(crate) fn clear_pool(&mut self) {
        self.pool.clear();
    }

    fn commit(&mut self, first: usize, last: usize, first_pos: f64) {
        self.committed = Some((first, last));
        self.first_pos = first_pos;
        self.delegate
            .set_offset(first_pos, self.ctx.total_extent() - first_pos);
    }

    fn append(&mut self, range: Range<usize>) {
        for index in range {
            let slot = self.build_slot(index);
            self.slots.push_back(slot);
        }
    }

    fn prepend(&mut self, range: Range<usize>) {
        for index in range.rev() {
            let slot = self.build_slot(index);
            self.slots.push_front(slot);
        }
    }

    fn trim_front(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(slot) = self.slots.pop_front() {
                self.recycle(slot);
            }
        }
    }

    fn trim_back(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(slot) = self.slots.pop_back() {
                self.recycle(slot);
            }
        }
    }

    fn recycle_all(&mut self) {
        while let Some(slot) = self.slots.pop_front() {
            self.recycle(slot);
        }
    }

    fn build_slot(&mut self, index: usize) -> Slot<D::Node> {
        let (node, content) = if let Some(mut node) = self.pool.pop_ready() {
            let content = self.delegate.update_row(&mut node, index);
            (node, content)
        } else if let Some(mut node) = self.pool.pop_loading() {
            let content = self.delegate.create_row(&mut node, index);
            (node, content)
        } else {
            self.uid += 1;
            let mut node = self.delegate.allocate(self.uid);
            let content = self.delegate.create_row(&mut node, index);
            (node, content)
        };
        match content {
            RowContent::Ready => Slot {
                index,
                node,
                placeholder: None,
            },
            RowContent::Loading(handle) => {
                let mut placeholder = match self.pool.pop_loading() {
                    Some(p) => p,
                    None => {
                        self.uid += 1;
                        self.delegate.allocate(self.uid)
                    }
                };
                self.delegate
                    .style_placeholder(&mut placeholder, index, self.ctx.extent_of(index));
                self.puid += 1;
                self.loading.push(LoadingEntry {
                    key: self.puid,
                    handle,
                    real: node,
                });
                Slot {
                    index,
                    node: placeholder,
                    placeholder: Some(self.puid),
                }
            }
        }
    }

    fn recycle(&mut self, mut slot: Slot<D::Node>) {
        if let Some(key) = slot.placeholder {
            if let Some(pos) = self.loading.iter().position(|e| e.key == key) {
                let entry = self.loading.swap_remove(pos);
                entry.handle.abort();
                self.in_flight.push((entry.handle, entry.real));
            }
            self.pool.push_loading(slot.node);
        } else {
            self.delegate.reset_row(&mut slot.node);
            self.pool.push_ready(slot.node);
        }
    }
}
