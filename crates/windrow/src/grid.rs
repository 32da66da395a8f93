#![forbid(unsafe_code)]

//! Two-axis grid windowing.
//!
//! [`GridWindow`] composes a vertical [`RowWindow`] with a column window
//! over a second [`AxisContext`]. Row containers hold one cell per visible
//! column; cells are pooled per column index and never reused across
//! columns. Horizontal scrolling applies the same three-way classification
//! as vertical scrolling, edited uniformly across every rendered row in one
//! batch. Headers are materialized for every column up front; only body
//! cells are windowed horizontally.

use std::collections::VecDeque;
use std::ops::Range;

use windrow_core::{
    AxisContext, ScrollDirection, ScrollResult, ShiftPlan, plan_shift, visible_range,
};

use crate::delegate::{CellUpdate, GridDelegate, RowContent, RowDelegate};
use crate::row::{RowWindow, WindowStats};

struct CellSlot<C> {
    col: usize,
    cell: C,
}

/// Row container: the visible cells of one row, ascending by column.
pub struct RowBox<C> {
    cells: VecDeque<CellSlot<C>>,
}

impl<C> Default for RowBox<C> {
    fn default() -> Self {
        Self {
            cells: VecDeque::new(),
        }
    }
}

/// Column-axis state and cell pooling; doubles as the row delegate of the
/// embedded vertical window, so recycled row containers reconcile their
/// cells against the current column window on reuse.
pub struct GridCore<D: GridDelegate> {
    delegate: D,
    col_ctx: AxisContext,
    col_window: Option<(usize, usize)>,
    col_forced: (usize, usize),
    first_col_pos: f64,
    cell_pools: Vec<Vec<D::Cell>>,
    headers: Vec<D::Header>,
}

impl<D: GridDelegate> GridCore<D> {
    fn new(delegate: D, col_ctx: AxisContext) -> Self {
        let pools = (0..col_ctx.item_count()).map(|_| Vec::new()).collect();
        Self {
            delegate,
            col_ctx,
            col_window: None,
            col_forced: (0, 0),
            first_col_pos: 0.0,
            cell_pools: pools,
            headers: Vec::new(),
        }
    }

    fn init_columns(&mut self, offset: f64, viewport: f64) {
        let r = visible_range(offset, viewport, &self.col_ctx);
        self.col_forced = (r.first, r.last);
        self.headers = (0..self.col_ctx.item_count())
            .map(|col| self.delegate.create_header(col))
            .collect();
        if self.col_ctx.is_empty() {
            self.col_window = None;
            return;
        }
        self.col_window = Some((r.first, r.last));
        self.first_col_pos = r.first_pos;
        self.delegate.set_col_offset(r.first_pos);
    }

    /// Pops a pooled cell for `col` and retargets it, or creates one.
    fn select_cell(&mut self, row: usize, col: usize) -> D::Cell {
        match self.cell_pools[col].pop() {
            Some(mut cell) => match self.delegate.update_cell(&mut cell, row, col) {
                CellUpdate::InPlace => cell,
                CellUpdate::Replaced(fresh) => {
                    self.cell_pools[col].push(cell);
                    fresh
                }
            },
            None => self.delegate.create_cell(row, col),
        }
    }

    fn update_slot(&mut self, slot: &mut CellSlot<D::Cell>, row: usize) {
        if let CellUpdate::Replaced(fresh) = self.delegate.update_cell(&mut slot.cell, row, slot.col)
        {
            let old = std::mem::replace(&mut slot.cell, fresh);
            self.cell_pools[slot.col].push(old);
        }
    }

    fn recycle_slot(&mut self, slot: CellSlot<D::Cell>) {
        if slot.col < self.cell_pools.len() {
            self.cell_pools[slot.col].push(slot.cell);
        }
    }

    fn clear_cells(&mut self, node: &mut RowBox<D::Cell>) {
        while let Some(slot) = node.cells.pop_front() {
            self.recycle_slot(slot);
        }
    }

    fn fill_back(&mut self, node: &mut RowBox<D::Cell>, row: usize, cols: Range<usize>) {
        for col in cols {
            let cell = self.select_cell(row, col);
            node.cells.push_back(CellSlot { col, cell });
        }
    }

    fn fill_front(&mut self, node: &mut RowBox<D::Cell>, row: usize, cols: Range<usize>) {
        for col in cols.rev() {
            let cell = self.select_cell(row, col);
            node.cells.push_front(CellSlot { col, cell });
        }
    }

    /// Applies one column shift plan to a single row container.
    fn apply_col_plan(&mut self, node: &mut RowBox<D::Cell>, row: usize, plan: &ShiftPlan) {
        match plan {
            ShiftPlan::None => {}
            ShiftPlan::Rebuild => {
                self.clear_cells(node);
                if let Some((first, last)) = self.col_window {
                    self.fill_back(node, row, first..last + 1);
                }
            }
            ShiftPlan::Forward { trim_front, append } => {
                for _ in 0..trim_front.len() {
                    if let Some(slot) = node.cells.pop_front() {
                        self.recycle_slot(slot);
                    }
                }
                self.fill_back(node, row, append.clone());
            }
            ShiftPlan::Backward { prepend, trim_back } => {
                for _ in 0..trim_back.len() {
                    if let Some(slot) = node.cells.pop_back() {
                        self.recycle_slot(slot);
                    }
                }
                self.fill_front(node, row, prepend.clone());
            }
            ShiftPlan::Extend { prepend, append } => {
                self.fill_front(node, row, prepend.clone());
                self.fill_back(node, row, append.clone());
            }
        }
    }
}

impl<D: GridDelegate> RowDelegate for GridCore<D> {
    type Node = RowBox<D::Cell>;

    fn allocate(&mut self, _uid: u64) -> Self::Node {
        RowBox::default()
    }

    fn create_row(&mut self, node: &mut Self::Node, row: usize) -> RowContent {
        self.clear_cells(node);
        if let Some((first, last)) = self.col_window {
            self.fill_back(node, row, first..last + 1);
        }
        RowContent::Ready
    }

    /// Reconciles a recycled row container against the current column
    /// window; the container may have been pooled under older columns.
    fn update_row(&mut self, node: &mut Self::Node, row: usize) -> RowContent {
        let Some((first, last)) = self.col_window else {
            self.clear_cells(node);
            return RowContent::Ready;
        };
        let bounds = match (node.cells.front(), node.cells.back()) {
            (Some(f), Some(b)) if node.cells.len() >= 2 => Some((f.col, b.col)),
            _ => None,
        };
        let Some((have_first, have_last)) = bounds else {
            // zero or one stale cell: refill outright
            self.clear_cells(node);
            self.fill_back(node, row, first..last + 1);
            return RowContent::Ready;
        };
        if have_first == first && have_last == last {
            for slot in &mut node.cells {
                self.update_slot(slot, row);
            }
        } else if have_first > last || have_last < first {
            self.clear_cells(node);
            self.fill_back(node, row, first..last + 1);
        } else {
            // partial overlap: trim out-of-range edges, retarget survivors,
            // then grow toward the new bounds
            while node.cells.front().is_some_and(|s| s.col < first) {
                if let Some(slot) = node.cells.pop_front() {
                    self.recycle_slot(slot);
                }
            }
            while node.cells.back().is_some_and(|s| s.col > last) {
                if let Some(slot) = node.cells.pop_back() {
                    self.recycle_slot(slot);
                }
            }
            for slot in &mut node.cells {
                self.update_slot(slot, row);
            }
            let survivor_first = node.cells.front().map_or(first, |s| s.col);
            let survivor_last = node.cells.back().map_or(last, |s| s.col);
            self.fill_front(node, row, first..survivor_first);
            self.fill_back(node, row, survivor_last + 1..last + 1);
        }
        RowContent::Ready
    }

    fn set_offset(&mut self, first_pos: f64, occupied: f64) {
        self.delegate.set_row_offset(first_pos, occupied);
    }
}

type ColListener = Box<dyn FnMut(ScrollDirection, ScrollResult)>;

/// Two-axis windowing controller for row×column grids.
pub struct GridWindow<D: GridDelegate> {
    rows: RowWindow<GridCore<D>>,
    col_listeners: Vec<ColListener>,
}

impl<D: GridDelegate> GridWindow<D> {
    pub fn new(delegate: D, row_ctx: AxisContext, col_ctx: AxisContext) -> Self {
        Self {
            rows: RowWindow::new(GridCore::new(delegate, col_ctx), row_ctx),
            col_listeners: Vec::new(),
        }
    }

    /// Builds headers, the initial column window, and the initial rows.
    pub fn initialize(
        &mut self,
        row_offset: f64,
        row_viewport: f64,
        col_offset: f64,
        col_viewport: f64,
    ) {
        self.rows
            .delegate_mut()
            .init_columns(col_offset, col_viewport);
        self.rows.initialize(row_offset, row_viewport);
    }

    /// Reconciles the row window against a new vertical scroll position.
    pub fn on_scroll_vertical(
        &mut self,
        offset: f64,
        viewport: f64,
        direction: ScrollDirection,
    ) -> ScrollResult {
        self.rows.on_scroll(offset, viewport, direction)
    }

    /// Reconciles every rendered row's cells against a new horizontal
    /// scroll position, in one batch across the detached row sequence.
    pub fn on_scroll_horizontal(
        &mut self,
        offset: f64,
        viewport: f64,
        direction: ScrollDirection,
    ) -> ScrollResult {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("col_scroll", offset, viewport).entered();

        let (core, rows) = self.rows.parts_mut();
        let r = visible_range(offset, viewport, &core.col_ctx);
        core.col_forced = (r.first, r.last);
        let result = if core.col_ctx.is_empty() {
            ScrollResult::None
        } else {
            let plan = match core.col_window {
                Some((c_first, c_last)) => plan_shift(c_first, c_last, r.first, r.last),
                None => ShiftPlan::Rebuild,
            };
            let result = plan.result();
            if result != ScrollResult::None {
                core.col_window = Some((r.first, r.last));
                for (row, is_placeholder, node) in rows {
                    // rows still loading have no cells to edit
                    if is_placeholder {
                        continue;
                    }
                    core.apply_col_plan(node, row, &plan);
                }
                core.first_col_pos = r.first_pos;
                core.delegate.set_col_offset(r.first_pos);

                #[cfg(feature = "tracing")]
                tracing::trace!(
                    target: "windrow::grid",
                    first = r.first,
                    last = r.last,
                    ?result,
                    "column window shifted"
                );
            }
            result
        };
        for listener in &mut self.col_listeners {
            listener(direction, result);
        }
        result
    }

    /// Recycles every rendered row and empties the window.
    pub fn remove_all(&mut self) {
        self.rows.remove_all();
    }

    /// Full teardown and rebuild against replaced datasets. Row and cell
    /// pools are cleared since pooled containers no longer match the new
    /// column set; headers are rebuilt.
    pub fn recreate(
        &mut self,
        row_ctx: AxisContext,
        col_ctx: AxisContext,
        row_offset: f64,
        row_viewport: f64,
        col_offset: f64,
        col_viewport: f64,
    ) {
        self.rows.remove_all();
        self.rows.clear_pool();
        let core = self.rows.delegate_mut();
        core.cell_pools = (0..col_ctx.item_count()).map(|_| Vec::new()).collect();
        core.col_ctx = col_ctx;
        core.col_window = None;
        core.headers.clear();
        core.init_columns(col_offset, col_viewport);
        self.rows.recreate(row_ctx, row_offset, row_viewport);
    }

    /// Re-runs the header update hook for every column, e.g. after sort
    /// indicators or captions changed without a dataset change.
    pub fn update_headers(&mut self) {
        let core = self.rows.delegate_mut();
        for (col, header) in core.headers.iter_mut().enumerate() {
            core.delegate.update_header(header, col);
        }
    }

    /// Observer for horizontal window transitions (sticky columns etc.).
    pub fn add_col_listener(
        &mut self,
        listener: impl FnMut(ScrollDirection, ScrollResult) + 'static,
    ) {
        self.col_listeners.push(Box::new(listener));
    }

    /// Observer for vertical window transitions.
    pub fn add_row_listener(
        &mut self,
        listener: impl FnMut(ScrollDirection, ScrollResult) + 'static,
    ) {
        self.rows.add_scroll_listener(listener);
    }

    #[must_use]
    pub fn row_window(&self) -> Option<(usize, usize)> {
        self.rows.window()
    }

    #[must_use]
    pub fn col_window(&self) -> Option<(usize, usize)> {
        self.rows.delegate().col_window
    }

    #[must_use]
    pub fn col_forced_window(&self) -> (usize, usize) {
        self.rows.delegate().col_forced
    }

    #[must_use]
    pub fn first_col_pos(&self) -> f64 {
        self.rows.delegate().first_col_pos
    }

    #[must_use]
    pub fn headers(&self) -> &[D::Header] {
        &self.rows.delegate().headers
    }

    #[must_use]
    pub fn delegate(&self) -> &D {
        &self.rows.delegate().delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.rows.delegate_mut().delegate
    }

    /// Every rendered cell as `(row, col, cell)`, rows ascending, columns
    /// ascending within a row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &D::Cell)> {
        self.rows.nodes().flat_map(|(row, _, node)| {
            node.cells.iter().map(move |slot| (row, slot.col, &slot.cell))
        })
    }

    #[must_use]
    pub fn stats(&self) -> WindowStats {
        self.rows.stats()
    }
}
