#![forbid(unsafe_code)]

//! Quad-tree spatial partitioning for very large 2D grids.
//!
//! [`QuadPartition`] recursively splits `[0, rows) x [0, cols)` into four
//! quadrants until both axes fit in a 4x4 leaf. Split points are pixel
//! weighted: each axis splits at the index whose cumulative extent reaches
//! half the node's pixel extent, so quadrant areas stay balanced under
//! exception-heavy axes. The index tree is immutable and rebuilt wholesale
//! on dataset changes; rendering walks it against the visible viewport,
//! materializing cells only inside visible leaves and collapsing everything
//! else to size-only placeholders. Live node count is bounded by visible
//! leaves times leaf capacity, not by the dataset.

use windrow_core::{AxisContext, slice_extent, visible_range};

use crate::delegate::QuadDelegate;

/// Leaves hold at most this many items per axis.
const LEAF_COUNT: usize = 4;

type QuadId = usize;

#[derive(Debug, Clone, Copy)]
enum QuadKind {
    Leaf,
    Inner {
        row_middle: usize,
        col_middle: usize,
        /// TL, TR, BL, BR.
        children: [QuadId; 4],
    },
}

#[derive(Debug, Clone, Copy)]
struct QuadNode {
    row_first: usize,
    row_last: usize,
    col_first: usize,
    col_last: usize,
    width: f64,
    height: f64,
    /// Non-owning back-reference; traversal only.
    parent: Option<QuadId>,
    kind: QuadKind,
}

#[derive(Debug, Default)]
struct QuadTree {
    nodes: Vec<QuadNode>,
    root: QuadId,
}

/// Tree node metadata, exposed for structural checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadNodeInfo {
    pub id: usize,
    pub parent: Option<usize>,
    pub row_first: usize,
    pub row_last: usize,
    pub col_first: usize,
    pub col_last: usize,
    pub width: f64,
    pub height: f64,
    /// TL, TR, BL, BR for inner nodes, `None` for leaves.
    pub children: Option<[usize; 4]>,
}

/// Smallest index whose cumulative extent from `first` reaches half of
/// `total`, clamped so both halves stay non-empty.
fn split_index(ctx: &AxisContext, first: usize, last: usize, total: f64) -> usize {
    if last <= first {
        return first;
    }
    let default = ctx.default_extent();
    let half = total / 2.0;
    let mut acc = 0.0;
    let mut next = first;
    for e in ctx.exceptions() {
        if e.index < first {
            continue;
        }
        if e.index > last {
            break;
        }
        let run = (e.index - next) as f64 * default;
        if acc + run >= half {
            let need = ((half - acc) / default).ceil().max(1.0) as usize;
            return (next + need - 1).clamp(first, last - 1);
        }
        acc += run;
        if acc + e.extent >= half {
            return e.index.clamp(first, last - 1);
        }
        acc += e.extent;
        next = e.index + 1;
    }
    let need = ((half - acc) / default).ceil().max(1.0) as usize;
    (next + need - 1).clamp(first, last - 1)
}

fn build_tree(row: &AxisContext, col: &AxisContext) -> QuadTree {
    if row.is_empty() || col.is_empty() {
        return QuadTree::default();
    }
    let mut nodes = Vec::new();
    let root = build_node(
        &mut nodes,
        None,
        (0, row.item_count() - 1, row.total_extent()),
        (0, col.item_count() - 1, col.total_extent()),
        row,
        col,
    );
    QuadTree { nodes, root }
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    nodes: &mut Vec<QuadNode>,
    parent: Option<QuadId>,
    (row_first, row_last, height): (usize, usize, f64),
    (col_first, col_last, width): (usize, usize, f64),
    row_ctx: &AxisContext,
    col_ctx: &AxisContext,
) -> QuadId {
    let id = nodes.len();
    let mut node = QuadNode {
        row_first,
        row_last,
        col_first,
        col_last,
        width,
        height,
        parent,
        kind: QuadKind::Leaf,
    };
    // inclusive ranges; a degenerate child has first == last + 1
    let row_count = (row_last + 1).saturating_sub(row_first);
    let col_count = (col_last + 1).saturating_sub(col_first);
    if row_count <= LEAF_COUNT && col_count <= LEAF_COUNT {
        nodes.push(node);
        return id;
    }
    nodes.push(node);

    let row_middle = split_index(row_ctx, row_first, row_last, height);
    let col_middle = split_index(col_ctx, col_first, col_last, width);
    let top = slice_extent(row_ctx, row_first, row_middle);
    let bottom = height - top;
    let left = slice_extent(col_ctx, col_first, col_middle);
    let right = width - left;

    let tl = build_node(
        nodes,
        Some(id),
        (row_first, row_middle, top),
        (col_first, col_middle, left),
        row_ctx,
        col_ctx,
    );
    let tr = build_node(
        nodes,
        Some(id),
        (row_first, row_middle, top),
        (col_middle + 1, col_last, right),
        row_ctx,
        col_ctx,
    );
    let bl = build_node(
        nodes,
        Some(id),
        (row_middle + 1, row_last, bottom),
        (col_first, col_middle, left),
        row_ctx,
        col_ctx,
    );
    let br = build_node(
        nodes,
        Some(id),
        (row_middle + 1, row_last, bottom),
        (col_middle + 1, col_last, right),
        row_ctx,
        col_ctx,
    );

    node.kind = QuadKind::Inner {
        row_middle,
        col_middle,
        children: [tl, tr, bl, br],
    };
    nodes[id] = node;
    id
}

/// Live render container, isomorphic to the top of the index tree.
struct Container<C> {
    /// Inline size override; set on placeholders, cleared on recycle.
    size: Option<(f64, f64)>,
    body: Body<C>,
}

enum Body<C> {
    /// Size-only stand-in for an invisible quadrant.
    Placeholder,
    /// Cell matrix in row-major order.
    Leaf(Vec<C>),
    /// Four quadrant containers (TL, TR, BL, BR) once populated.
    Inner(Vec<Container<C>>),
}

impl<C> Default for Container<C> {
    fn default() -> Self {
        Self {
            size: None,
            body: Body::Placeholder,
        }
    }
}

impl<C> Container<C> {
    fn is_placeholder(&self) -> bool {
        matches!(self.body, Body::Placeholder)
    }
}

#[derive(Debug, Clone, Copy)]
struct View {
    row_first: usize,
    row_last: usize,
    col_first: usize,
    col_last: usize,
}

/// Hierarchical windowing controller for row×column grids.
pub struct QuadPartition<D: QuadDelegate> {
    delegate: D,
    row_ctx: AxisContext,
    col_ctx: AxisContext,
    tree: QuadTree,
    root: Container<D::Cell>,
    pool_leaves: Vec<Vec<D::Cell>>,
    pool_inner: Vec<Vec<Container<D::Cell>>>,
}

impl<D: QuadDelegate> QuadPartition<D> {
    pub fn new(delegate: D, row_ctx: AxisContext, col_ctx: AxisContext) -> Self {
        let tree = build_tree(&row_ctx, &col_ctx);
        Self {
            delegate,
            row_ctx,
            col_ctx,
            tree,
            root: Container::default(),
            pool_leaves: Vec::new(),
            pool_inner: Vec::new(),
        }
    }

    /// Renders the tree against the initial scroll position.
    pub fn initialize(
        &mut self,
        row_offset: f64,
        row_viewport: f64,
        col_offset: f64,
        col_viewport: f64,
    ) {
        self.render(row_offset, row_viewport, col_offset, col_viewport);
    }

    /// Re-renders against a new scroll position; quadrants leaving the
    /// viewport collapse to placeholders, quadrants entering it rebuild.
    pub fn on_scroll(
        &mut self,
        row_offset: f64,
        row_viewport: f64,
        col_offset: f64,
        col_viewport: f64,
    ) {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("quad_scroll", row_offset, col_offset).entered();

        self.render(row_offset, row_viewport, col_offset, col_viewport);
    }

    /// Rebuilds the index tree wholesale against replaced datasets and
    /// renders fresh. Pools are cleared; old containers are discarded.
    pub fn recreate(
        &mut self,
        row_ctx: AxisContext,
        col_ctx: AxisContext,
        row_offset: f64,
        row_viewport: f64,
        col_offset: f64,
        col_viewport: f64,
    ) {
        self.row_ctx = row_ctx;
        self.col_ctx = col_ctx;
        self.tree = build_tree(&self.row_ctx, &self.col_ctx);
        self.root = Container::default();
        self.pool_leaves.clear();
        self.pool_inner.clear();
        self.render(row_offset, row_viewport, col_offset, col_viewport);
    }

    #[must_use]
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    /// Index tree metadata in allocation order; root first.
    #[must_use]
    pub fn tree_nodes(&self) -> Vec<QuadNodeInfo> {
        self.tree
            .nodes
            .iter()
            .enumerate()
            .map(|(id, n)| QuadNodeInfo {
                id,
                parent: n.parent,
                row_first: n.row_first,
                row_last: n.row_last,
                col_first: n.col_first,
                col_last: n.col_last,
                width: n.width,
                height: n.height,
                children: match n.kind {
                    QuadKind::Leaf => None,
                    QuadKind::Inner { children, .. } => Some(children),
                },
            })
            .collect()
    }

    /// Materialized cells as `(row, col, cell)`, leaf by leaf.
    #[must_use]
    pub fn cells(&self) -> Vec<(usize, usize, &D::Cell)> {
        let mut out = Vec::new();
        if !self.tree.nodes.is_empty() {
            self.collect_cells(self.tree.root, &self.root, &mut out);
        }
        out
    }

    /// `(inner, leaf)` free-list sizes.
    #[must_use]
    pub fn pool_sizes(&self) -> (usize, usize) {
        (self.pool_inner.len(), self.pool_leaves.len())
    }

    /// Inline `(width, height)` of every live placeholder.
    #[must_use]
    pub fn placeholder_sizes(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        collect_placeholders(&self.root, &mut out);
        out
    }

    fn collect_cells<'a>(
        &'a self,
        id: QuadId,
        container: &'a Container<D::Cell>,
        out: &mut Vec<(usize, usize, &'a D::Cell)>,
    ) {
        let node = self.tree.nodes[id];
        match (&container.body, node.kind) {
            (Body::Leaf(cells), _) => {
                let mut it = cells.iter();
                for row in node.row_first..=node.row_last {
                    for col in node.col_first..=node.col_last {
                        if let Some(cell) = it.next() {
                            out.push((row, col, cell));
                        }
                    }
                }
            }
            (Body::Inner(kids), QuadKind::Inner { children, .. }) => {
                for (child_id, kid) in children.iter().zip(kids.iter()) {
                    self.collect_cells(*child_id, kid, out);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, row_offset: f64, row_viewport: f64, col_offset: f64, col_viewport: f64) {
        if self.tree.nodes.is_empty() {
            return;
        }
        let rows = visible_range(row_offset, row_viewport, &self.row_ctx);
        let cols = visible_range(col_offset, col_viewport, &self.col_ctx);
        let view = View {
            row_first: rows.first,
            row_last: rows.last,
            col_first: cols.first,
            col_last: cols.last,
        };
        let mut root = std::mem::take(&mut self.root);
        // the root is always "visible"; make sure its body matches its kind
        if root.is_placeholder() {
            root = self.create(self.tree.root, view);
        } else {
            self.render_into(self.tree.root, &mut root, view);
        }
        self.root = root;
    }

    fn render_into(&mut self, id: QuadId, container: &mut Container<D::Cell>, view: View) {
        let node = self.tree.nodes[id];
        let QuadKind::Inner {
            row_middle,
            col_middle,
            children,
        } = node.kind
        else {
            self.render_leaf(id, container);
            return;
        };

        // quadrant overlap against the viewport, per axis half
        let show_left = !(node.col_first > view.col_last || col_middle < view.col_first);
        let show_right = !(col_middle + 1 > view.col_last || node.col_last < view.col_first);
        let show_top = !(node.row_first > view.row_last || row_middle < view.row_first);
        let show_bottom = !(row_middle + 1 > view.row_last || node.row_last < view.row_first);
        let show = [
            show_left && show_top,
            show_right && show_top,
            show_left && show_bottom,
            show_right && show_bottom,
        ];

        let Body::Inner(kids) = &mut container.body else {
            return;
        };
        if kids.is_empty() {
            let mut fresh = Vec::with_capacity(4);
            for (quadrant, &child_id) in children.iter().enumerate() {
                let kid = if show[quadrant] {
                    self.create(child_id, view)
                } else {
                    self.placeholder(child_id)
                };
                fresh.push(kid);
            }
            if let Body::Inner(kids) = &mut container.body {
                *kids = fresh;
            }
            return;
        }

        for quadrant in 0..4 {
            let child_id = children[quadrant];
            let down = show[quadrant];
            let kid = &mut kids[quadrant];
            if down == kid.is_placeholder() {
                // visibility flipped: replace and recycle
                let fresh = if down {
                    self.create(child_id, view)
                } else {
                    self.placeholder(child_id)
                };
                let old = std::mem::replace(kid, fresh);
                self.recycle(old);
            } else if down && matches!(self.tree.nodes[child_id].kind, QuadKind::Inner { .. }) {
                self.render_into(child_id, kid, view);
            }
        }
    }

    fn render_leaf(&mut self, id: QuadId, container: &mut Container<D::Cell>) {
        let node = self.tree.nodes[id];
        let Body::Leaf(cells) = &mut container.body else {
            return;
        };
        // reuse existing cells front to back; extra cells are dropped,
        // missing ones created
        let mut existing = std::mem::take(cells).into_iter();
        for row in node.row_first..=node.row_last {
            for col in node.col_first..=node.col_last {
                let cell = match existing.next() {
                    Some(mut cell) => {
                        self.delegate.update_cell(&mut cell, row, col);
                        cell
                    }
                    None => self.delegate.create_cell(row, col),
                };
                cells.push(cell);
            }
        }
    }

    fn create(&mut self, id: QuadId, view: View) -> Container<D::Cell> {
        let body = match self.tree.nodes[id].kind {
            QuadKind::Leaf => Body::Leaf(self.pool_leaves.pop().unwrap_or_default()),
            QuadKind::Inner { .. } => Body::Inner(self.pool_inner.pop().unwrap_or_default()),
        };
        let mut container = Container { size: None, body };
        self.render_into(id, &mut container, view);
        container
    }

    fn placeholder(&mut self, id: QuadId) -> Container<D::Cell> {
        let node = self.tree.nodes[id];
        Container {
            size: Some((node.width, node.height)),
            body: Body::Placeholder,
        }
    }

    fn recycle(&mut self, container: Container<D::Cell>) {
        match container.body {
            Body::Placeholder => {}
            Body::Leaf(cells) => self.pool_leaves.push(cells),
            Body::Inner(mut kids) => {
                for kid in kids.drain(..) {
                    self.recycle(kid);
                }
                self.pool_inner.push(kids);
            }
        }
    }
}

fn collect_placeholders<C>(container: &Container<C>, out: &mut Vec<(f64, f64)>) {
    match &container.body {
        Body::Placeholder => {
            if let Some(size) = container.size {
                out.push(size);
            }
        }
        Body::Leaf(_) => {}
        Body::Inner(kids) => {
            for kid in kids {
                collect_placeholders(kid, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestCell {
        row: usize,
        col: usize,
    }

    #[derive(Default)]
    struct TestQuad {
        created: usize,
        updated: usize,
    }

    impl QuadDelegate for TestQuad {
        type Cell = TestCell;

        fn create_cell(&mut self, row: usize, col: usize) -> TestCell {
            self.created += 1;
            TestCell { row, col }
        }

        fn update_cell(&mut self, cell: &mut TestCell, row: usize, col: usize) {
            self.updated += 1;
            cell.row = row;
            cell.col = col;
        }
    }

    fn partition(rows: usize, cols: usize) -> QuadPartition<TestQuad> {
        QuadPartition::new(
            TestQuad::default(),
            AxisContext::uniform(rows, 20.0),
            AxisContext::uniform(cols, 50.0),
        )
    }

    #[test]
    fn leaves_are_at_most_four_by_four() {
        let p = partition(100, 64);
        for n in p.tree_nodes() {
            if n.children.is_none() {
                assert!(n.row_last + 1 - n.row_first <= LEAF_COUNT, "{n:?}");
                assert!(n.col_last + 1 - n.col_first <= LEAF_COUNT, "{n:?}");
            }
        }
    }

    #[test]
    fn children_tile_parent_exactly() {
        let p = QuadPartition::new(
            TestQuad::default(),
            AxisContext::random(200, 20.0, 2.0, 200.0, 0.3, 11),
            AxisContext::random(80, 50.0, 10.0, 400.0, 0.2, 12),
        );
        let nodes = p.tree_nodes();
        for n in &nodes {
            let Some([tl, tr, bl, br]) = n.children else {
                continue;
            };
            let (tl, tr, bl, br) = (&nodes[tl], &nodes[tr], &nodes[bl], &nodes[br]);
            // index tiling
            assert_eq!(tl.row_first, n.row_first);
            assert_eq!(bl.row_first, tl.row_last + 1);
            assert_eq!(bl.row_last, n.row_last);
            assert_eq!(tl.col_first, n.col_first);
            assert_eq!(tr.col_first, tl.col_last + 1);
            assert_eq!(tr.col_last, n.col_last);
            assert_eq!(tr.row_first, n.row_first);
            assert_eq!(br.col_last, n.col_last);
            // pixel extents sum to the parent's
            assert!((tl.width + tr.width - n.width).abs() < 1e-6);
            assert!((tl.height + bl.height - n.height).abs() < 1e-6);
            // back references
            assert_eq!(tl.parent, Some(n.id));
            assert_eq!(br.parent, Some(n.id));
        }
    }

    #[test]
    fn split_balances_pixels_not_counts() {
        // one giant row dwarfs everything else; the pixel midpoint puts it
        // alone in the top half
        let mut extents = vec![20.0; 100];
        extents[0] = 10_000.0;
        let row_ctx = AxisContext::non_uniform(extents, 20.0);
        let p = QuadPartition::new(TestQuad::default(), row_ctx, AxisContext::uniform(64, 50.0));
        let nodes = p.tree_nodes();
        let root = &nodes[0];
        let [tl, _, bl, _] = root.children.unwrap();
        assert_eq!(nodes[tl].row_last, 0);
        assert_eq!(nodes[bl].row_first, 1);
    }

    #[test]
    fn render_materializes_visible_leaves_only() {
        let mut p = partition(1000, 1000);
        // viewport covering rows [0,5], cols [0,4]
        p.initialize(0.0, 100.0, 0.0, 200.0);
        let cells = p.cells();
        assert!(!cells.is_empty());
        for (row, col, cell) in &cells {
            assert_eq!((cell.row, cell.col), (*row, *col));
        }
        // bounded by covering leaves, far below the full 10^6 grid
        assert!(cells.len() <= 8 * LEAF_COUNT * LEAF_COUNT, "{}", cells.len());
        let covered = cells.iter().any(|(r, c, _)| *r == 5 && *c == 4);
        assert!(covered);
    }

    #[test]
    fn scroll_away_collapses_to_placeholders() {
        let mut p = partition(1000, 1000);
        p.initialize(0.0, 100.0, 0.0, 200.0);
        let before = p.delegate().created;
        assert!(before > 0);

        // jump across the grid; old quadrants recycle into the pools
        p.on_scroll(15_000.0, 100.0, 40_000.0, 200.0);
        let cells = p.cells();
        let (inner, leaves) = p.pool_sizes();
        assert!(leaves > 0 || inner > 0);
        for (row, col, cell) in &cells {
            assert_eq!((cell.row, cell.col), (*row, *col));
        }
        assert!(cells.iter().any(|(r, _, _)| *r >= 750));
    }

    #[test]
    fn scroll_back_reuses_pooled_leaves() {
        let mut p = partition(1000, 1000);
        p.initialize(0.0, 100.0, 0.0, 200.0);
        p.on_scroll(15_000.0, 100.0, 40_000.0, 200.0);
        let created = p.delegate().created;
        p.on_scroll(0.0, 100.0, 0.0, 200.0);
        // pooled leaf matrices were retargeted instead of recreated
        assert!(p.delegate().updated > 0);
        assert!(p.delegate().created >= created);
        for (row, col, cell) in &p.cells() {
            assert_eq!((cell.row, cell.col), (*row, *col));
        }
    }

    #[test]
    fn placeholders_carry_their_quadrant_extent() {
        let mut p = partition(1000, 1000);
        p.initialize(0.0, 100.0, 0.0, 200.0);
        let nodes = p.tree_nodes();
        let sizes = p.placeholder_sizes();
        assert!(!sizes.is_empty());
        // every placeholder size matches some tree node's pixel extent
        for (w, h) in sizes {
            assert!(
                nodes
                    .iter()
                    .any(|n| (n.width - w).abs() < 1e-9 && (n.height - h).abs() < 1e-9),
                "{w}x{h}"
            );
        }
    }

    #[test]
    fn small_grid_is_a_single_leaf() {
        let mut p = partition(3, 4);
        p.initialize(0.0, 100.0, 0.0, 200.0);
        let nodes = p.tree_nodes();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].children.is_none());
        assert_eq!(p.cells().len(), 12);
    }

    #[test]
    fn recreate_rebuilds_tree() {
        let mut p = partition(1000, 1000);
        p.initialize(0.0, 100.0, 0.0, 200.0);
        p.recreate(
            AxisContext::uniform(16, 20.0),
            AxisContext::uniform(16, 50.0),
            0.0,
            100.0,
            0.0,
            200.0,
        );
        let nodes = p.tree_nodes();
        assert_eq!(nodes[0].row_last, 15);
        assert_eq!(p.pool_sizes(), (0, 0));
        for (row, col, cell) in &p.cells() {
            assert_eq!((cell.row, cell.col), (*row, *col));
        }
    }

    #[test]
    fn empty_dataset_renders_nothing() {
        let mut p = partition(0, 100);
        p.initialize(0.0, 100.0, 0.0, 200.0);
        assert!(p.cells().is_empty());
        assert!(p.tree_nodes().is_empty());
    }
}
