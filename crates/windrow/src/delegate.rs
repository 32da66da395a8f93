#![forbid(unsafe_code)]

//! Collaborator contracts.
//!
//! The windowing controllers never build content themselves; they drive an
//! injected delegate that owns node allocation and content for a concrete
//! index (and, for grids, a concrete column). Controllers are generic over
//! these traits rather than over any base type.

use crate::loading::LoadHandle;

/// How a row delegate answered a create/update call.
pub enum RowContent {
    /// Content is in place; the node may be shown as-is.
    Ready,
    /// Content is still being built. The controller shows a placeholder and
    /// polls the handle; see [`RowWindow::settle_loads`].
    ///
    /// [`RowWindow::settle_loads`]: crate::row::RowWindow::settle_loads
    Loading(LoadHandle),
}

/// Content provider for one virtualized axis of nodes.
pub trait RowDelegate {
    /// Display node type. Opaque to the controller.
    type Node;

    /// Allocates a blank node. `uid` is unique per node over the
    /// controller's lifetime.
    fn allocate(&mut self, uid: u64) -> Self::Node;

    /// Fills a blank or recycled-while-loading node with content for
    /// `index`.
    fn create_row(&mut self, node: &mut Self::Node, index: usize) -> RowContent;

    /// Retargets a fully built node to `index`, reusing its structure.
    fn update_row(&mut self, node: &mut Self::Node, index: usize) -> RowContent;

    /// Marks a node as a loading placeholder sized to `extent` pixels.
    fn style_placeholder(&mut self, node: &mut Self::Node, index: usize, extent: f64) {
        let _ = (node, index, extent);
    }

    /// Clears transient per-index state before a node re-enters a pool.
    fn reset_row(&mut self, node: &mut Self::Node) {
        let _ = node;
    }

    /// Positions the window container: `first_pos` pixels of leading slack,
    /// `occupied` pixels from there to the end of the dataset.
    fn set_offset(&mut self, first_pos: f64, occupied: f64) {
        let _ = (first_pos, occupied);
    }
}

/// How a grid delegate answered a cell update.
pub enum CellUpdate<C> {
    /// The existing cell was retargeted in place.
    InPlace,
    /// The delegate built a replacement cell; the controller swaps it in
    /// and recycles the old one to its column pool.
    Replaced(C),
}

/// Content provider for grid cells and headers. Cells are column-specific
/// in shape, so the controller pools them per column and never reuses one
/// across columns.
pub trait GridDelegate {
    type Cell;
    type Header;

    fn create_cell(&mut self, row: usize, col: usize) -> Self::Cell;

    /// Retargets `cell` (same column, different row). Returns a replacement
    /// when the delegate chose to rebuild instead of editing in place.
    fn update_cell(&mut self, cell: &mut Self::Cell, row: usize, col: usize)
    -> CellUpdate<Self::Cell>;

    fn create_header(&mut self, col: usize) -> Self::Header;

    fn update_header(&mut self, header: &mut Self::Header, col: usize) {
        let _ = (header, col);
    }

    /// Vertical window container offset; see [`RowDelegate::set_offset`].
    fn set_row_offset(&mut self, first_pos: f64, occupied: f64) {
        let _ = (first_pos, occupied);
    }

    /// Horizontal equivalent, driven by the column window.
    fn set_col_offset(&mut self, first_pos: f64) {
        let _ = first_pos;
    }
}

/// Content provider for quad-partitioned grids. Leaves hold at most a 4x4
/// cell matrix; the partition diffs leaf contents by count, so cells must
/// tolerate retargeting to any (row, col) in range.
pub trait QuadDelegate {
    type Cell;

    fn create_cell(&mut self, row: usize, col: usize) -> Self::Cell;

    fn update_cell(&mut self, cell: &mut Self::Cell, row: usize, col: usize);
}
