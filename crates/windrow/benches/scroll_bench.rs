//! Benchmarks for the windowing controllers
//!
//! Run with: cargo bench -p windrow

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use windrow::{
    AxisContext, CellUpdate, GridDelegate, GridWindow, QuadDelegate, QuadPartition, RowContent,
    RowDelegate, RowWindow, ScrollDirection,
};

struct BenchRows;

impl RowDelegate for BenchRows {
    type Node = usize;

    fn allocate(&mut self, _uid: u64) -> usize {
        usize::MAX
    }

    fn create_row(&mut self, node: &mut usize, index: usize) -> RowContent {
        *node = index;
        RowContent::Ready
    }

    fn update_row(&mut self, node: &mut usize, index: usize) -> RowContent {
        *node = index;
        RowContent::Ready
    }
}

struct BenchGrid;

impl GridDelegate for BenchGrid {
    type Cell = (usize, usize);
    type Header = usize;

    fn create_cell(&mut self, row: usize, col: usize) -> (usize, usize) {
        (row, col)
    }

    fn update_cell(
        &mut self,
        cell: &mut (usize, usize),
        row: usize,
        col: usize,
    ) -> CellUpdate<(usize, usize)> {
        *cell = (row, col);
        CellUpdate::InPlace
    }

    fn create_header(&mut self, col: usize) -> usize {
        col
    }
}

struct BenchQuad;

impl QuadDelegate for BenchQuad {
    type Cell = (usize, usize);

    fn create_cell(&mut self, row: usize, col: usize) -> (usize, usize) {
        (row, col)
    }

    fn update_cell(&mut self, cell: &mut (usize, usize), row: usize, col: usize) {
        *cell = (row, col);
    }
}

// ============================================================================
// Row window scrolling
// ============================================================================

fn bench_row_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll/rows");

    for count in [10_000usize, 1_000_000] {
        let ctx = AxisContext::random(count, 20.0, 2.0, 200.0, 0.05, 42);
        let total = ctx.total_extent();

        // small forward steps; the partial-shift fast path
        group.bench_with_input(BenchmarkId::new("step", count), &(), |b, _| {
            let mut window = RowWindow::new(BenchRows, ctx.clone());
            window.initialize(0.0, 600.0);
            let mut offset = 0.0;
            b.iter(|| {
                offset = (offset + 40.0) % (total - 600.0);
                black_box(window.on_scroll(offset, 600.0, ScrollDirection::Forward))
            })
        });

        // alternating jumps across the dataset; always a rebuild
        group.bench_with_input(BenchmarkId::new("jump", count), &(), |b, _| {
            let mut window = RowWindow::new(BenchRows, ctx.clone());
            window.initialize(0.0, 600.0);
            let mut top = true;
            b.iter(|| {
                top = !top;
                let offset = if top { 0.0 } else { total - 600.0 };
                black_box(window.on_scroll(offset, 600.0, ScrollDirection::Forward))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Grid scrolling, both axes
// ============================================================================

fn bench_grid_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll/grid");

    let row_ctx = AxisContext::uniform(100_000, 20.0);
    let col_ctx = AxisContext::uniform(1_000, 100.0);
    let row_total = row_ctx.total_extent();
    let col_total = col_ctx.total_extent();

    group.bench_function("vertical_step", |b| {
        let mut grid = GridWindow::new(BenchGrid, row_ctx.clone(), col_ctx.clone());
        grid.initialize(0.0, 600.0, 0.0, 800.0);
        let mut offset = 0.0;
        b.iter(|| {
            offset = (offset + 40.0) % (row_total - 600.0);
            black_box(grid.on_scroll_vertical(offset, 600.0, ScrollDirection::Forward))
        })
    });

    group.bench_function("horizontal_step", |b| {
        let mut grid = GridWindow::new(BenchGrid, row_ctx.clone(), col_ctx.clone());
        grid.initialize(0.0, 600.0, 0.0, 800.0);
        let mut offset = 0.0;
        b.iter(|| {
            offset = (offset + 120.0) % (col_total - 800.0);
            black_box(grid.on_scroll_horizontal(offset, 800.0, ScrollDirection::Forward))
        })
    });

    group.finish();
}

// ============================================================================
// Quad partition build and render
// ============================================================================

fn bench_quad(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll/quad");

    for count in [10_000usize, 100_000] {
        let row_ctx = AxisContext::random(count, 20.0, 2.0, 200.0, 0.02, 42);
        let col_ctx = AxisContext::uniform(1_000, 100.0);

        group.bench_with_input(BenchmarkId::new("build", count), &(), |b, _| {
            b.iter(|| {
                black_box(QuadPartition::new(
                    BenchQuad,
                    row_ctx.clone(),
                    col_ctx.clone(),
                ))
            })
        });

        group.bench_with_input(BenchmarkId::new("scroll", count), &(), |b, _| {
            let mut quad = QuadPartition::new(BenchQuad, row_ctx.clone(), col_ctx.clone());
            quad.initialize(0.0, 600.0, 0.0, 800.0);
            let total = row_ctx.total_extent();
            let mut offset = 0.0;
            b.iter(|| {
                offset = (offset + 40.0) % (total - 600.0);
                quad.on_scroll(offset, 600.0, 0.0, 800.0);
                black_box(offset)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_row_scroll, bench_grid_scroll, bench_quad);
criterion_main!(benches);
