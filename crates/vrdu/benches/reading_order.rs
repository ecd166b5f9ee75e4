use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use vrdu::layout::{PageLayout, SpatialGraph};
use vrdu::{GraphConfig, GridConfig, LocatorConfig, WordBox, reconstruct_grid};

/// Dense form page: `rows` lines of `columns` words, jittered a little so
/// rows are not perfectly flat, handed over in reverse arrival order.
fn create_page(rows: usize, columns: usize) -> Vec<WordBox> {
    let mut words = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for column in 0..columns {
            let jitter = ((row * 7 + column * 3) % 5) as f64 * 0.4;
            words.push(WordBox::new(
                format!("w{}x{}", row, column),
                0.9,
                column as f64 * 70.0,
                row as f64 * 18.0 + jitter,
                55.0,
                12.0,
            ));
        }
    }
    words.reverse();
    words
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_graph_build");
    let config = GraphConfig::default();

    for words_per_page in [100, 400, 1_000].iter() {
        let page = create_page(words_per_page / 10, 10);
        group.throughput(Throughput::Elements(*words_per_page as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words_per_page), &page, |b, page| {
            b.iter(|| SpatialGraph::build(black_box(page), &config));
        });
    }

    group.finish();
}

fn bench_page_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_layout");
    let config = GraphConfig::default();

    for words_per_page in [100, 400, 1_000].iter() {
        let page = create_page(words_per_page / 10, 10);
        group.throughput(Throughput::Elements(*words_per_page as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words_per_page), &page, |b, page| {
            b.iter(|| PageLayout::analyze(black_box(page.clone()), &config).reading_text());
        });
    }

    group.finish();
}

fn bench_field_location(c: &mut Criterion) {
    let mut page = create_page(40, 10);
    page.push(WordBox::new("Total", 0.95, 0.0, 800.0, 40.0, 12.0));
    page.push(WordBox::new("$1,204.50", 0.92, 90.0, 800.0, 70.0, 12.0));

    let layout = PageLayout::analyze(page, &GraphConfig::default());
    let locator = LocatorConfig::default();

    c.bench_function("locate_field_400_words", |b| {
        b.iter(|| vrdu::fields::locate_field(black_box(&layout), "Total", &locator));
    });
}

fn bench_grid(c: &mut Criterion) {
    let page = create_page(30, 6);
    let graph = GraphConfig::default();
    let grid = GridConfig::default();

    c.bench_function("reconstruct_grid_30x6", |b| {
        b.iter(|| reconstruct_grid(black_box(&page), &graph, &grid));
    });
}

criterion_group!(
    benches,
    bench_graph_build,
    bench_page_layout,
    bench_field_location,
    bench_grid
);
criterion_main!(benches);
