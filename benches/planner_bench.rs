use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagesnap::{plan, FitMode, PageFormat, PaginationPlanner, SourceImage};

fn bench_plan_single_page(c: &mut Criterion) {
    let src = SourceImage::new(800, 600).unwrap();
    let page = PageFormat::new(210.0, 297.0).unwrap();
    c.bench_function("plan_single_page", |b| {
        b.iter(|| plan(black_box(&src), black_box(&page)).unwrap())
    });
}

fn bench_plan_tall_report(c: &mut Criterion) {
    // A long dashboard: roughly 70 A4 pages at full width.
    let src = SourceImage::new(1440, 140_000).unwrap();
    let page = PageFormat::new(210.0, 297.0).unwrap();
    let planner = PaginationPlanner::new(FitMode::Tile);
    c.bench_function("plan_tall_report", |b| {
        b.iter(|| planner.plan(black_box(&src), black_box(&page)).unwrap())
    });
}

criterion_group!(benches, bench_plan_single_page, bench_plan_tall_report);
criterion_main!(benches);
