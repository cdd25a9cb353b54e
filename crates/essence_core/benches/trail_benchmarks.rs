use criterion::{black_box, criterion_group, criterion_main, Criterion};
use essence_core::composite::{NullCompositor, SoftwareCompositor};
use essence_core::config::TrailConfig;
use essence_core::sensing;
use essence_core::trail::TrailField;

fn seeded_field(width: f32, height: f32) -> TrailField {
    let mut field = TrailField::with_viewport(TrailConfig::default(), width, height);
    for i in 0..2000u32 {
        let x = (i * 37 % width as u32) as f32;
        let y = (i * 91 % height as u32) as f32;
        field.deposit(x, y, 0.4, i % 6 + 1, i);
    }
    field.capture_snapshot();
    field
}

fn bench_step_720p(c: &mut Criterion) {
    let mut field = seeded_field(1280.0, 720.0);
    c.bench_function("trail_step_1280x720", |b| {
        b.iter(|| {
            field.step(black_box(1.0 / 60.0));
        })
    });
}

fn bench_step_fine_grid(c: &mut Criterion) {
    let config = TrailConfig {
        cell_size: 2.0,
        ..Default::default()
    };
    let mut field = TrailField::with_viewport(config, 1280.0, 720.0);
    field.deposit(640.0, 360.0, 1.0, 1, 0);
    c.bench_function("trail_step_cell_2", |b| {
        b.iter(|| {
            field.step(black_box(1.0 / 60.0));
        })
    });
}

fn bench_capture_snapshot(c: &mut Criterion) {
    let mut field = seeded_field(1280.0, 720.0);
    c.bench_function("trail_capture_snapshot", |b| {
        b.iter(|| {
            field.capture_snapshot();
            black_box(field.cell_count())
        })
    });
}

fn bench_follow_vector(c: &mut Criterion) {
    let field = seeded_field(1280.0, 720.0);
    c.bench_function("trail_follow_vector", |b| {
        b.iter(|| black_box(sensing::follow_vector(&field, 640.0, 360.0, 1, 30.0, 8, 3000)))
    });
}

fn bench_draw_raster_only(c: &mut Criterion) {
    let mut field = seeded_field(1280.0, 720.0);
    let mut compositor = NullCompositor::default();
    c.bench_function("trail_draw_raster", |b| {
        b.iter(|| {
            field.draw(&mut compositor);
        })
    });
}

fn bench_draw_software(c: &mut Criterion) {
    let mut field = seeded_field(640.0, 360.0);
    let mut compositor = SoftwareCompositor::new(640, 360);
    c.bench_function("trail_draw_software_640x360", |b| {
        b.iter(|| {
            compositor.clear();
            field.draw(&mut compositor);
            black_box(compositor.frames())
        })
    });
}

criterion_group!(
    benches,
    bench_step_720p,
    bench_step_fine_grid,
    bench_capture_snapshot,
    bench_follow_vector,
    bench_draw_raster_only,
    bench_draw_software
);
criterion_main!(benches);
