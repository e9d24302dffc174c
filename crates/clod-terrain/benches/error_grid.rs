use clod_heightfield::{NoiseHeightField, NoiseParams};
use clod_terrain::*;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec3;

fn noise_surface(scale: f32) -> Surface<NoiseHeightField> {
    Surface::new(NoiseHeightField::new(NoiseParams::default()), scale, 50.0)
}

fn bench_build_error_grid_256(c: &mut Criterion) {
    let surface = noise_surface(256.0);
    c.bench_function("error_grid_build_256", |bencher| {
        bencher.iter(|| {
            black_box(ErrorGrid::build(
                |x, z| surface.height_at(x, z),
                black_box(256),
                2.0,
            ))
        })
    });
}

fn bench_build_error_grid_flat_1024(c: &mut Criterion) {
    c.bench_function("error_grid_build_flat_1024", |bencher| {
        bencher.iter(|| black_box(ErrorGrid::build(|_, _| 0.5, black_box(1024), 2.0)))
    });
}

fn bench_terrain_update(c: &mut Criterion) {
    let params = TerrainParams::default();
    let mut terrain = Terrain::new(
        params,
        NoiseHeightField::new(NoiseParams::default()),
        &mut NullSink,
    )
    .unwrap();
    let mut angle = 0.0_f32;
    c.bench_function("terrain_update_orbit", |bencher| {
        bencher.iter(|| {
            angle += 0.01;
            let eye = Vec3::new(angle.cos() * 150.0, 80.0, angle.sin() * 150.0);
            let view = FrameView::looking_at(
                eye,
                Vec3::ZERO,
                Vec3::Y,
                60f32.to_radians(),
                16.0 / 9.0,
                0.1,
                2000.0,
            );
            black_box(terrain.update(Some(&view), &mut NullSink).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_build_error_grid_256,
    bench_build_error_grid_flat_1024,
    bench_terrain_update,
);

criterion_main!(benches);
