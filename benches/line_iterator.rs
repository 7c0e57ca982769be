use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::IVec2;

use stereogrid::iterators::LineSampler;

fn bench_line_sampler(c: &mut Criterion) {
    let lines = build_lines();

    c.bench_function("line_sampler_iterate", |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for line in &lines {
                for step in line.iter(8) {
                    sum += step.position.x as i64 + step.position.y as i64;
                }
            }
            black_box(sum);
        });
    });

    c.bench_function("line_sampler_random_access", |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for line in &lines {
                for step in (0..=line.steps()).rev() {
                    sum += line.sample(step).x as i64;
                }
            }
            black_box(sum);
        });
    });
}

fn build_lines() -> Vec<LineSampler> {
    (0..360)
        .step_by(3)
        .map(|deg| {
            let heading = (deg as f32).to_radians();
            let offset = IVec2::new(
                (2500.0 * heading.sin()) as i32,
                (2500.0 * heading.cos()) as i32,
            );
            LineSampler::through_cells(IVec2::new(13, -7), offset, offset / 40)
        })
        .collect()
}

criterion_group!(benches, bench_line_sampler);
criterion_main!(benches);
