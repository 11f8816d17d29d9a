/* Persistence-driven synthesis of branching point trees.
 * Copyright (C) 2026  tmdtree contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tmdtree::*;

const N_LOOKUPS: usize = 40;

fn random_bars(rng: &mut SmallRng, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|_| {
            let bif = rng.random_range(0.0..500.0);
            Bar::new(bif + rng.random_range(1.0..500.0), bif, [f64::NAN; 4])
        })
        .collect()
}

pub fn barcode_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("barcode queries");

    for (&n, samples_num) in [16usize, 256, 4096].iter().zip([100, 40, 10]) {
        group.significance_level(0.1).sample_size(samples_num);
        let mut rng = SmallRng::seed_from_u64(42);
        let bars = random_bars(&mut rng, n);
        let barcode = Barcode::new(&bars).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut rng = SmallRng::seed_from_u64(42);
            b.iter(|| {
                for _ in 0..N_LOOKUPS {
                    let above = rng.random_range(0.0..500.0);
                    black_box(barcode.min_bif(above, above + 200.0));
                    black_box(barcode.min_term(above, above + 200.0));
                }
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("apical point distance");
    for (&n, samples_num) in [16usize, 256].iter().zip([100, 40]) {
        group.significance_level(0.1).sample_size(samples_num);
        let mut rng = SmallRng::seed_from_u64(42);
        let bars = random_bars(&mut rng, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(apical_point_distance(&bars)));
        });
    }
    group.finish();
}

pub fn point_cloud_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("ball query");

    for (&n, samples_num) in [1000usize, 10000, 100000].iter().zip([100, 40, 10]) {
        group.significance_level(0.1).sample_size(samples_num);
        let mut rng = SmallRng::seed_from_u64(42);
        let points: Vec<Point> = (0..n)
            .map(|_| std::array::from_fn(|_| rng.random_range(-100.0..100.0)))
            .collect();
        let cloud = PointCloud::new(points);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut rng = SmallRng::seed_from_u64(42);
            b.iter(|| {
                for _ in 0..N_LOOKUPS {
                    let center = std::array::from_fn(|_| rng.random_range(-100.0..100.0));
                    black_box(cloud.ball_query(center, 10.0));
                    black_box(cloud.nearest_neighbor(center, 10.0));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, barcode_queries, point_cloud_queries);
criterion_main!(benches);
