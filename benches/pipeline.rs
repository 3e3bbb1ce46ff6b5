//! Pipeline throughput benchmarks.
//!
//! Run with: `cargo bench --features synthetic --bench pipeline`
//!
//! Fleets come from the synthetic generator, so every run sees the same
//! reports for a given size.

use aistrack::synthetic::SyntheticFleet;
use aistrack::{cluster_trace, segment_clusters, TrackConfig, TrackPipeline, VesselTrace};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn fleet(vessel_count: usize) -> SyntheticFleet {
    SyntheticFleet {
        vessel_count,
        legs_per_vessel: 4,
        ..SyntheticFleet::default()
    }
}

fn bench_build_tracks_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_tracks");
    group.sample_size(20);
    let pipeline = TrackPipeline::new(TrackConfig::default()).unwrap();

    for vessels in [10, 100, 500] {
        let dataset = fleet(vessels).generate();
        group.throughput(Throughput::Elements(dataset.metadata.total_points as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(vessels),
            &dataset.points,
            |b, points| {
                b.iter(|| {
                    let result = pipeline.build_tracks(black_box(points.clone()));
                    black_box(result.tracks.len())
                })
            },
        );
    }

    group.finish();
}

fn bench_single_vessel_stages(c: &mut Criterion) {
    let dataset = SyntheticFleet {
        vessel_count: 1,
        legs_per_vessel: 50,
        ..SyntheticFleet::default()
    }
    .generate();
    let trace = VesselTrace::new("366900000", dataset.points);
    let config = TrackConfig::default();

    c.bench_function("cluster_trace", |b| {
        b.iter(|| cluster_trace(black_box(&trace.points), config.cluster_gap_threshold_m))
    });

    let clusters = cluster_trace(&trace.points, config.cluster_gap_threshold_m);
    c.bench_function("segment_clusters", |b| {
        b.iter(|| segment_clusters(black_box(&clusters), config.segment_gap_threshold_m))
    });
}

criterion_group!(
    benches,
    bench_build_tracks_scaling,
    bench_single_vessel_stages
);
criterion_main!(benches);
