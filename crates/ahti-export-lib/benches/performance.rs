//! Performance benchmarks for ahti-export-lib
//!
//! Run with: cargo bench --package ahti-export-lib
//!
//! Builds collections from in-memory fixture rows, so only mapping, CRS checks, merging and
//! serialization are measured.

use ahti_export_lib::{Exporter, MemorySource, Relation, SchemaVariant, StoredRow};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geojson::{Geometry, Value};

/// Generate a wavy river line with the specified number of vertices
fn generate_line(num_points: usize, base_lon: f64, base_lat: f64) -> Geometry {
    let coords = (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64;
            let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
            let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
            vec![lon, lat]
        })
        .collect();
    Geometry::new(Value::LineString(coords))
}

/// Generate a v18 store with `num_segments` paddling segments and a lake per ten segments
fn generate_v18_source(num_segments: usize, points_per_segment: usize) -> MemorySource {
    let mut source = MemorySource::new();
    for i in 0..num_segments {
        // Rows of ten, wrapping before the latitude leaves the valid range
        let lon = 24.0 + (i % 10) as f64 * 0.1;
        let lat = 60.5 + ((i / 10) % 250) as f64 * 0.1;
        source.push(
            Relation::PaddlingSegments,
            StoredRow::new(Some(generate_line(points_per_segment, lon, lat)))
                .with_column("type", "river")
                .with_column("name", format!("Segment {i}"))
                .with_column("environment", "river_official")
                .with_column("fun_score", (i % 10) as i64)
                .with_column("rapid_class", "II"),
        );
        if i % 10 == 0 {
            source.push(
                Relation::CandidateObjects,
                StoredRow::new(Some(generate_line(points_per_segment, lon, lat)))
                    .with_column("type", "lake")
                    .with_column("is_virtual", false)
                    .with_column("name", format!("Lake {i}")),
            );
        }
    }
    source
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_v18");
    for &num_segments in &[100usize, 1_000, 10_000] {
        let source = generate_v18_source(num_segments, 50);
        group.throughput(Throughput::Elements(num_segments as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_segments),
            &source,
            |b, source| {
                b.iter(|| {
                    Exporter::new(source.clone(), SchemaVariant::V18Unified)
                        .build()
                        .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let exported = Exporter::new(generate_v18_source(1_000, 50), SchemaVariant::V18Unified)
        .build()
        .unwrap();
    c.bench_function("serialize_v18_1000", |b| {
        b.iter(|| exported.to_json_string().unwrap())
    });
}

criterion_group!(benches, bench_build, bench_serialize);
criterion_main!(benches);
