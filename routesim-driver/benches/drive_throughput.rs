//! Decode and drive throughput over a long synthetic route

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use routesim_core::{GeoPoint, SimulationOptions};
use routesim_driver::geo::destination;
use routesim_driver::{encode, Driver, PolylineDecoder};

/// A winding route of `count` points, 20 m apart
fn winding_route(count: usize) -> Vec<GeoPoint> {
    let mut points = vec![GeoPoint::new(-73.9857, 40.7484)];
    let mut heading: f64 = 0.0;
    for i in 1..count {
        heading = (heading + if i % 40 < 20 { 3.0 } else { -3.0 }).rem_euclid(360.0);
        let last = points[points.len() - 1];
        points.push(destination(last, 20.0, heading));
    }
    points
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for count in [1_000usize, 10_000] {
        let encoded = encode(&winding_route(count), 6);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &encoded, |b, encoded| {
            b.iter(|| {
                PolylineDecoder::new(black_box(encoded.as_str()), 6)
                    .decode(f64::INFINITY)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_drive(c: &mut Criterion) {
    let options = SimulationOptions::builder().frequency(10.0).build().unwrap();
    let mut group = c.benchmark_group("drive_coordinates");
    for count in [1_000usize, 10_000] {
        let points = winding_route(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, points| {
            b.iter(|| {
                let mut driver = Driver::new();
                driver.drive_coordinates(&options, black_box(points)).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_drive);
criterion_main!(benches);
