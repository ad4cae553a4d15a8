//! Benchmarks for channel decoding over a synthetic capture
//!
//! Tests decoding performance for:
//! - Single-tick random access (scalar and CarIdx-style arrays)
//! - Whole-capture column scans, untyped and typed
//! - Channel directory construction on first lookup
//!
//! Platform: Cross-platform (captures are generated in memory, CI-safe)

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pitwall_ibt::IbtReader;
use pitwall_ibt::test_utils::{CaptureBuilder, ChannelSpec};
use pitwall_ibt::types::VariableType;
use std::hint::black_box;

const TICKS: usize = 3_600;

/// One minute at 60 Hz with a realistic mix of scalar and array channels.
fn session_capture(ticks: usize) -> Vec<u8> {
    let mut builder = CaptureBuilder::new()
        .channel(ChannelSpec::scalar("SessionTime", VariableType::Float64))
        .channel(ChannelSpec::scalar("Speed", VariableType::Float32))
        .channel(ChannelSpec::scalar("RPM", VariableType::Float32))
        .channel(ChannelSpec::scalar("Gear", VariableType::Int32))
        .channel(ChannelSpec::scalar("SessionFlags", VariableType::BitField))
        .channel(ChannelSpec::vector("CarIdxLapDistPct", VariableType::Float32, 64))
        .channel(ChannelSpec::vector("CarIdxOnPitRoad", VariableType::Bool, 64));
    for i in 0..200 {
        let name = format!("Filler{i}");
        builder = builder.channel(ChannelSpec::scalar(&name, VariableType::Float32));
    }
    builder.record_count(ticks).build()
}

fn open_reader() -> IbtReader {
    let mut reader = IbtReader::from_bytes(session_capture(TICKS)).expect("valid capture");
    reader.channel_names().expect("directory builds");
    reader
}

fn bench_random_access(c: &mut Criterion) {
    let mut reader = open_reader();
    let mut group = c.benchmark_group("random_access");

    group.bench_function("scalar_speed", |b| {
        b.iter(|| black_box(reader.read_one(black_box(TICKS / 2), "Speed").unwrap()))
    });

    group.bench_function("array_lap_dist_pct", |b| {
        b.iter(|| black_box(reader.read_one(black_box(TICKS / 2), "CarIdxLapDistPct").unwrap()))
    });

    group.finish();
}

fn bench_column_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_scan");

    for ticks in [600usize, TICKS] {
        let mut reader = IbtReader::from_bytes(session_capture(ticks)).expect("valid capture");

        group.bench_with_input(BenchmarkId::new("read_all_speed", ticks), &ticks, |b, _| {
            b.iter(|| black_box(reader.read_all("Speed").unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("read_column_f32_speed", ticks), &ticks, |b, _| {
            b.iter(|| black_box(reader.read_column::<f32>("Speed").unwrap()))
        });
    }

    group.finish();
}

fn bench_directory_build(c: &mut Criterion) {
    let data = session_capture(1);

    c.bench_function("directory_build_first_lookup", |b| {
        b.iter(|| {
            let mut reader = IbtReader::from_bytes(data.clone()).unwrap();
            black_box(reader.channel("RPM").unwrap().offset)
        })
    });
}

criterion_group!(benches, bench_random_access, bench_column_scan, bench_directory_build);
criterion_main!(benches);
