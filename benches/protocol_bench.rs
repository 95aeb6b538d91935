use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pulselink_core::checksum;
use pulselink_core::transmitter::stuff;
use pulselink_core::Frame;

fn benchmark_checksum(c: &mut Criterion) {
    let data: Vec<u8> = (0..1500).map(|i| (i % 251) as u8).collect();

    c.bench_function("checksum_1500_bytes", |b| {
        b.iter(|| checksum::compute(black_box(&data)));
    });
}

fn benchmark_frame_encode(c: &mut Criterion) {
    let payload: Vec<u8> = (0..256).map(|i| i as u8).collect();
    let mut frame = Frame::data(payload, 2).unwrap();
    frame.source = 1;

    c.bench_function("encode_256_byte_frame", |b| {
        b.iter(|| black_box(&frame).encode());
    });
}

fn benchmark_stuffing(c: &mut Criterion) {
    // Every fourth byte needs escaping - a hostile body for the stuffer.
    let body: Vec<u8> = (0..1024)
        .map(|i| if i % 4 == 0 { 0x7E } else { (i % 256) as u8 })
        .collect();

    c.bench_function("stuff_1024_bytes", |b| {
        b.iter(|| stuff(black_box(&body)));
    });
}

criterion_group!(
    benches,
    benchmark_checksum,
    benchmark_frame_encode,
    benchmark_stuffing
);
criterion_main!(benches);
