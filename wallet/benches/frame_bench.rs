// Frame codec benchmarks for the airgap transport.
//
// Covers payload encoding into QR frames, frame text rendering/parsing,
// and full reassembly at various payload sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lumen_wallet::airgap::frame::{encode_payload, DecodeOutcome, QrFrame, ReassemblyBuffer};
use lumen_wallet::config;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/encode");

    for size in [256usize, 1_024, 10_240, 65_536] {
        let data = payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| encode_payload(data, config::DEFAULT_FRAME_CAPACITY).unwrap());
        });
    }

    group.finish();
}

fn bench_frame_text_roundtrip(c: &mut Criterion) {
    let set = encode_payload(&payload(1_024), config::DEFAULT_FRAME_CAPACITY).unwrap();
    let frame = set.frames[0].clone();
    let text = frame.to_text();

    c.bench_function("frame/to_text", |b| {
        b.iter(|| frame.to_text());
    });
    c.bench_function("frame/from_text", |b| {
        b.iter(|| QrFrame::from_text(&text).unwrap());
    });
}

fn bench_reassemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/reassemble");

    for size in [1_024usize, 10_240, 65_536] {
        let data = payload(size);
        let set = encode_payload(&data, config::DEFAULT_FRAME_CAPACITY).unwrap();
        // Worst-case arrival: last frame first, so completion lands on the
        // final accept.
        let frames: Vec<_> = set.frames.iter().rev().cloned().collect();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frames, |b, frames| {
            b.iter(|| {
                let mut buf = ReassemblyBuffer::new();
                let mut out = None;
                for frame in frames {
                    if let DecodeOutcome::Complete(p) = buf.accept(frame) {
                        out = Some(p);
                    }
                }
                out.unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_frame_text_roundtrip, bench_reassemble);
criterion_main!(benches);
