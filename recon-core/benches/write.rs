//! Benchmarks for Recon writing.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use recon_core::{recon, OutputBuffer, ReconWriter, StringOutput};

const SAMPLE: &str = include_str!("data/sample.recon");

fn bench_write_sample(c: &mut Criterion) {
    let value = recon::parse(SAMPLE).expect("sample.recon parses");
    let size = recon::size_of(&value);

    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("to_string", |b| b.iter(|| recon::to_string(black_box(&value))));

    group.bench_function("size_of", |b| b.iter(|| recon::size_of(black_box(&value))));

    group.bench_function("string_output", |b| {
        b.iter(|| {
            let mut output = StringOutput::with_capacity(size);
            let _ = ReconWriter.write_block(black_box(&value), &mut output);
            output.bind()
        })
    });

    for capacity in [16usize, 256] {
        group.bench_function(format!("buffer_{}", capacity), |b| {
            b.iter(|| {
                let mut output = OutputBuffer::new(capacity);
                let mut writer = ReconWriter.write_block(black_box(&value), &mut output);
                let mut total = 0;
                while writer.is_cont() {
                    total += output.drain().len();
                    writer = writer.pull(&mut output);
                }
                total + output.bind().len()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write_sample);
criterion_main!(benches);
