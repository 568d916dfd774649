use bitcursor::{BitReader, StreamReader, MAX_UNALIGNED_PEEK_BITS};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::{Read, Write};

static DATA: [u8; 0x10_000] = [0; 0x10_000];

const ITER: u64 = 1000;

fn bitting(c: &mut Criterion) {
    let parameters: Vec<u32> = (1..65).collect();

    let mut group = c.benchmark_group("bit-reading");
    for i in parameters {
        group.throughput(Throughput::Bytes((i as u64 * ITER) / 8));

        group.bench_with_input(BenchmarkId::new("read", i), &i, |b, param| {
            b.iter(|| {
                let mut bits = StreamReader::new(&DATA[..]);
                if *param <= MAX_UNALIGNED_PEEK_BITS {
                    for _ in 0..ITER {
                        black_box(bits.read_u64(*param).unwrap());
                    }
                } else {
                    for _ in 0..ITER {
                        let hi_bits = *param - MAX_UNALIGNED_PEEK_BITS;
                        let hi = bits.read_u64(hi_bits).unwrap();
                        let lo = bits.read_u64(MAX_UNALIGNED_PEEK_BITS).unwrap();
                        black_box((hi << MAX_UNALIGNED_PEEK_BITS) + lo);
                    }
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("peek-skip", i), &i, |b, param| {
            b.iter(|| {
                let mut bits = StreamReader::new(&DATA[..]);
                for _ in 0..ITER {
                    // wide peeks need a byte aligned cursor
                    if *param > MAX_UNALIGNED_PEEK_BITS {
                        bits.align().unwrap();
                    }
                    black_box(bits.peek_u64(*param).unwrap());
                    bits.skip(u64::from(*param)).unwrap();
                }
            })
        });
    }

    group.finish();
}

fn real_world1(c: &mut Criterion) {
    // A packed quaternion: bit reads of 2 + 18 + 18 + 18 = 56
    let mut group = c.benchmark_group("real-world-1");

    group.throughput(Throughput::Bytes((56 as u64 * ITER) / 8));

    group.bench_function("stream", |b| {
        b.iter(|| {
            let mut bits = StreamReader::new(&DATA[..]);
            for _ in 0..ITER {
                black_box(bits.read_u8(2).unwrap());
                black_box(bits.read_u32(18).unwrap());
                black_box(bits.read_u32(18).unwrap());
                black_box(bits.read_u32(18).unwrap());
            }
        })
    });

    group.bench_function("buffered", |b| {
        b.iter(|| {
            let (mut writer, mut reader) = bitcursor::buffered();
            writer.write_all(&DATA[..(56 * ITER as usize) / 8]).unwrap();
            for _ in 0..ITER {
                black_box(reader.read_u8(2).unwrap());
                black_box(reader.read_u32(18).unwrap());
                black_box(reader.read_u32(18).unwrap());
                black_box(reader.read_u32(18).unwrap());
            }
        })
    });

    group.finish();
}

fn read_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_bytes");

    group.bench_function("aligned", |b| {
        b.iter(|| {
            let mut buf = [0u8; 7];
            let mut bits = StreamReader::new(&DATA[..]);
            for _ in 0..ITER {
                black_box(bits.read(&mut buf).unwrap());
            }
        })
    });

    group.bench_function("unaligned", |b| {
        b.iter(|| {
            let mut buf = [0u8; 7];
            let mut bits = StreamReader::new(&DATA[..]);
            for _ in 0..ITER {
                bits.read_bit().unwrap();
                black_box(bits.read(&mut buf).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bitting, read_bytes, real_world1);

criterion_main!(benches);
