use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use direct_writer::{DirectWriter, open_direct};
use memmap2::MmapMut;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::tempdir_in;

/// 测试参数
const TOTAL_SIZE: usize = 1024 * 1024 * 64; // 64MB
const BUF_SIZE: usize = 1024 * 1024; // 1MB
const CHUNK_SIZES: &[usize] = &[4 * 1024, 100 * 1024, 4 * 1024 * 1024];

/// 页对齐的源数据
fn source_data() -> MmapMut {
    let mut mmap = MmapMut::map_anon(TOTAL_SIZE + 1).unwrap();
    for (i, b) in mmap.iter_mut().enumerate() {
        *b = i as u8;
    }
    mmap
}

/// 使用 DirectWriter 写入（O_DIRECT）
fn bench_direct_writer(path: &Path, source: &[u8], chunk: usize) {
    let file = open_direct(path).unwrap();
    let mut writer = DirectWriter::with_capacity(BUF_SIZE, file).unwrap();

    for piece in source.chunks(chunk) {
        writer.try_write(piece).unwrap();
    }
    writer.close().unwrap();
}

/// 使用 std::io::BufWriter 写入（经过页缓存）
fn bench_buf_writer(path: &Path, source: &[u8], chunk: usize) {
    let file = File::create(path).unwrap();
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);

    for piece in source.chunks(chunk) {
        writer.write_all(piece).unwrap();
    }
    writer.flush().unwrap();
    writer.get_ref().sync_data().unwrap();
}

fn write_throughput_benchmark(c: &mut Criterion) {
    let dir = tempdir_in(std::env::current_dir().unwrap()).unwrap();
    let direct_path = dir.path().join("direct.bin");
    let buffered_path = dir.path().join("buffered.bin");

    // 文件系统不支持 O_DIRECT 时只测 BufWriter
    let direct_supported = open_direct(&direct_path).is_ok();
    if !direct_supported {
        eprintln!("O_DIRECT unsupported here, benchmarking BufWriter only");
    }

    let data = source_data();
    let aligned = &data[..TOTAL_SIZE];
    let unaligned = &data[1..];

    let mut group = c.benchmark_group("write_throughput");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(20));

    for &chunk in CHUNK_SIZES {
        let label = format!("{}MB_{}KB_chunks", TOTAL_SIZE / (1024 * 1024), chunk / 1024);

        if direct_supported {
            group.bench_function(BenchmarkId::new("direct_writer_aligned", &label), |b| {
                b.iter(|| bench_direct_writer(&direct_path, aligned, chunk));
            });
            group.bench_function(BenchmarkId::new("direct_writer_unaligned", &label), |b| {
                b.iter(|| bench_direct_writer(&direct_path, unaligned, chunk));
            });
        }

        group.bench_function(BenchmarkId::new("buf_writer", &label), |b| {
            b.iter(|| bench_buf_writer(&buffered_path, aligned, chunk));
        });
    }

    group.finish();
}

criterion_group!(benches, write_throughput_benchmark);
criterion_main!(benches);
