//! 真实 O_DIRECT 文件测试
//!
//! 如果临时目录所在的文件系统不支持 O_DIRECT（例如部分 tmpfs / overlayfs），相关测试会跳过。

#![cfg(target_os = "linux")]

use direct_writer::{AlignedBuffer, BLOCK_SIZE, DirectIoControl, DirectWriter, Error, FdControl, open_direct};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir_in};

const BUF_SIZES: &[usize] = &[0, 16, 23, 32, 46, 64, 93, 128, 1024, 4096, 4197, 12384, 16384, 32754];

const WRITE_SIZES: &[usize] = &[
    8192, 16384, 16, 23, 32, 0, 46, 8192, 64, 93, 128, 1024, 4096, 4197, 12384, 16384, 32754,
];

fn test_dir() -> TempDir {
    tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap()
}

/// 探测目录是否支持 512 字节粒度的 O_DIRECT 写入
fn supports_direct_io(dir: &Path) -> bool {
    let path = dir.join("probe");
    let mut file = match open_direct(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("skipping: O_DIRECT open failed: {}", err);
            return false;
        }
    };

    let block = AlignedBuffer::allocate(BLOCK_SIZE).unwrap();
    let ok = match file.write(block.as_slice()) {
        Ok(n) => n == BLOCK_SIZE,
        Err(err) => {
            eprintln!("skipping: {}-byte O_DIRECT write failed: {}", BLOCK_SIZE, err);
            false
        }
    };
    drop(file);
    let _ = fs::remove_file(&path);
    ok
}

fn test_data() -> Vec<u8> {
    (0..2usize << 16).map(|i| b' ' + (i % (b'~' - b' ') as usize) as u8).collect()
}

#[test]
fn test_writer_round_trip() {
    let dir = test_dir();
    if !supports_direct_io(dir.path()) {
        return;
    }
    let data = test_data();

    for &bs in BUF_SIZES {
        let path: PathBuf = dir.path().join(format!("foo-{}", bs));
        let file = open_direct(&path).unwrap();
        let mut writer = DirectWriter::with_capacity(bs, file).unwrap();

        let mut point = 0;
        for &n in WRITE_SIZES {
            let written = writer.try_write(&data[point..point + n]).unwrap();
            assert_eq!(written, n, "nwrite={} bufsize={}", n, bs);
            point += n;
        }
        writer.close().unwrap();

        let on_disk = fs::read(&path).unwrap();
        assert_eq!(on_disk.len(), point, "bufsize={}", bs);
        assert!(on_disk == data[..point], "wrong bytes were written, bufsize={}", bs);
    }
}

#[test]
fn test_flush_restores_direct_mode() {
    let dir = test_dir();
    if !supports_direct_io(dir.path()) {
        return;
    }

    let path = dir.path().join("restore.bin");
    let file = open_direct(&path).unwrap();
    let control = FdControl::new(&file);
    let mut writer = DirectWriter::new(file).unwrap();

    writer.try_write(b"odd-sized tail").unwrap();
    writer.flush().unwrap();

    // writer 仍持有文件，描述符有效
    control.check_enabled().unwrap();
    writer.close().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"odd-sized tail");
}

#[test]
fn test_fd_control_toggle() {
    let dir = test_dir();
    if !supports_direct_io(dir.path()) {
        return;
    }

    let file = open_direct(dir.path().join("toggle.bin")).unwrap();
    let control = FdControl::new(&file);

    control.check_enabled().unwrap();
    control.set_enabled(false).unwrap();
    assert!(matches!(control.check_enabled(), Err(Error::DirectModeNotEnabled)));
    control.set_enabled(true).unwrap();
    control.check_enabled().unwrap();
}

#[test]
fn test_rejects_buffered_file() {
    let dir = test_dir();
    let file = File::create(dir.path().join("plain.bin")).unwrap();

    let result = DirectWriter::new(file);
    assert!(matches!(result, Err(Error::DirectModeNotEnabled)));
}
