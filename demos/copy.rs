//! Copy stdin into a file opened with O_DIRECT
//!
//! 将标准输入复制到以 O_DIRECT 打开的文件
//!
//! ```text
//! RUST_LOG=direct_writer=trace cargo run --example copy -- out.bin [buffer-size] < input
//! ```

use direct_writer::{DirectWriter, Result, open_direct};
use std::io::{self, Read};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: copy <output> [buffer-size]");
        std::process::exit(2);
    };
    let capacity = args.next().and_then(|s| s.parse().ok()).unwrap_or(64 * 1024);

    let file = open_direct(&path)?;
    let mut writer = DirectWriter::with_capacity(capacity, file)?;

    let mut stdin = io::stdin().lock();
    let mut chunk = vec![0u8; 37 * 1024];
    let mut total = 0u64;
    loop {
        let n = stdin.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        writer.try_write(&chunk[..n])?;
        total += n as u64;
    }

    let stats = writer.stats();
    writer.close()?;

    tracing::info!(
        path = %path,
        bytes = total,
        zero_copy = stats.direct_bytes,
        staged = stats.staged_bytes,
        "copy finished"
    );
    Ok(())
}
