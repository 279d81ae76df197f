//! Buffered writer for direct-I/O file descriptors
//!
//! 直接 I/O 文件描述符的缓冲写入器
//!
//! Files opened with `O_DIRECT` bypass the page cache, but every request must be
//! aligned to the device block size in both memory address and length. This crate
//! accepts writes of any size, stages them in a block-aligned buffer and writes
//! whole blocks to the descriptor. The final, possibly partial block is written by
//! [`DirectWriter::flush`], which briefly clears `O_DIRECT` to do so.
//!
//! 以 `O_DIRECT` 打开的文件绕过页缓存，但每个请求的内存地址和长度都必须按设备块大小对齐。
//! 本库接受任意大小的写入，将其暂存到按块对齐的缓冲区中，并以整块写入描述符。
//! 最后一个可能不完整的块由 [`DirectWriter::flush`] 写出，期间会短暂清除 `O_DIRECT`。
//!
//! # Features
//!
//! - **Zero-copy writes**: Aligned input skips the staging buffer entirely
//! - **Any write size**: Callers never have to pad or align their data
//! - **Sticky errors**: The first failure is returned by every later call
//! - **Mockable OS layer**: The flag toggle and the sink are traits
//!
//! # 特性
//!
//! - **零拷贝写入**：对齐的输入完全跳过暂存缓冲区
//! - **任意写入大小**：调用方无需填充或对齐数据
//! - **错误锁存**：第一次失败会在之后每次调用时返回
//! - **可模拟的系统层**：标志切换和写入目标均为 trait
//!
//! # Quick Start
//!
//! ```no_run
//! use direct_writer::{DirectWriter, Result, open_direct};
//! # fn main() -> Result<()> {
//! let file = open_direct("/var/tmp/log.bin")?;
//! let mut writer = DirectWriter::new(file)?;
//!
//! for line in ["first\n", "second\n", "third\n"] {
//!     writer.try_write(line.as_bytes())?;
//! }
//!
//! // Writes the unaligned tail and closes the descriptor
//! // 写出未对齐的尾部并关闭描述符
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`DirectWriter`]: The buffered writer
//! - [`AlignedBuffer`]: Block-aligned byte buffer
//! - [`DirectIoControl`]: Query and toggle `O_DIRECT` on a descriptor
//! - [`Sink`]: Closable byte sink
//! - [`WriterStats`]: Zero-copy and staged traffic counters
//!
//! # 主要类型
//!
//! - [`DirectWriter`]：缓冲写入器
//! - [`AlignedBuffer`]：按块对齐的字节缓冲区
//! - [`DirectIoControl`]：查询和切换描述符上的 `O_DIRECT`
//! - [`Sink`]：可关闭的字节写入目标
//! - [`WriterStats`]：零拷贝与暂存流量计数器

mod writer;

pub use writer::{
    AlignedBuffer, BLOCK_SIZE, DEFAULT_BUF_SIZE, DirectIoControl, DirectWriter, Error, FdControl, PartialWrite,
    Result, Sink, WriterStats, align_offset, buffer_capacity, is_aligned, open_direct,
};
