//! Aligned buffered writing for O_DIRECT descriptors
//!
//! 面向 O_DIRECT 描述符的对齐缓冲写入
//!
//! Components, in dependency order:
//! - [`AlignedBuffer`]: block-aligned staging memory
//! - [`DirectIoControl`] / [`Sink`]: the descriptor flag toggle and the byte sink
//! - [`DirectWriter`]: buffering, zero-copy dispatch and the flush/close protocol
//!
//! 组件（按依赖顺序）：
//! - [`AlignedBuffer`]：按块对齐的暂存内存
//! - [`DirectIoControl`] / [`Sink`]：描述符标志切换与字节写入目标
//! - [`DirectWriter`]：缓冲、零拷贝分发以及刷新/关闭协议

mod aligned;
mod direct_mode;
mod direct_writer;
mod error;
mod stats;


// Re-export public API
// 重新导出公共 API
pub use aligned::{AlignedBuffer, BLOCK_SIZE, DEFAULT_BUF_SIZE, align_offset, buffer_capacity, is_aligned};
pub use direct_mode::{DirectIoControl, FdControl, Sink, open_direct};
pub use direct_writer::DirectWriter;
pub use error::{Error, PartialWrite, Result};
pub use stats::WriterStats;
