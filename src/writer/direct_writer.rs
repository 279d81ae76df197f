//! Buffered writer for O_DIRECT descriptors
//!
//! 面向 O_DIRECT 描述符的缓冲写入器

use std::fmt;
use std::fs::File;
use std::io::{self, Write};

use super::aligned::{AlignedBuffer, DEFAULT_BUF_SIZE, align_down, buffer_capacity, is_aligned};
use super::direct_mode::{DirectIoControl, FdControl, Sink};
use super::error::{Error, PartialWrite, Result};
use super::stats::WriterStats;

/// Buffered writer that keeps O_DIRECT requests aligned
///
/// 保持 O_DIRECT 请求对齐的缓冲写入器
///
/// Arbitrary-sized writes are staged in a block-aligned buffer and pushed to
/// the sink in whole blocks. When the buffer is empty and the caller's slice is
/// itself block aligned, the aligned prefix goes straight to the sink without
/// a copy.
///
/// 任意大小的写入先暂存到按块对齐的缓冲区，再以整块写入目标。
/// 当缓冲区为空且调用方切片本身按块对齐时，对齐的前缀直接写入目标，无需复制。
///
/// # Flushing
///
/// [`flush`](Self::flush) drains whatever is staged, even a partial block. To do
/// that it clears O_DIRECT on the descriptor, writes, then sets it again. The
/// file offset is usually unaligned afterwards, so `flush` is meant for the end
/// of a stream; later direct writes may be rejected by the kernel.
///
/// # 刷新
///
/// [`flush`](Self::flush) 会排空所有暂存数据，即使不足一个块。为此它会先清除描述符上的
/// O_DIRECT，写入后再重新设置。之后文件偏移通常不再对齐，因此 `flush` 应在流结束时调用；
/// 之后的直接写入可能被内核拒绝。
///
/// # Errors
///
/// The first failed write is latched: every later [`try_write`](Self::try_write)
/// and [`flush`](Self::flush) returns it, and [`close`](Self::close) skips the
/// final flush.
///
/// # 错误
///
/// 第一次写入失败会被锁存：之后的每次 [`try_write`](Self::try_write) 和
/// [`flush`](Self::flush) 都返回该错误，[`close`](Self::close) 会跳过最终刷新。
///
/// # Examples
///
/// ```no_run
/// use direct_writer::{DirectWriter, Result, open_direct};
/// # fn main() -> Result<()> {
/// let file = open_direct("/var/tmp/output.bin")?;
/// let mut writer = DirectWriter::with_capacity(64 * 1024, file)?;
///
/// writer.try_write(b"header")?;
/// writer.try_write(&vec![7u8; 100_000])?;
///
/// // Drain the unaligned tail and close the file
/// // 排空未对齐的尾部并关闭文件
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
pub struct DirectWriter<S = File, C = FdControl> {
    sink: S,
    control: C,

    /// Staging area, capacity is a multiple of the block size
    ///
    /// 暂存区，容量为块大小的整数倍
    buf: AlignedBuffer,

    /// Bytes staged in `buf` and not yet written
    ///
    /// `buf` 中已暂存但尚未写入的字节数
    buffered: usize,

    /// First write failure, returned by every later call
    ///
    /// 第一次写入失败，之后每次调用都会返回
    error: Option<Error>,

    stats: WriterStats,
}

impl DirectWriter<File, FdControl> {
    /// Wrap an O_DIRECT file with the default buffer size
    ///
    /// 使用默认缓冲区大小包装 O_DIRECT 文件
    ///
    /// # Errors
    /// - `DirectModeNotEnabled` if `file` was not opened with O_DIRECT
    /// - `UnsupportedDirectIo` on platforms without O_DIRECT
    ///
    /// # Errors
    /// - 如果 `file` 未以 O_DIRECT 打开，返回 `DirectModeNotEnabled`
    /// - 在不支持 O_DIRECT 的平台上返回 `UnsupportedDirectIo`
    pub fn new(file: File) -> Result<Self> {
        Self::with_capacity(DEFAULT_BUF_SIZE, file)
    }

    /// Wrap an O_DIRECT file with a buffer of about `capacity` bytes
    ///
    /// 使用约 `capacity` 字节的缓冲区包装 O_DIRECT 文件
    ///
    /// See [`buffer_capacity`](crate::buffer_capacity) for how `capacity` is rounded.
    ///
    /// `capacity` 的取整规则见 [`buffer_capacity`](crate::buffer_capacity)。
    pub fn with_capacity(capacity: usize, file: File) -> Result<Self> {
        let control = FdControl::new(&file);
        Self::with_control(file, control, capacity)
    }
}

impl<S: Sink, C: DirectIoControl> DirectWriter<S, C> {
    /// Build a writer over any sink and direct-mode control
    ///
    /// 基于任意写入目标和直接模式控制器构建写入器
    ///
    /// The control is checked before anything is allocated.
    ///
    /// 在分配任何内存之前先检查控制器。
    pub fn with_control(sink: S, control: C, capacity: usize) -> Result<Self> {
        control.check_enabled()?;

        let buf = AlignedBuffer::allocate(buffer_capacity(capacity))?;
        tracing::debug!(capacity = buf.len(), "direct writer created");

        Ok(Self {
            sink,
            control,
            buf,
            buffered: 0,
            error: None,
            stats: WriterStats::default(),
        })
    }

    /// Write `data`, staging or passing it through as alignment allows
    ///
    /// 写入 `data`，根据对齐情况暂存或直接透传
    ///
    /// On success every byte of `data` has been written to the sink or staged
    /// for a later flush, in order. On failure the returned [`PartialWrite`]
    /// says how many bytes were consumed, and the error becomes sticky.
    ///
    /// 成功时 `data` 的每个字节都已按顺序写入目标或暂存待刷新。
    /// 失败时返回的 [`PartialWrite`] 说明已消耗的字节数，且该错误会被锁存。
    pub fn try_write(&mut self, mut data: &[u8]) -> std::result::Result<usize, PartialWrite> {
        if let Some(err) = &self.error {
            return Err(PartialWrite {
                consumed: 0,
                error: err.clone(),
            });
        }

        let mut consumed = 0;
        while data.len() >= self.available() {
            let n = if self.buffered == 0 && is_aligned(data) {
                // Empty buffer and aligned input: skip the copy for whole blocks
                // 缓冲区为空且输入已对齐：整块部分跳过复制
                let direct_len = align_down(data.len());
                if let Err(err) = write_once(&mut self.sink, &data[..direct_len]) {
                    let written = err.written();
                    self.stats.direct_bytes += written as u64;
                    return Err(self.latch(consumed + written, err));
                }
                self.stats.direct_writes += 1;
                self.stats.direct_bytes += direct_len as u64;
                tracing::trace!(len = direct_len, "zero-copy write");

                direct_len + self.stage(&data[direct_len..])
            } else {
                // Fill the buffer and push it out as whole blocks
                // 填满缓冲区并以整块写出
                let n = self.stage(data);
                if let Err(err) = self.flush_buffer() {
                    return Err(self.latch(consumed + n, err));
                }
                n
            };
            consumed += n;
            data = &data[n..];
        }

        consumed += self.stage(data);
        Ok(consumed)
    }

    /// Drain all staged bytes, temporarily clearing O_DIRECT
    ///
    /// 排空所有暂存字节，期间临时清除 O_DIRECT
    ///
    /// A no-op when nothing is staged.
    ///
    /// 没有暂存数据时不做任何操作。
    ///
    /// # Errors
    /// - The sticky error, if one was latched; the descriptor is untouched
    /// - The control's error if O_DIRECT can't be cleared
    /// - `FlushFailed` if the drain fails; O_DIRECT stays cleared and the
    ///   remaining bytes stay staged for a retry
    /// - `RestoreDirectMode` if everything was written but O_DIRECT can't be set again
    ///
    /// # Errors
    /// - 如果已锁存错误，返回该错误；不会改动描述符
    /// - 如果无法清除 O_DIRECT，返回控制器的错误
    /// - 如果排空失败，返回 `FlushFailed`；O_DIRECT 保持清除状态，剩余字节保留待重试
    /// - 如果数据已全部写入但无法重新设置 O_DIRECT，返回 `RestoreDirectMode`
    pub fn flush(&mut self) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.buffered == 0 {
            return Ok(());
        }

        self.control.set_enabled(false)?;

        if let Err(err) = self.flush_buffer() {
            tracing::warn!(buffered = self.buffered, error = %err, "flush failed, direct I/O left disabled");
            return Err(Error::FlushFailed { source: Box::new(err) });
        }

        self.control.set_enabled(true).map_err(|err| {
            tracing::warn!(error = %err, "data flushed but direct I/O could not be re-enabled");
            Error::RestoreDirectMode { source: Box::new(err) }
        })
    }

    /// Flush (unless an error is latched) and close the sink
    ///
    /// 刷新（除非已锁存错误）并关闭写入目标
    ///
    /// The sink is closed even when the flush fails. The flush error wins over
    /// the close error.
    ///
    /// 即使刷新失败也会关闭写入目标。刷新错误优先于关闭错误返回。
    pub fn close(mut self) -> Result<()> {
        let flushed = if self.error.is_none() { self.flush() } else { Ok(()) };
        let closed = self.sink.close();
        flushed?;
        closed.map_err(Error::from)
    }

    /// Write the staged bytes with the descriptor in whatever mode it is in
    ///
    /// 以描述符当前模式写出暂存字节
    ///
    /// On a partial write the unwritten tail is moved to the front so a retry
    /// picks up where this one stopped. The error is not latched here.
    ///
    /// 部分写入时，未写入的尾部会移到开头，以便重试时从中断处继续。此处不锁存错误。
    fn flush_buffer(&mut self) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.buffered == 0 {
            return Ok(());
        }

        let pending = self.buffered;
        let result = write_once(&mut self.sink, &self.buf.as_slice()[..pending]);
        let written = match &result {
            Ok(()) => pending,
            Err(err) => err.written().min(pending),
        };

        if written > 0 {
            self.stats.buffer_flushes += 1;
            self.stats.flushed_bytes += written as u64;
        }
        if result.is_err() && written > 0 && written < pending {
            self.buf.as_mut_slice().copy_within(written..pending, 0);
        }
        self.buffered = pending - written;
        tracing::trace!(written, remaining = self.buffered, "buffer flushed");

        result
    }

    /// Copy as much of `data` as fits into the buffer
    ///
    /// 将 `data` 中能放下的部分复制到缓冲区
    fn stage(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.available());
        self.buf.as_mut_slice()[self.buffered..self.buffered + n].copy_from_slice(&data[..n]);
        self.buffered += n;
        self.stats.staged_bytes += n as u64;
        n
    }

    fn latch(&mut self, consumed: usize, error: Error) -> PartialWrite {
        tracing::warn!(consumed, error = %error, "direct write failed");
        self.error = Some(error.clone());
        PartialWrite { consumed, error }
    }
}

impl<S, C> DirectWriter<S, C> {
    /// Free bytes in the buffer
    ///
    /// 缓冲区中的空闲字节数
    #[inline]
    pub fn available(&self) -> usize {
        self.buf.len() - self.buffered
    }

    /// Bytes staged and not yet written
    ///
    /// 已暂存尚未写入的字节数
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    /// Total buffer capacity
    ///
    /// 缓冲区总容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Latched error, if any
    ///
    /// 已锁存的错误（如有）
    #[inline]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    #[inline]
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    #[inline]
    pub fn get_ref(&self) -> &S {
        &self.sink
    }
}

impl<S: Sink, C: DirectIoControl> Write for DirectWriter<S, C> {
    /// Bytes consumed before a failure are reported as a short `Ok`; the latched
    /// error comes back on the next call.
    ///
    /// 失败前已消耗的字节以较短的 `Ok` 返回；锁存的错误在下一次调用时返回。
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.try_write(buf) {
            Ok(n) => Ok(n),
            Err(partial) if partial.consumed > 0 => Ok(partial.consumed),
            Err(partial) => Err(partial.error.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        DirectWriter::flush(self).map_err(io::Error::from)
    }
}

impl<S, C> fmt::Debug for DirectWriter<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectWriter")
            .field("capacity", &self.buf.len())
            .field("buffered", &self.buffered)
            .field("error", &self.error)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Single sink write; anything short of `data.len()` is an error
///
/// 单次写入目标；少于 `data.len()` 即视为错误
fn write_once<W: Write>(sink: &mut W, data: &[u8]) -> Result<()> {
    loop {
        match sink.write(data) {
            Ok(n) if n >= data.len() => return Ok(()),
            Ok(n) => {
                return Err(Error::ShortWrite {
                    written: n,
                    requested: data.len(),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}
