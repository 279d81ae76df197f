//! Writer statistics
//!
//! 写入器统计信息

/// Counters describing how a [`DirectWriter`](super::DirectWriter) moved bytes
///
/// 描述 [`DirectWriter`](super::DirectWriter) 如何搬运字节的计数器
///
/// Zero-copy traffic and staged traffic are counted separately, which makes it
/// easy to see whether callers hand in aligned memory.
///
/// 零拷贝流量和暂存流量分开统计，便于判断调用方是否提供了对齐内存。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriterStats {
    /// Sink writes issued straight from caller memory
    ///
    /// 直接从调用方内存发出的写入次数
    pub direct_writes: u64,

    /// Bytes written straight from caller memory
    ///
    /// 直接从调用方内存写入的字节数
    pub direct_bytes: u64,

    /// Bytes copied into the staging buffer
    ///
    /// 复制到暂存缓冲区的字节数
    pub staged_bytes: u64,

    /// Sink writes issued from the staging buffer
    ///
    /// 从暂存缓冲区发出的写入次数
    pub buffer_flushes: u64,

    /// Bytes written from the staging buffer
    ///
    /// 从暂存缓冲区写入的字节数
    pub flushed_bytes: u64,
}

impl WriterStats {
    /// Total bytes handed to the sink
    ///
    /// 交给写入目标的总字节数
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.direct_bytes + self.flushed_bytes
    }
}
