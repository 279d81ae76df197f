//! Error types for direct-writer
//!
//! direct-writer 的错误类型

use std::io;
use std::sync::Arc;

/// Error type for direct-writer operations
///
/// direct-writer 操作的错误类型
///
/// The type is `Clone` so that the first write failure can be latched and
/// handed back on every later call.
///
/// 该类型实现了 `Clone`，以便锁存第一次写入失败并在之后每次调用时返回。
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// I/O error
    ///
    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Zero-length buffer requested
    ///
    /// 请求了零长度缓冲区
    #[error("size is 0, can't allocate buffer / 大小为 0，无法分配缓冲区")]
    InvalidSize,

    /// Allocated region could not be aligned to the block size
    ///
    /// 分配的区域无法按块大小对齐
    #[error("can't allocate aligned buffer (offset {offset}) / 无法分配对齐缓冲区（偏移 {offset}）")]
    AlignmentFailure {
        offset: usize,
    },

    /// The descriptor does not have the O_DIRECT flag set
    ///
    /// 描述符未设置 O_DIRECT 标志
    #[error("O_DIRECT flag is absent / 缺少 O_DIRECT 标志")]
    DirectModeNotEnabled,

    /// Direct I/O is not supported on this platform
    ///
    /// 当前平台不支持直接 I/O
    #[error("no direct I/O support / 不支持直接 I/O")]
    UnsupportedDirectIo,

    /// The sink accepted fewer bytes than requested without reporting an error
    ///
    /// 目标写入的字节数少于请求值且未报告错误
    #[error("short write: {written} of {requested} bytes / 短写：{written} / {requested} 字节")]
    ShortWrite {
        written: usize,
        requested: usize,
    },

    /// Draining the buffer failed while direct mode was disabled
    ///
    /// 关闭直接模式期间排空缓冲区失败
    ///
    /// Direct mode is left disabled on the descriptor. The unwritten bytes stay
    /// at the front of the buffer and a later `flush` resumes from there.
    ///
    /// 描述符保持非直接模式。未写入的字节保留在缓冲区开头，之后的 `flush` 会从该处继续。
    #[error("flush failed, direct I/O left disabled / 刷新失败，直接 I/O 保持关闭: {source}")]
    FlushFailed {
        source: Box<Error>,
    },

    /// All buffered data was written but direct mode could not be turned back on
    ///
    /// 所有缓冲数据均已写入，但无法重新开启直接模式
    #[error("data flushed but direct I/O could not be re-enabled / 数据已刷新但无法重新开启直接 I/O: {source}")]
    RestoreDirectMode {
        source: Box<Error>,
    },
}

impl Error {
    /// Number of bytes the sink accepted before this error was raised
    ///
    /// 此错误发生前目标已接受的字节数
    #[inline]
    pub fn written(&self) -> usize {
        match self {
            Error::ShortWrite { written, .. } => *written,
            _ => 0,
        }
    }

    /// Innermost error, looking through flush wrappers
    ///
    /// 最内层错误，穿透刷新包装
    pub fn root(&self) -> &Error {
        match self {
            Error::FlushFailed { source } | Error::RestoreDirectMode { source } => source.root(),
            other => other,
        }
    }
}

/// Convert from io::Error to Error
///
/// 从 io::Error 转换到 Error
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => match Arc::try_unwrap(io_err) {
                Ok(io_err) => io_err,
                Err(shared) => io::Error::new(shared.kind(), shared.to_string()),
            },
            Error::InvalidSize => io::Error::new(io::ErrorKind::InvalidInput, err.to_string()),
            Error::AlignmentFailure { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err.to_string()),
            Error::DirectModeNotEnabled => io::Error::new(io::ErrorKind::InvalidInput, err.to_string()),
            Error::UnsupportedDirectIo => io::Error::new(io::ErrorKind::Unsupported, err.to_string()),
            Error::ShortWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, err.to_string()),
            Error::FlushFailed { .. } | Error::RestoreDirectMode { .. } => {
                io::Error::new(io::Error::from(err.root().clone()).kind(), err.to_string())
            }
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;

/// Failed write together with the number of bytes it consumed
///
/// 失败的写入及其已消耗的字节数
///
/// `consumed` counts bytes that were either handed to the sink or staged in
/// the buffer before `error` happened.
///
/// `consumed` 统计在 `error` 发生前已交给写入目标或已暂存到缓冲区的字节数。
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error} (after {consumed} bytes / 已消耗 {consumed} 字节)")]
pub struct PartialWrite {
    pub consumed: usize,
    #[source]
    pub error: Error,
}

impl From<PartialWrite> for Error {
    fn from(partial: PartialWrite) -> Self {
        partial.error
    }
}
