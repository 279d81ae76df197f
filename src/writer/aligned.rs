//! Block-aligned staging buffer
//!
//! 按块对齐的暂存缓冲区

use super::error::{Error, Result};

/// O_DIRECT alignment unit in bytes
///
/// O_DIRECT 对齐单位（字节）
pub const BLOCK_SIZE: usize = 512;

/// Default staging buffer size (2 pages)
///
/// 默认暂存缓冲区大小（2 页）
pub const DEFAULT_BUF_SIZE: usize = 8192;

/// Offset of the first byte of `buf` from the previous block boundary
///
/// `buf` 首字节相对上一个块边界的偏移
///
/// Only the address is inspected, so an empty slice is judged by its
/// (dangling but non-null) pointer.
///
/// 仅检查地址，因此空切片按其（悬空但非空的）指针判断。
#[inline]
pub fn align_offset(buf: &[u8]) -> usize {
    buf.as_ptr().addr() & (BLOCK_SIZE - 1)
}

/// Whether `buf` starts on a block boundary
///
/// `buf` 是否从块边界开始
#[inline]
pub fn is_aligned(buf: &[u8]) -> bool {
    align_offset(buf) == 0
}

/// Round `len` down to a whole number of blocks
///
/// 将 `len` 向下取整为整块
#[inline]
pub(crate) fn align_down(len: usize) -> usize {
    len & !(BLOCK_SIZE - 1)
}

/// Buffer capacity used by the writer for a requested `size`
///
/// 写入器针对请求的 `size` 所使用的缓冲区容量
///
/// Rounds down to a multiple of [`BLOCK_SIZE`] and never goes below
/// [`DEFAULT_BUF_SIZE`].
///
/// 向下取整为 [`BLOCK_SIZE`] 的倍数，且不小于 [`DEFAULT_BUF_SIZE`]。
#[inline]
pub fn buffer_capacity(size: usize) -> usize {
    align_down(size).max(DEFAULT_BUF_SIZE)
}

/// Fixed-size byte buffer whose first byte is block aligned
///
/// 首字节按块对齐的定长字节缓冲区
///
/// The storage is over-allocated by one block and the usable window starts at
/// the first block boundary inside it. The boxed slice never moves, so the
/// window stays aligned for the buffer's whole lifetime.
///
/// 底层存储多分配一个块，可用窗口从其中第一个块边界开始。
/// 装箱切片不会移动，因此窗口在整个生命周期内保持对齐。
///
/// # Examples
///
/// ```
/// use direct_writer::{AlignedBuffer, is_aligned};
///
/// let buf = AlignedBuffer::allocate(4096).unwrap();
/// assert_eq!(buf.len(), 4096);
/// assert!(is_aligned(buf.as_slice()));
/// ```
pub struct AlignedBuffer {
    /// Raw storage, `len + BLOCK_SIZE` bytes
    ///
    /// 原始存储，`len + BLOCK_SIZE` 字节
    storage: Box<[u8]>,

    /// Start of the aligned window inside `storage`
    ///
    /// `storage` 内对齐窗口的起点
    offset: usize,

    len: usize,
}

impl AlignedBuffer {
    /// Allocate an aligned buffer of exactly `n` bytes
    ///
    /// 分配恰好 `n` 字节的对齐缓冲区
    ///
    /// # Errors
    /// - `InvalidSize` if `n` is 0
    /// - `AlignmentFailure` if the adjusted window is still unaligned
    ///
    /// # Errors
    /// - 如果 `n` 为 0，返回 `InvalidSize`
    /// - 如果调整后的窗口仍未对齐，返回 `AlignmentFailure`
    pub fn allocate(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidSize);
        }

        let storage = vec![0u8; n + BLOCK_SIZE].into_boxed_slice();

        // Distance to the next block boundary
        // 到下一个块边界的距离
        let misalignment = align_offset(&storage);
        let offset = if misalignment == 0 { 0 } else { BLOCK_SIZE - misalignment };

        let buf = Self { storage, offset, len: n };
        if !is_aligned(buf.as_slice()) {
            return Err(Error::AlignmentFailure {
                offset: align_offset(buf.as_slice()),
            });
        }

        Ok(buf)
    }

    /// Aligned window as a slice
    ///
    /// 以切片形式返回对齐窗口
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    /// Aligned window as a mutable slice
    ///
    /// 以可变切片形式返回对齐窗口
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }

    /// Usable length in bytes
    ///
    /// 可用长度（字节）
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for AlignedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for AlignedBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .finish()
    }
}
