//! Direct I/O flag control and sink abstraction
//!
//! 直接 I/O 标志控制与写入目标抽象
//!
//! On Linux the O_DIRECT status flag is queried and toggled with `fcntl`.
//! Other platforms get stubs that report [`Error::UnsupportedDirectIo`].
//!
//! Linux 上通过 `fcntl` 查询和切换 O_DIRECT 状态标志。
//! 其他平台使用返回 [`Error::UnsupportedDirectIo`] 的桩实现。

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::error::{Error, Result};

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};

/// Query and toggle direct mode on a descriptor
///
/// 查询并切换描述符的直接模式
///
/// The flag is descriptor-level state visible to the whole process. The writer
/// holds one control per sink and only flips it inside
/// [`DirectWriter::flush`](super::DirectWriter::flush).
///
/// 该标志是整个进程可见的描述符级状态。写入器为每个目标持有一个控制器，
/// 仅在 [`DirectWriter::flush`](super::DirectWriter::flush) 内切换。
pub trait DirectIoControl {
    /// Fail with [`Error::DirectModeNotEnabled`] unless direct mode is set
    ///
    /// 如果未设置直接模式，返回 [`Error::DirectModeNotEnabled`]
    fn check_enabled(&self) -> Result<()>;

    /// Set or clear direct mode
    ///
    /// 设置或清除直接模式
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

/// Byte sink that can be closed exactly once
///
/// 只能关闭一次的字节写入目标
pub trait Sink: Write {
    /// Close the sink and report any error from doing so
    ///
    /// 关闭写入目标并报告关闭时的错误
    fn close(self) -> io::Result<()>;
}

impl Sink for File {
    #[cfg(unix)]
    fn close(self) -> io::Result<()> {
        use std::os::unix::io::IntoRawFd;

        let fd = self.into_raw_fd();
        // Safety: `fd` was just released by `File`, nothing else owns it
        // Safety: `fd` 刚由 `File` 释放，没有其他所有者
        if unsafe { libc::close(fd) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn close(self) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

/// fcntl-backed [`DirectIoControl`] for a raw descriptor
///
/// 基于 fcntl 的原始描述符 [`DirectIoControl`] 实现
///
/// The control borrows nothing; it only remembers the descriptor number, so it
/// must not outlive the file it was built from. [`DirectWriter`](super::DirectWriter)
/// keeps both together.
///
/// 控制器不借用任何内容，只记录描述符编号，因此不能比构建它的文件活得更久。
/// [`DirectWriter`](super::DirectWriter) 将两者放在一起管理。
#[derive(Debug, Clone, Copy)]
pub struct FdControl {
    #[cfg(unix)]
    fd: RawFd,
}

impl FdControl {
    /// Build a control for `file`'s descriptor
    ///
    /// 为 `file` 的描述符构建控制器
    #[cfg(unix)]
    #[inline]
    pub fn new(file: &impl AsRawFd) -> Self {
        Self { fd: file.as_raw_fd() }
    }

    #[cfg(not(unix))]
    #[inline]
    pub fn new<T>(_file: &T) -> Self {
        Self {}
    }
}

#[cfg(target_os = "linux")]
fn fcntl_getfl(fd: RawFd) -> io::Result<libc::c_int> {
    // Safety: F_GETFL takes no pointer arguments
    // Safety: F_GETFL 不接受指针参数
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(flags)
}

#[cfg(target_os = "linux")]
impl DirectIoControl for FdControl {
    fn check_enabled(&self) -> Result<()> {
        let flags = fcntl_getfl(self.fd)?;
        if flags & libc::O_DIRECT == libc::O_DIRECT {
            Ok(())
        } else {
            Err(Error::DirectModeNotEnabled)
        }
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        let flags = fcntl_getfl(self.fd)?;
        let flags = if enabled {
            flags | libc::O_DIRECT
        } else {
            flags & !libc::O_DIRECT
        };

        // Safety: F_SETFL takes an integer flag set, no pointers
        // Safety: F_SETFL 接受整数标志集，没有指针
        if unsafe { libc::fcntl(self.fd, libc::F_SETFL, flags) } == -1 {
            return Err(io::Error::last_os_error().into());
        }
        tracing::debug!(fd = self.fd, enabled, "direct I/O flag updated");
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
impl DirectIoControl for FdControl {
    fn check_enabled(&self) -> Result<()> {
        Err(Error::UnsupportedDirectIo)
    }

    fn set_enabled(&self, _enabled: bool) -> Result<()> {
        Err(Error::UnsupportedDirectIo)
    }
}

/// Create (or truncate) a write-only file opened with O_DIRECT
///
/// 创建（或截断）以 O_DIRECT 打开的只写文件
///
/// # Errors
/// - `UnsupportedDirectIo` on platforms without O_DIRECT
/// - I/O error if the filesystem refuses the flag or the file can't be created
///
/// # Errors
/// - 在不支持 O_DIRECT 的平台上返回 `UnsupportedDirectIo`
/// - 如果文件系统拒绝该标志或无法创建文件，返回 I/O 错误
#[cfg(target_os = "linux")]
pub fn open_direct(path: impl AsRef<Path>) -> Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .custom_flags(libc::O_DIRECT)
        .open(path.as_ref())?;
    Ok(file)
}

#[cfg(not(target_os = "linux"))]
pub fn open_direct(_path: impl AsRef<Path>) -> Result<File> {
    Err(Error::UnsupportedDirectIo)
}
