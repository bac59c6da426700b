//! # Serial Device Link
//!
//! Opens the printer's serial device file and configures it for raw binary
//! transmission. The printer speaks plain 8N1 with no flow control; the TTY
//! layer must not translate, echo or flow-control anything.
//!
//! ## TTY Configuration
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR,
//!   ICRNL disabled
//! - **No software flow control**: IXON/IXOFF/IXANY disabled, since 0x11
//!   (XON) and 0x13 (XOFF) legitimately appear in bitmap data
//! - **No output processing**: OPOST disabled (no CR/LF translation)
//! - **8-bit characters**: CS8, no parity
//! - **No echo, non-canonical**: ECHO, ECHONL, ICANON, ISIG, IEXTEN disabled

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::BrasaError;
use crate::transport::Link;

/// Default serial device path (Raspberry Pi UART header)
pub const DEFAULT_DEVICE: &str = "/dev/ttyAMA0";

/// Default baud rate of stock control boards
pub const DEFAULT_BAUDRATE: u32 = 19200;

/// A raw serial connection to the printer.
pub struct SerialLink {
    file: File,
    path: PathBuf,
    baudrate: u32,
}

impl SerialLink {
    /// Open a serial device and configure it for raw 8N1 at `baudrate`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the device cannot be opened, the baud rate is not
    /// a supported POSIX speed, or TTY configuration fails.
    pub fn open<P: AsRef<Path>>(device: P, baudrate: u32) -> Result<Self, BrasaError> {
        let path = device.as_ref().to_path_buf();

        let file = OpenOptions::new().write(true).open(&path).map_err(|e| {
            BrasaError::Transport(format!("failed to open {}: {}", path.display(), e))
        })?;

        configure_tty_raw(file.as_raw_fd(), baudrate)?;
        debug!("opened serial link {} at {} baud", path.display(), baudrate);

        Ok(SerialLink {
            file,
            path,
            baudrate,
        })
    }

    /// Open with the default device path and baud rate.
    pub fn open_default() -> Result<Self, BrasaError> {
        Self::open(DEFAULT_DEVICE, DEFAULT_BAUDRATE)
    }

    /// Device path this link was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured baud rate.
    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }
}

impl Link for SerialLink {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.file.flush()
    }
}

/// Map a numeric baud rate to its POSIX speed constant.
fn baud_constant(baudrate: u32) -> Option<libc::speed_t> {
    let speed = match baudrate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        _ => return None,
    };
    Some(speed)
}

/// Configure a file descriptor for raw TTY mode at the given baud rate.
#[cfg(unix)]
fn configure_tty_raw(fd: i32, baudrate: u32) -> Result<(), BrasaError> {
    use std::mem::MaybeUninit;

    let speed = baud_constant(baudrate)
        .ok_or_else(|| BrasaError::Transport(format!("unsupported baud rate: {}", baudrate)))?;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(BrasaError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    // Input flags: no processing, no software flow control
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    // Output flags: no post-processing
    termios.c_oflag &= !libc::OPOST;

    // Local flags: no echo, no canonical mode, no signals
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    // Control flags: 8-bit characters, no parity
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    unsafe {
        libc::cfsetispeed(&mut termios, speed);
        libc::cfsetospeed(&mut termios, speed);
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(BrasaError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32, _baudrate: u32) -> Result<(), BrasaError> {
    Err(BrasaError::Transport(
        "serial links are only supported on Unix".to_string(),
    ))
}
