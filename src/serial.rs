use core::fmt;

use crate::sync::IrqMutex;

#[cfg(kernel_target)]
use uart_16550::MmioSerialPort;

#[cfg(kernel_target)]
struct SerialPortWrapper {
    port: Option<MmioSerialPort>,
}

#[cfg(kernel_target)]
impl SerialPortWrapper {
    const fn new() -> Self {
        Self { port: None }
    }

    fn ensure_init(&mut self) {
        if self.port.is_none() {
            let mut port = unsafe { MmioSerialPort::new(crate::config::UART0) };
            port.init();
            self.port = Some(port);
        }
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.ensure_init();
        if let Some(ref mut port) = self.port {
            use core::fmt::Write;
            port.write_fmt(args).ok();
        }
    }
}

#[cfg(kernel_target)]
static SERIAL1: IrqMutex<SerialPortWrapper> = IrqMutex::new(SerialPortWrapper::new());

/// Hosted builds have no UART; output lands in a bounded buffer that keeps
/// the most recent bytes.
#[cfg(not(kernel_target))]
const CAPTURE_CAPACITY: usize = 16 * 1024;

#[cfg(not(kernel_target))]
struct CaptureBuffer {
    buf: [u8; CAPTURE_CAPACITY],
    len: usize,
}

#[cfg(not(kernel_target))]
impl CaptureBuffer {
    const fn new() -> Self {
        Self {
            buf: [0; CAPTURE_CAPACITY],
            len: 0,
        }
    }

    fn as_str(&self) -> &str {
        let bytes = &self.buf[..self.len];
        match core::str::from_utf8(bytes) {
            Ok(text) => text,
            // Eviction can split a multi-byte character at the front.
            Err(err) if err.valid_up_to() == 0 => {
                let skip = bytes.iter().take_while(|b| (**b & 0xC0) == 0x80).count();
                core::str::from_utf8(&bytes[skip..]).unwrap_or("")
            }
            Err(err) => core::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or(""),
        }
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::write(self, args);
    }
}

#[cfg(not(kernel_target))]
impl fmt::Write for CaptureBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let bytes = if bytes.len() > CAPTURE_CAPACITY {
            &bytes[bytes.len() - CAPTURE_CAPACITY..]
        } else {
            bytes
        };
        let overflow = (self.len + bytes.len()).saturating_sub(CAPTURE_CAPACITY);
        if overflow > 0 {
            self.buf.copy_within(overflow..self.len, 0);
            self.len -= overflow;
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

#[cfg(not(kernel_target))]
static SERIAL1: IrqMutex<CaptureBuffer> = IrqMutex::new(CaptureBuffer::new());

#[cfg(kernel_target)]
pub fn init() {
    SERIAL1.lock().ensure_init();
}

#[cfg(not(kernel_target))]
pub fn init() {}

pub(crate) fn _print(args: fmt::Arguments<'_>) {
    SERIAL1.lock().write_fmt(args);
}

/// Run `f` over everything written to the console so far.
#[cfg(not(kernel_target))]
pub fn with_captured<R>(f: impl FnOnce(&str) -> R) -> R {
    let capture = SERIAL1.lock();
    f(capture.as_str())
}

#[cfg(not(kernel_target))]
pub fn clear_captured() {
    SERIAL1.lock().len = 0;
}
