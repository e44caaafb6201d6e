//! Byte-stream transport consumed by the receiver.

use heapless::Deque;

/// Serial byte stream feeding a receiver.
///
/// Implementations must never block: [`read`](ByteSource::read) returns
/// `None` when nothing is buffered.
pub trait ByteSource {
    /// Start the transport at the given baud rate.
    fn begin(&mut self, baudrate: u32);

    /// Number of bytes that can be read right now.
    fn available(&mut self) -> usize;

    /// Read one buffered byte.
    fn read(&mut self) -> Option<u8>;

    /// Write raw bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> usize;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn begin(&mut self, baudrate: u32) {
        (**self).begin(baudrate)
    }

    #[inline]
    fn available(&mut self) -> usize {
        (**self).available()
    }

    #[inline]
    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    #[inline]
    fn write(&mut self, data: &[u8]) -> usize {
        (**self).write(data)
    }
}

/// [`ByteSource`] over any `embedded-io` peripheral.
///
/// Baud rate is a property of the peripheral's construction in `embedded-io`
/// HALs, so [`begin`](ByteSource::begin) only records the requested rate.
/// [`available`](ByteSource::available) reports 1 while the peripheral says a
/// read would not block, 0 otherwise.
///
/// Only suitable for peripherals whose `read_ready` keeps working after a
/// line error. Buffered HAL UARTs that report errors and re-arm reception
/// only from inside a read (embassy-rp's `BufferedUart`, for one) stall
/// here after the first parity or framing error; feed those through
/// [`BufferedSource`] from an async read loop instead.
#[cfg(feature = "embedded-io")]
pub struct IoSource<T> {
    io: T,
    baudrate: u32,
}

#[cfg(feature = "embedded-io")]
impl<T> IoSource<T> {
    /// Wrap an already configured peripheral.
    #[must_use]
    pub fn new(io: T) -> Self {
        Self { io, baudrate: 0 }
    }

    /// Baud rate requested by the last `begin` call (0 before).
    #[must_use]
    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.io
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

#[cfg(feature = "embedded-io")]
impl<T> ByteSource for IoSource<T>
where
    T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    fn begin(&mut self, baudrate: u32) {
        self.baudrate = baudrate;
    }

    fn available(&mut self) -> usize {
        match self.io.read_ready() {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(_) => {
                debug!("read_ready failed");
                0
            }
        }
    }

    fn read(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.io.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(_) => {
                debug!("read failed");
                None
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> usize {
        match self.io.write(data) {
            Ok(n) => n,
            Err(_) => {
                debug!("write failed");
                0
            }
        }
    }
}

/// [`ByteSource`] over bytes pushed in by the caller.
///
/// The receive side is a fixed-capacity buffer filled with
/// [`push`](BufferedSource::push), typically from an async UART read that
/// also surfaces line errors. Writes go straight to the `embedded-io`
/// transmitter `W`.
pub struct BufferedSource<W, const N: usize> {
    rx: Deque<u8, N>,
    tx: W,
    baudrate: u32,
}

impl<W, const N: usize> BufferedSource<W, N> {
    /// Create an empty source writing to `tx`.
    #[must_use]
    pub const fn new(tx: W) -> Self {
        Self {
            rx: Deque::new(),
            tx,
            baudrate: 0,
        }
    }

    /// Append received bytes, returning how many fit.
    ///
    /// Bytes past the returned count were not taken and should stay with
    /// the caller until the receiver has drained some.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let mut taken = 0;
        for &byte in bytes {
            if self.rx.push_back(byte).is_err() {
                trace!("receive buffer full, {} bytes left", bytes.len() - taken);
                break;
            }
            taken += 1;
        }
        taken
    }

    /// Bytes waiting to be read.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Baud rate requested by the last `begin` call (0 before).
    #[must_use]
    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    pub fn tx_mut(&mut self) -> &mut W {
        &mut self.tx
    }

    pub fn into_inner(self) -> W {
        self.tx
    }
}

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write, const N: usize> ByteSource for BufferedSource<W, N> {
    fn begin(&mut self, baudrate: u32) {
        self.baudrate = baudrate;
        self.rx.clear();
    }

    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        match self.tx.write(data) {
            Ok(n) => n,
            Err(_) => {
                debug!("write failed");
                0
            }
        }
    }
}
