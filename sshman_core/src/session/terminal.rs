//! Local terminal plumbing for the in-process transport.
//!
//! * [`spawn_input_reader`] moves blocking reads of stdin onto a worker thread
//!   and hands the chunks over an `mpsc` channel.
//! * [`ResizeWatcher`] notices when the local terminal changes size.
//! * [`InterruptForwarder`] catches SIGINT for the lifetime of a session so it
//!   can be forwarded to the remote side instead of killing us.
//! * [`write_all_retrying`] / [`copy_available`] deal with a non-blocking peer.

use std::io::{self, ErrorKind, Read, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, trace};

/// Pause between polls of a non-blocking peer.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// End-of-text, what a terminal sends for Ctrl+C.
pub(crate) const ETX: u8 = 0x03;

/// Reads `reader` on a detached thread until EOF or error.
///
/// The receiver reports `Disconnected` once input is exhausted.
pub(crate) fn spawn_input_reader<R>(mut reader: R) -> mpsc::Receiver<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break; // receiver gone
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Input reader stopped: {}", e);
                    break;
                }
            }
        }
        trace!("Input reader finished");
    });
    rx
}

/// Writes all of `data`, sleeping while the peer reports `WouldBlock`.
pub(crate) fn write_all_retrying<W: Write + ?Sized>(writer: &mut W, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match writer.write(data) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    loop {
        match writer.flush() {
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            other => return other,
        }
    }
}

/// Copies whatever `source` has ready into `sink` without blocking.
///
/// Returns the number of bytes moved; `WouldBlock` just ends the copy.
pub(crate) fn copy_available<R, W>(source: &mut R, sink: &mut W, buf: &mut [u8]) -> io::Result<usize>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut total = 0;
    loop {
        match source.read(buf) {
            Ok(0) => break,
            Ok(n) => {
                sink.write_all(&buf[..n])?;
                total += n;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    if total > 0 {
        sink.flush()?;
    }
    Ok(total)
}

/// Tracks the size last announced to the remote PTY.
#[derive(Debug)]
pub(crate) struct ResizeWatcher {
    last: (u32, u32),
}

impl ResizeWatcher {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        Self {
            last: (columns, rows),
        }
    }

    /// Checks the local terminal; `Some((columns, rows))` when it differs
    /// from what was last announced.
    pub(crate) fn poll(&mut self) -> Option<(u32, u32)> {
        self.observe(crossterm::terminal::size().ok())
    }

    fn observe(&mut self, current: Option<(u16, u16)>) -> Option<(u32, u32)> {
        let (columns, rows) = current?;
        if columns == 0 || rows == 0 {
            return None;
        }
        let size = (u32::from(columns), u32::from(rows));
        if size == self.last {
            return None;
        }
        self.last = size;
        Some(size)
    }
}

/// Diverts SIGINT into a flag while alive (unix only).
pub(crate) struct InterruptForwarder {
    #[cfg(unix)]
    flag: std::sync::Arc<std::sync::atomic::AtomicBool>,
    #[cfg(unix)]
    id: signal_hook::SigId,
}

impl InterruptForwarder {
    #[cfg(unix)]
    pub(crate) fn register() -> io::Result<Self> {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let flag = Arc::new(AtomicBool::new(false));
        let id = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))?;
        Ok(Self { flag, id })
    }

    #[cfg(not(unix))]
    pub(crate) fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    /// `true` once per delivered interrupt.
    pub(crate) fn take(&self) -> bool {
        #[cfg(unix)]
        {
            self.flag.swap(false, std::sync::atomic::Ordering::SeqCst)
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

#[cfg(unix)]
impl Drop for InterruptForwarder {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.id);
    }
}
