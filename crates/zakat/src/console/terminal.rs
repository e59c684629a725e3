//! Terminal input with Ctrl-C support.
//!
//! A background thread runs a small tokio runtime that reads stdin line by
//! line and listens for Ctrl-C. Both arrive on one channel, so a prompt that
//! is blocked waiting for a line also wakes up when the operator presses
//! Ctrl-C. The prompt sees the interrupt as an empty read with the shared
//! [`Interrupt`] flag raised.

use std::io::{self, BufRead, Read, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::prompt::Console;
use crate::error::Result;

/// Shared flag raised when the operator presses Ctrl-C.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Create a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Lower the flag, returning whether it was raised.
    #[must_use]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// Check the flag without lowering it.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Something that happened on the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A line of input, without its terminator.
    Line(String),
    /// Ctrl-C was pressed.
    Interrupt,
    /// Input was closed.
    Eof,
}

/// Buffered reader over terminal events.
///
/// Lines are handed out with a `\n` terminator. An interrupt raises the
/// shared flag and reads as zero bytes; reading continues normally afterwards.
#[derive(Debug)]
pub struct TerminalInput {
    events: mpsc::UnboundedReceiver<TerminalEvent>,
    interrupt: Interrupt,
    pending: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl TerminalInput {
    /// Read from an event channel, raising `interrupt` on Ctrl-C.
    #[must_use]
    pub fn new(events: mpsc::UnboundedReceiver<TerminalEvent>, interrupt: Interrupt) -> Self {
        Self {
            events,
            interrupt,
            pending: Vec::new(),
            pos: 0,
            closed: false,
        }
    }
}

impl Read for TerminalInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for TerminalInput {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.pending.len() && !self.closed {
            match self.events.blocking_recv() {
                Some(TerminalEvent::Line(line)) => {
                    self.pending = line.into_bytes();
                    self.pending.push(b'\n');
                    self.pos = 0;
                }
                Some(TerminalEvent::Interrupt) => {
                    self.interrupt.raise();
                    return Ok(&[]);
                }
                Some(TerminalEvent::Eof) | None => self.closed = true,
            }
        }
        Ok(&self.pending[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.pending.len());
    }
}

/// Start the background reader and return the input side of it.
///
/// # Errors
///
/// Returns an error if the runtime or its thread cannot be started.
pub fn spawn(interrupt: Interrupt) -> Result<TerminalInput> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("zakat-terminal".to_string())
        .spawn(move || runtime.block_on(pump(tx)))?;

    Ok(TerminalInput::new(rx, interrupt))
}

async fn pump(tx: mpsc::UnboundedSender<TerminalEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut signals = true;

    loop {
        let event = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => TerminalEvent::Line(line),
                Ok(None) => TerminalEvent::Eof,
                Err(err) => {
                    warn!("Cannot read terminal input: {}", err);
                    TerminalEvent::Eof
                }
            },
            signal = tokio::signal::ctrl_c(), if signals => match signal {
                Ok(()) => {
                    debug!("Received Ctrl-C");
                    TerminalEvent::Interrupt
                }
                Err(err) => {
                    warn!("Cannot listen for Ctrl-C: {}", err);
                    signals = false;
                    continue;
                }
            },
        };

        let done = event == TerminalEvent::Eof;
        if tx.send(event).is_err() || done {
            break;
        }
    }
}

/// A console bound to the process's standard streams, with Ctrl-C routed to
/// the prompt.
///
/// # Errors
///
/// Returns an error if the background reader cannot be started.
pub fn stdio() -> Result<Console<TerminalInput, Stdout>> {
    let interrupt = Interrupt::new();
    let input = spawn(interrupt.clone())?;
    Ok(Console::new(input, io::stdout()).with_interrupt(interrupt))
}
