use crate::process::OutputLine;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Ordered, thread-safe collection of captured output lines.
///
/// Every reader thread appends to the same buffer, so the order is arrival
/// order across both streams. The buffer closes once all writers have
/// finished (or on an explicit `close`); readers blocked in `wait_for` or
/// iterating with `iter` are woken on every append and on close.
#[derive(Debug)]
pub struct OutputBuffer {
    state: Mutex<BufferState>,
    changed: Condvar,
}

#[derive(Debug)]
struct BufferState {
    lines: Vec<OutputLine>,
    open_writers: usize,
    closed: bool,
}

impl OutputBuffer {
    /// Create a buffer that closes after `writers` calls to `finish_writer`
    pub fn new(writers: usize) -> Self {
        OutputBuffer {
            state: Mutex::new(BufferState {
                lines: Vec::new(),
                open_writers: writers,
                closed: writers == 0,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line. Lines arriving after close are dropped.
    pub fn push(&self, line: OutputLine) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.lines.push(line);
        self.changed.notify_all();
    }

    /// Signal that one writer has reached end of stream
    pub fn finish_writer(&self) {
        let mut state = self.lock();
        state.open_writers = state.open_writers.saturating_sub(1);
        if state.open_writers == 0 {
            state.closed = true;
        }
        self.changed.notify_all();
    }

    /// Close the buffer regardless of outstanding writers
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every line captured so far
    pub fn snapshot(&self) -> Vec<OutputLine> {
        self.lock().lines.clone()
    }

    /// Block until the line at `index` exists, the buffer closes, or the
    /// timeout elapses.
    ///
    /// # Returns
    /// * `Some(line)` - The line at `index`
    /// * `None` - The buffer closed with fewer lines, or the wait timed out
    pub fn wait_for(&self, index: usize, timeout: Option<Duration>) -> Option<OutputLine> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        loop {
            if let Some(line) = state.lines.get(index) {
                return Some(line.clone());
            }
            if state.closed {
                return None;
            }

            state = match deadline {
                None => self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.changed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Block until the buffer is closed or the timeout elapses.
    ///
    /// Returns `true` when the buffer is closed.
    pub fn wait_closed(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        while !state.closed {
            state = match deadline {
                None => self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.changed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        true
    }

    /// Blocking iterator over lines as they arrive; ends when the buffer closes
    pub fn iter(&self) -> Lines<'_> {
        Lines {
            buffer: self,
            next: 0,
        }
    }
}

/// Iterator returned by [`OutputBuffer::iter`]
pub struct Lines<'a> {
    buffer: &'a OutputBuffer,
    next: usize,
}

impl Iterator for Lines<'_> {
    type Item = OutputLine;

    fn next(&mut self) -> Option<OutputLine> {
        let line = self.buffer.wait_for(self.next, None)?;
        self.next += 1;
        Some(line)
    }
}
