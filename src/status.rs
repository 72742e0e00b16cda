//! Run state and the status line.
//!
//! The bottom row of a form shows the cursor position, the type of the
//! focused field and the lock-key indicators. The input loop redraws the
//! whole line after every key; a [`StatusThread`] polls the lock keys in
//! between and repaints only the indicator region when it changes.

use crate::color::ColorPair;
use crate::error::Result;
use crate::screen::ScreenBuffer;
use crate::shared::SharedScreen;
use crate::types::{Coord, LockKeys, ScreenPoint};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// ============================================================================
// Run state
// ============================================================================

/// Lifecycle of a running form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Not running, or asked to finish.
    #[default]
    Stopped,
    /// A key is being dispatched.
    Paused,
    /// Waiting for the next key.
    Running,
}

impl RunState {
    const fn to_bits(self) -> u8 {
        match self {
            RunState::Stopped => 0,
            RunState::Paused => 1,
            RunState::Running => 2,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => RunState::Paused,
            2 => RunState::Running,
            _ => RunState::Stopped,
        }
    }
}

/// A [`RunState`] shared between threads.
#[derive(Clone, Debug, Default)]
pub struct SharedRunState {
    inner: Arc<AtomicU8>,
}

impl SharedRunState {
    /// Create a shared state holding `state`.
    pub fn new(state: RunState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(state.to_bits())),
        }
    }

    /// The current state.
    pub fn get(&self) -> RunState {
        RunState::from_bits(self.inner.load(Ordering::Acquire))
    }

    /// Replace the state.
    pub fn set(&self, state: RunState) {
        self.inner.store(state.to_bits(), Ordering::Release);
    }
}

// ============================================================================
// Status line
// ============================================================================

/// Width of the lock-key indicator region at the right of the status line.
pub const LOCK_REGION_WIDTH: usize = 17;

/// Text of the lock-key indicator region.
pub fn lock_indicator(locks: LockKeys) -> String {
    let flag = |key: LockKeys, label: &'static str| {
        if locks.contains(key) {
            label.to_string()
        } else {
            " ".repeat(label.len())
        }
    };
    let mode = if locks.contains(LockKeys::INSERT) {
        "INS"
    } else {
        "OVR"
    };
    format!(
        "{} {} {} {}",
        flag(LockKeys::CAPS, "CAPS"),
        flag(LockKeys::NUM, "NUM"),
        flag(LockKeys::SCROLL, "SCRL"),
        mode
    )
}

fn lock_origin(screen: &ScreenBuffer) -> ScreenPoint {
    let size = screen.size();
    ScreenPoint::new(
        (size.width - LOCK_REGION_WIDTH as Coord).max(0),
        size.height - 1,
    )
}

/// Repaint the lock-key region, leaving the cursor where it was.
pub fn draw_locks(screen: &mut ScreenBuffer, color: ColorPair) -> Result<LockKeys> {
    let locks = screen.lock_keys();
    let saved = screen.get_cursor();
    let origin = lock_origin(screen);
    screen.write_at(origin, &lock_indicator(locks), color)?;
    screen.set_cursor(saved)?;
    Ok(locks)
}

/// Redraw the whole status line for a cursor at `cursor` in a field of
/// type `kind`, leaving the cursor where it was.
pub fn draw_status(
    screen: &mut ScreenBuffer,
    cursor: ScreenPoint,
    kind: Option<&str>,
    color: ColorPair,
) -> Result<LockKeys> {
    let size = screen.size();
    let saved = screen.get_cursor();
    let row = size.height - 1;
    let position = format!(" Ln {}, Col {}", cursor.y + 1, cursor.x + 1);
    let line = format!("{:<20}{}", position, kind.unwrap_or(""));
    let width = (size.width.max(0) as usize).saturating_sub(LOCK_REGION_WIDTH);
    let line: String = format!("{:<width$}", line, width = width)
        .chars()
        .take(width)
        .collect();
    screen.write_at(ScreenPoint::new(0, row), &line, color)?;
    screen.set_cursor(saved)?;
    draw_locks(screen, color)
}

/// Prompt on the status line, leaving the cursor after the question.
pub fn draw_prompt(screen: &mut ScreenBuffer, question: &str, color: ColorPair) -> Result<()> {
    let size = screen.size();
    let text = format!(" {} (Y/N) ", question);
    let line = format!("{:<width$}", text, width = size.width.max(0) as usize);
    let row = size.height - 1;
    screen.write_at(ScreenPoint::new(0, row), &line, color)?;
    screen.set_cursor(ScreenPoint::new(text.chars().count() as Coord, row))?;
    Ok(())
}

// ============================================================================
// Status thread
// ============================================================================

/// Background thread keeping the lock-key indicators current.
#[derive(Debug)]
pub struct StatusThread {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatusThread {
    /// Start polling every `interval`.
    ///
    /// The thread only paints while the state is [`RunState::Running`] and
    /// exits once it becomes [`RunState::Stopped`] or [`StatusThread::stop`]
    /// is called.
    pub fn spawn(
        screen: SharedScreen,
        state: SharedRunState,
        interval: Duration,
        color: ColorPair,
        initial: LockKeys,
    ) -> Result<Self> {
        let (stop, wake) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("screenform-status".to_string())
            .spawn(move || {
                tracing::debug!(?interval, "status thread started");
                let mut shown = initial;
                loop {
                    match wake.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    match state.get() {
                        RunState::Stopped => break,
                        RunState::Paused => continue,
                        RunState::Running => {}
                    }
                    let polled = screen.try_use_screen(|s| {
                        if s.lock_keys() == shown {
                            Ok(shown)
                        } else {
                            draw_locks(s, color)
                        }
                    });
                    match polled {
                        Some(Ok(locks)) => shown = locks,
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "status refresh failed");
                            break;
                        }
                        None => {}
                    }
                }
                tracing::debug!("status thread stopped");
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("status thread panicked");
            }
        }
    }
}

impl Drop for StatusThread {
    fn drop(&mut self) {
        self.stop();
    }
}
