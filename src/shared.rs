//! # Shared screen access
//!
//! The input loop and the status thread both paint the terminal. Every
//! write goes through [`SharedScreen`], which serialises access to the one
//! [`ScreenBuffer`] with a mutex.
//!
//! ## Example
//!
//! ```rust
//! use screenform::{HeadlessDriver, ScreenBuffer, ScreenPoint, ScreenSize, SharedScreen};
//! use screenform::color::ColorPair;
//!
//! let driver = HeadlessDriver::new(ScreenSize::new(20, 5));
//! let screen = SharedScreen::new(ScreenBuffer::new(Box::new(driver.clone())));
//!
//! let worker = screen.clone();
//! std::thread::spawn(move || {
//!     worker.use_screen(|s| s.write_at(ScreenPoint::new(0, 4), "ready", ColorPair::default()))
//! })
//! .join()
//! .unwrap()
//! .unwrap();
//!
//! assert_eq!(driver.text_at(ScreenPoint::new(0, 4), 5), "ready");
//! ```

use crate::error::{Error, Result};
use crate::screen::ScreenBuffer;
use std::sync::{Arc, Mutex};

/// A thread-safe handle to a [`ScreenBuffer`].
#[derive(Clone)]
pub struct SharedScreen {
    inner: Arc<Mutex<ScreenBuffer>>,
}

impl SharedScreen {
    /// Wrap a screen buffer.
    pub fn new(screen: ScreenBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(screen)),
        }
    }

    /// Execute a function with exclusive access to the screen.
    ///
    /// Fails with [`Error::LockPoisoned`] if another thread panicked while
    /// holding the lock.
    pub fn use_screen<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ScreenBuffer) -> Result<T>,
    {
        let mut guard = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        f(&mut guard)
    }

    /// Try to execute a function with exclusive access to the screen.
    ///
    /// Returns `None` if the lock cannot be acquired immediately.
    pub fn try_use_screen<F, T>(&self, f: F) -> Option<Result<T>>
    where
        F: FnOnce(&mut ScreenBuffer) -> Result<T>,
    {
        self.inner.try_lock().ok().map(|mut guard| f(&mut guard))
    }
}
