//! Callbacks from the session to whatever front-end drives it.
//!
//! The session never renders anything itself. It tells the host when the
//! geometry changed and when there is a new status line to show.
//!
//! # Example
//!
//! ```
//! use chisel::session::{Notice, Notifier};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let notifier = Notifier::new(move |notice| sink.lock().unwrap().push(notice.clone()));
//!
//! notifier.status("Anchor set");
//! assert_eq!(seen.lock().unwrap()[0], Notice::Status("Anchor set".into()));
//! ```

/// Something the host should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Vertex positions or topology changed; redraw the surface.
    Redraw,
    /// New status-line text.
    Status(String),
}

/// A notification callback.
pub struct Notifier {
    callback: Box<dyn Fn(&Notice) + Send + Sync>,
}

impl Notifier {
    /// Create a notifier with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Notice) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Deliver a notice.
    #[inline]
    pub fn notify(&self, notice: Notice) {
        (self.callback)(&notice);
    }

    /// Request a redraw.
    #[inline]
    pub fn redraw(&self) {
        self.notify(Notice::Redraw);
    }

    /// Publish a status line.
    pub fn status(&self, text: impl Into<String>) {
        self.notify(Notice::Status(text.into()));
    }

    /// A notifier that discards everything.
    pub fn none() -> Self {
        Self::new(|_| {})
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
