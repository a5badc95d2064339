//! Alert banner state for one Board viewer.
//!
//! The banner shows the active alert until the viewer dismisses it. A
//! dismissed message stays hidden for the rest of the viewer's session even
//! if it is broadcast again; a different message shows normally.

use std::collections::HashSet;

pub type DismissCallback = Box<dyn FnMut(&str) + Send>;

pub struct AlertBanner {
    message: Option<String>,
    visible: bool,
    dismissed: HashSet<String>,
    on_dismiss: Option<DismissCallback>,
}

impl AlertBanner {
    #[must_use]
    pub fn new() -> Self {
        Self { message: None, visible: false, dismissed: HashSet::new(), on_dismiss: None }
    }

    /// Banner that invokes `on_dismiss` with the message each time it is
    /// actually dismissed.
    #[must_use]
    pub fn with_callback(on_dismiss: impl FnMut(&str) + Send + 'static) -> Self {
        Self { on_dismiss: Some(Box::new(on_dismiss)), ..Self::new() }
    }

    /// Show `message`. Returns whether the banner is now showing it.
    pub fn show(&mut self, message: &str) -> bool {
        if self.dismissed.contains(message) {
            return false;
        }
        self.message = Some(message.to_owned());
        self.visible = true;
        true
    }

    /// Hide the banner. Returns `false` (and skips the callback) if it was
    /// already hidden.
    pub fn dismiss(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        let Some(message) = self.message.as_deref() else {
            return true;
        };
        self.dismissed.insert(message.to_owned());
        if let Some(callback) = self.on_dismiss.as_mut() {
            callback(message);
        }
        true
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The message currently on screen, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        if self.is_visible() { self.message.as_deref() } else { None }
    }
}

impl Default for AlertBanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "banner_test.rs"]
mod tests;
