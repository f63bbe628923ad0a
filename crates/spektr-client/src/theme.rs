//! Presentation side effect for the active theme.
//!
//! The session reflects its theme to whatever renders the UI. The default
//! sink is a [`ThemeHandle`], a watch channel the rendering layer can
//! subscribe to in place of a document-level `data-theme` attribute.

use std::sync::Arc;

use tokio::sync::watch;

use spektr_shared::Theme;

/// Receives the theme every time the session applies one.
pub trait ThemeSink: Send + Sync {
    fn apply(&self, theme: Theme);
}

#[derive(Debug, Clone)]
pub struct ThemeHandle {
    tx: Arc<watch::Sender<Theme>>,
}

impl ThemeHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Theme::default());
        Self { tx: Arc::new(tx) }
    }

    /// The theme currently applied.
    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }
}

impl Default for ThemeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeSink for ThemeHandle {
    fn apply(&self, theme: Theme) {
        // send_replace keeps the value even with no receivers.
        let previous = self.tx.send_replace(theme);
        if previous != theme {
            tracing::debug!(%theme, "theme applied");
        }
    }
}
