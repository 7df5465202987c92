//! Toast presentation settings.

use pk_core::PageError;
use pk_core::PageResult;
use serde::Deserialize;
use std::time::Duration;

/// Markers, glyphs, and timings applied to every toast.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub container_id: String,
    pub container_class: String,
    pub entry_class: String,
    pub error_class: String,
    pub body_class: String,
    pub dismiss_class: String,
    pub dismiss_label: String,
    pub success_icon: String,
    pub error_icon: String,
    /// Time from creation until the exit transition starts.
    pub display_ms: u64,
    /// Time from the exit transition until removal.
    pub exit_transition_ms: u64,
    /// When false, messages are inserted as escaped text instead of markup.
    pub render_markup: bool,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            container_id: "toast-container".to_owned(),
            container_class: "toast-container".to_owned(),
            entry_class: "acid-toast".to_owned(),
            error_class: "error".to_owned(),
            body_class: "toast-body".to_owned(),
            dismiss_class: "toast-dismiss".to_owned(),
            dismiss_label: "[X]".to_owned(),
            success_icon: "\u{2705}".to_owned(),
            error_icon: "\u{26A0}\u{FE0F}".to_owned(),
            display_ms: 3000,
            exit_transition_ms: 300,
            render_markup: true,
        }
    }
}

impl ToastConfig {
    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display_ms)
    }

    pub fn exit_transition(&self) -> Duration {
        Duration::from_millis(self.exit_transition_ms)
    }

    pub fn validate(&self) -> PageResult<()> {
        ensure_marker("container_id", &self.container_id)?;
        ensure_marker("container_class", &self.container_class)?;
        ensure_marker("entry_class", &self.entry_class)?;
        ensure_marker("error_class", &self.error_class)?;
        ensure_marker("body_class", &self.body_class)?;
        ensure_marker("dismiss_class", &self.dismiss_class)?;

        if self.entry_class == self.error_class {
            return Err(PageError::new(
                "toast.config.marker_conflict",
                "entry_class and error_class must differ",
            ));
        }

        Ok(())
    }
}

fn ensure_marker(field: &str, value: &str) -> PageResult<()> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(PageError::new(
            "toast.config.marker_invalid",
            format!("`{field}` must be non-empty without whitespace, got `{value}`"),
        ));
    }

    Ok(())
}
