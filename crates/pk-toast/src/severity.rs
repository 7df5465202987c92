//! Notification severity.

/// Visual treatment of a toast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    #[default]
    Success,
    Error,
}

impl Severity {
    /// Maps a free-form severity name; anything other than `"error"` is a success.
    pub fn from_name(name: &str) -> Self {
        if name == "error" {
            Self::Error
        } else {
            Self::Success
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl From<&str> for Severity {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}
