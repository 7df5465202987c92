//! Shared primitives used across pagekit crates.

use core::fmt;

/// Result alias used across the workspace.
pub type PageResult<T> = Result<T, PageError>;

/// Boundary validation error with a stable dotted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub code: &'static str,
    pub message: String,
}

impl PageError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns true when the code lives under `prefix` (e.g. `"net.url"`).
    pub fn is_in(&self, prefix: &str) -> bool {
        self.code == prefix
            || self
                .code
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PageError {}

#[cfg(test)]
mod tests {
    use super::PageError;

    #[test]
    fn display_includes_code_and_message() {
        let error = PageError::new("net.url.invalid", "bad url");
        assert_eq!(error.to_string(), "net.url.invalid: bad url");
    }

    #[test]
    fn prefix_match_respects_segments() {
        let error = PageError::new("net.url.invalid", "bad url");
        assert!(error.is_in("net"));
        assert!(error.is_in("net.url"));
        assert!(error.is_in("net.url.invalid"));
        assert!(!error.is_in("net.ur"));
        assert!(!error.is_in("dom"));
    }
}
