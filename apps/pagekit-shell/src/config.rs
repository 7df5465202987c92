use pk_core::PageError;
use pk_core::PageResult;
use pk_net::FetchConfig;
use pk_toast::ToastConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings file layout: a `[toast]` table and a `[fetch]` table, both optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct ShellConfig {
    pub(crate) toast: ToastConfig,
    pub(crate) fetch: FetchConfig,
}

impl ShellConfig {
    pub(crate) fn load(path: &Path) -> PageResult<Self> {
        let raw = fs::read_to_string(path).map_err(|error| {
            PageError::new(
                "config.read_failed",
                format!("failed reading config `{}`: {error}", path.display()),
            )
        })?;

        Self::parse(&raw).map_err(|error| {
            PageError::new(
                error.code,
                format!("{} ({})", error.message, path.display()),
            )
        })
    }

    pub(crate) fn parse(raw: &str) -> PageResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|error| {
            PageError::new("config.parse_failed", format!("invalid config: {error}"))
        })?;

        config.toast.validate()?;
        config.fetch.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::ShellConfig;
    use std::path::Path;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(ShellConfig::parse(""), Ok(ShellConfig::default()));
    }

    #[test]
    fn reads_both_tables() {
        let raw = r#"
            [toast]
            display_ms = 5000
            render_markup = false

            [fetch]
            base_url = "http://localhost:5000/"
        "#;
        let config = match ShellConfig::parse(raw) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(config.toast.display_ms, 5000);
        assert!(!config.toast.render_markup);
        assert_eq!(config.toast.exit_transition_ms, 300);
        assert_eq!(config.fetch.base_url.as_deref(), Some("http://localhost:5000/"));
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_marker = ShellConfig::parse("[toast]\nentry_class = \"a b\"\n");
        assert!(bad_marker.is_err_and(|error| error.code == "toast.config.marker_invalid"));

        let bad_base = ShellConfig::parse("[fetch]\nbase_url = \"nope\"\n");
        assert!(bad_base.is_err_and(|error| error.code == "config.fetch.base_url_invalid"));

        let bad_toml = ShellConfig::parse("[toast\n");
        assert!(bad_toml.is_err_and(|error| error.code == "config.parse_failed"));
    }

    #[test]
    fn missing_file_reports_read_failure() {
        let loaded = ShellConfig::load(Path::new("/nonexistent/pagekit.toml"));
        assert!(loaded.is_err_and(|error| error.code == "config.read_failed"));
    }
}
