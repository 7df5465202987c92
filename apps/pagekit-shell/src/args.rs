use pk_net::CredentialsMode;
use pk_net::HttpMethod;
use pk_net::RequestConfig;
use std::path::PathBuf;

pub(crate) const USAGE: &str = "usage: pagekit-shell <url> [--base <url>] [--method <name>] \
[--header <name:value>]... [--body <text>] [--credentials omit|same-origin|include] \
[--config <path.toml>] [--no-wait]";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShellArgs {
    pub(crate) url: String,
    pub(crate) base_url: Option<String>,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) request: RequestConfig,
    pub(crate) wait_for_dismissal: bool,
}

impl ShellArgs {
    pub(crate) fn from_env() -> Result<Self, String> {
        Self::parse(std::env::args().skip(1))
    }

    pub(crate) fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut url: Option<String> = None;
        let mut base_url = None;
        let mut config_path = None;
        let mut request = RequestConfig::default();
        let mut wait_for_dismissal = true;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base" => base_url = Some(value_for(&mut args, "--base")?),
                "--config" => config_path = Some(PathBuf::from(value_for(&mut args, "--config")?)),
                "--method" => {
                    let name = value_for(&mut args, "--method")?;
                    request.method = HttpMethod::from_name(&name).map_err(|error| error.message)?;
                }
                "--header" => {
                    let raw = value_for(&mut args, "--header")?;
                    let (name, value) = raw
                        .split_once(':')
                        .ok_or_else(|| format!("header `{raw}` must look like `name:value`"))?;
                    request = request.header(name.trim(), value.trim());
                }
                "--body" => request = request.body(value_for(&mut args, "--body")?),
                "--credentials" => {
                    let name = value_for(&mut args, "--credentials")?;
                    request.credentials =
                        CredentialsMode::from_name(&name).map_err(|error| error.message)?;
                }
                "--no-wait" => wait_for_dismissal = false,
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown option `{flag}`"));
                }
                _ => {
                    if url.replace(arg.clone()).is_some() {
                        return Err(format!("unexpected extra argument `{arg}`"));
                    }
                }
            }
        }

        let url = url.ok_or_else(|| "missing request URL".to_owned())?;
        Ok(Self {
            url,
            base_url,
            config_path,
            request,
            wait_for_dismissal,
        })
    }
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("missing value after {flag}"))
}
