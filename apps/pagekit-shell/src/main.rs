mod args;
mod config;

use args::ShellArgs;
use args::USAGE;
use config::ShellConfig;
use pk_core::PageResult;
use pk_dom::Document;
use pk_dom::SharedDocument;
use pk_net::FetchConfig;
use pk_net::FetchError;
use pk_net::GuardedFetch;
use pk_net::ReqwestTransport;
use pk_net::RequestConfig;
use pk_net::Transport;
use pk_toast::ToastConfig;
use pk_toast::ToastPresenter;
use pk_toast::ToastSurface;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("pagekit-shell: failed to install log subscriber: {error}");
    }

    let args = match ShellArgs::from_env() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("pagekit-shell: {error}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("pagekit-shell: failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("pagekit-shell: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ShellArgs) -> Result<ExitCode, String> {
    let mut config = match &args.config_path {
        Some(path) => ShellConfig::load(path).map_err(|error| error.to_string())?,
        None => ShellConfig::default(),
    };
    if args.base_url.is_some() {
        config.fetch.base_url = args.base_url.clone();
    }

    let page = ShellPage::new(&config.toast).map_err(|error| error.to_string())?;
    let result = page
        .fetch(ReqwestTransport::new(), &config.fetch, &args.url, &args.request)
        .await
        .map_err(|error| error.to_string())?;

    let code = match &result {
        Ok(value) => {
            let rendered = serde_json::to_string_pretty(value).map_err(|error| error.to_string())?;
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("{}", describe_failure(error));
            ExitCode::FAILURE
        }
    };

    println!("{}", page.markup());

    if args.wait_for_dismissal && page.presenter.next_deadline().is_some() {
        page.settle().await;
        println!("{}", page.markup());
    }

    Ok(code)
}

/// Document and toast presenter for one shell invocation.
struct ShellPage {
    document: SharedDocument,
    presenter: ToastPresenter,
}

impl ShellPage {
    fn new(toast: &ToastConfig) -> PageResult<Self> {
        let document = Document::new("pagekit shell").into_shared();
        let surface = ToastSurface::new(document.clone(), toast);
        let presenter = ToastPresenter::new(surface, toast.clone())?;
        Ok(Self {
            document,
            presenter,
        })
    }

    /// Runs one guarded fetch. Failure toasts start their display window when
    /// the fetch settles, however long the request took.
    async fn fetch<T: Transport>(
        &self,
        transport: T,
        config: &FetchConfig,
        url: &str,
        request: &RequestConfig,
    ) -> PageResult<Result<serde_json::Value, FetchError>> {
        let fetch = GuardedFetch::new(transport, &self.presenter, config)?;
        Ok(fetch.fetch_json(url, request).await)
    }

    /// Sleeps through every pending toast step until nothing is scheduled.
    async fn settle(&self) {
        while let Some(wait) = self.presenter.next_deadline() {
            tokio::time::sleep(wait).await;
            self.presenter.advance(wait);
        }
    }

    fn markup(&self) -> String {
        let document = self.document.borrow();
        document.outer_html(document.body())
    }
}

fn describe_failure(error: &FetchError) -> String {
    match error.status() {
        Some(status) => format!("request failed [{}] with status {status}", error.code()),
        None => format!("request failed [{}]: {error}", error.code()),
    }
}
