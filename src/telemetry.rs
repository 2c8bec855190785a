use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging on stderr.
///
/// JSON output by default; `pretty` switches to the human readable formatter
/// for local runs. `RUST_LOG` replaces the default `info` level when set.
pub fn init_telemetry(pretty: bool) -> Result<()> {
    let filter = log_filter(&std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default());

    if pretty {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("Backport telemetry initialized");
    Ok(())
}

fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Generate a correlation ID for linking the logs of one run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering a whole invocation
pub fn create_run_span(pr_number: u64, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "backport_run",
        pr.number = pr_number,
        correlation.id = correlation_id,
    )
}

/// Span covering the attempt for one base branch
pub fn create_backport_span(base: &str, head: &str, pr_number: u64, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "backport_target",
        base = base,
        head = head,
        pr.number = pr_number,
        correlation.id = correlation_id,
    )
}

/// Folds the enclosed output into a collapsible group in GitHub Actions logs.
///
/// Prints nothing outside of Actions. The group closes on drop.
#[must_use = "the group closes as soon as the guard is dropped"]
pub struct LogGroup {
    active: bool,
}

impl LogGroup {
    pub fn start(title: &str) -> Self {
        let active = std::env::var_os("GITHUB_ACTIONS").is_some();
        if active {
            eprintln!("::group::{title}");
        }
        Self { active }
    }
}

impl Drop for LogGroup {
    fn drop(&mut self) {
        if self.active {
            eprintln!("::endgroup::");
        }
    }
}
