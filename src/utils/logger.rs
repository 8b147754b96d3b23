use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "stats_notifier=info";
const VERBOSE_DIRECTIVE: &str = "stats_notifier=debug,info";

/// `RUST_LOG` wins over the built-in directives.
fn env_filter(verbose: bool) -> EnvFilter {
    let directive = if verbose { VERBOSE_DIRECTIVE } else { DEFAULT_DIRECTIVE };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

pub fn init_cli_logger(verbose: bool) {
    let layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .init();
}

/// 排程器 (cron / CI) 收集日誌時使用 JSON 格式
pub fn init_json_logger(verbose: bool) {
    let layer = fmt::layer().with_target(false).json().with_current_span(false);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .init();
}

/// `LOG_FORMAT=json` switches to the JSON formatter.
pub fn init(verbose: bool) {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        init_json_logger(verbose);
    } else {
        init_cli_logger(verbose);
    }
}
