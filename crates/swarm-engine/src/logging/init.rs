use std::sync::Once;

/// Directives used when neither the config nor `RUST_LOG` names a filter.
///
/// Swarm crates log lifecycle events (construction, spawns, growth) at
/// `info`/`debug`; everything else is held to `warn`.
pub const DEFAULT_FILTER: &str = "warn,swarm_storage=info,swarm_curves=info,swarm_engine=info";

/// Directive that enables the per-frame trace emitted by `step_frame`.
const FRAME_TRACE: &str = "swarm_engine::swarm=trace";

/// Logger configuration for swarm binaries.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Explicit `env_logger` directives. Overrides `RUST_LOG`.
    pub filter: Option<String>,
    /// Also log every submitted frame. Appended after the base filter.
    pub frame_trace: bool,
    /// ANSI coloring behaviour.
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            frame_trace: false,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Directives the logger is built from.
///
/// `env` is the value of `RUST_LOG`, if any.
pub fn resolve_filter(config: &LoggingConfig, env: Option<&str>) -> String {
    let base = config
        .filter
        .as_deref()
        .or(env.filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_FILTER);
    if config.frame_trace {
        format!("{base},{FRAME_TRACE}")
    } else {
        base.to_owned()
    }
}

static INIT: Once = Once::new();

/// Install `env_logger` behind the `log` facade.
///
/// Only the first call in a process has any effect, and a logger installed
/// elsewhere first is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let env = std::env::var("RUST_LOG").ok();
        let filter = resolve_filter(&config, env.as_deref());

        let installed = env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .format_timestamp_millis()
            .try_init()
            .is_ok();
        if installed {
            log::debug!("logging initialized with `{filter}`");
        }
    });
}
