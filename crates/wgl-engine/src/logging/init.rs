/// Filter used when neither the caller nor `RUST_LOG` sets one.
///
/// wgpu and naga log adapter probing and shader translation at `info`.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// How the process logger is set up.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. `"debug,wgl::console=warn"`.
    /// Takes precedence over `RUST_LOG`.
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Installs `env_logger` as the process logger.
///
/// Only the first call in a process has any effect; later calls, or a logger
/// installed by someone else, leave the existing one in place.
pub fn init_logging(config: LoggingConfig) {
    let env = std::env::var("RUST_LOG").ok();
    let filter = filter_directives(config.env_filter.as_deref(), env.as_deref());

    let installed = env_logger::Builder::new()
        .parse_filters(filter)
        .write_style(config.write_style)
        .try_init();

    match installed {
        Ok(()) => log::debug!("logger installed with filter `{filter}`"),
        Err(_) => log::trace!("logger already installed"),
    }
}

fn filter_directives<'a>(explicit: Option<&'a str>, env: Option<&'a str>) -> &'a str {
    explicit
        .or(env)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(filter_directives(Some("debug"), Some("warn")), "debug");
    }

    #[test]
    fn environment_is_next() {
        assert_eq!(filter_directives(None, Some("wgl=trace")), "wgl=trace");
    }

    #[test]
    fn default_quiets_the_gpu_stack() {
        assert_eq!(filter_directives(None, None), DEFAULT_FILTER);
        assert!(DEFAULT_FILTER.contains("wgpu_core=warn"));
    }

    #[test]
    fn blank_filter_falls_back_to_default() {
        assert_eq!(filter_directives(Some("  "), None), DEFAULT_FILTER);
    }
}
