use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies whose logs are dropped unless the level is Trace
const FILTERED_MODULES: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls", "mio", "want"];

/// Default level: Debug in development builds, Info in release builds
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initializes the global terminal logger.
///
/// Logs go to stderr so stdout stays free for event output.
pub fn init_logger(level: LevelFilter) {
    let config = build_log_config(level != LevelFilter::Trace);

    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Logger already initialised: {}", e);
    }
}

fn build_log_config(apply_filters: bool) -> simplelog::Config {
    let mut builder = ConfigBuilder::new();
    builder.set_time_format_rfc3339();

    if apply_filters {
        for &module in FILTERED_MODULES {
            builder.add_filter_ignore_str(module);
        }
    }

    builder.build()
}
