use log::LevelFilter;
use simplelog::{ConfigBuilder, SimpleLogger};

/// Initializes the process-wide logger. Debug level outside production,
/// records filtered to this crate and the access log.
pub fn setup_simple_logger(is_prod: bool) -> anyhow::Result<()> {
    let logger_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("wa_amo_bridge")
        .add_filter_allow_str("ntex::web")
        .build();

    let level = if is_prod {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    };

    Ok(SimpleLogger::init(level, logger_config)?)
}
