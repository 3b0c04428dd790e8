use log::{info, LevelFilter};
use std::path::Path;

// For file-based logging with rotation
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::store::{RecordUpdate, TagPatchMode};

/// Initialize the logger with timestamp, log level, and module path.
/// Logs are written to file only so they do not interfere with the progress bar.
pub fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;
    let level = effective_level(level);

    let log_file_path = log_dir.join("scene-dedupe.log");
    let archived_logs_pattern = format!("{}/scene-dedupe.{{}}.log", log_dir.display());

    // Rotate at 10MB
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);

    // Keep 5 archived log files
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern, 5)
        .map_err(|e| format!("Failed to create log roller: {}", e))?;

    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(&log_file_path, Box::new(compound_policy))
        .map_err(|e| format!("Failed to create log appender: {}", e))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(Root::builder().appender("file").build(level))
        .map_err(|e| format!("Failed to build log config: {}", e))?;

    log4rs::init_config(config).map_err(|e| format!("Failed to initialize log4rs: {}", e))?;

    info!("Scene dedupe started");
    info!("Logging to file: {}", log_file_path.display());
    Ok(())
}

/// The configured level, unless `SCENE_DEDUPE_LOG` names a valid one
fn effective_level(configured: LevelFilter) -> LevelFilter {
    std::env::var("SCENE_DEDUPE_LOG")
        .ok()
        .and_then(|filter| filter.trim().parse::<LevelFilter>().ok())
        .unwrap_or(configured)
}

/// Log a mutation sent (or, in a dry run, not sent) to the scene store
pub fn log_mutation(update: &RecordUpdate, dry_run: bool) {
    let mut details = Vec::new();
    if let Some(title) = &update.title {
        details.push(format!("Title: {}", title));
    }
    if let Some(patch) = &update.tags {
        let mode = match patch.mode {
            TagPatchMode::Add => "add",
            TagPatchMode::Remove => "remove",
        };
        details.push(format!("Tags: {} {:?}", mode, patch.ids));
    }

    info!(
        "{}STORE CHANGE - Scenes: {:?}{}",
        if dry_run { "[DRY RUN] " } else { "" },
        update.ids,
        if details.is_empty() {
            "".to_string()
        } else {
            format!(", {}", details.join(", "))
        }
    );
}
