//! Logging and tracing initialization.
//!
//! `file` picks where lines go and `json` picks their format; the two are
//! independent. `RUST_LOG` overrides `level`.

use std::sync::Mutex;

use tracing::Dispatch;

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber with the given configuration.
pub fn init_logging(config: &LoggingConfig) {
    tracing::dispatcher::set_global_default(build_dispatch(config)).ok();
}

/// Build the subscriber described by `config` without installing it.
pub fn build_dispatch(config: &LoggingConfig) -> Dispatch {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file = config.file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("Failed to open log file {}: {e}", path.display()))
            .ok()
    });

    let builder = fmt::Subscriber::builder().with_env_filter(env_filter);
    match (file, config.json) {
        (Some(file), true) => Dispatch::new(
            builder
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish(),
        ),
        (Some(file), false) => Dispatch::new(
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish(),
        ),
        (None, true) => Dispatch::new(builder.json().finish()),
        (None, false) => Dispatch::new(
            builder
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_lines(json: bool) -> Vec<String> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photoglow.log");
        let config = LoggingConfig {
            level: "info".to_string(),
            json,
            file: Some(path.clone()),
        };

        let dispatch = build_dispatch(&config);
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(track = 3, "Export started");
        });
        drop(dispatch);

        std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_json_file_output() {
        let lines = logged_lines(true);
        assert_eq!(lines.len(), 1);

        let entry: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(entry["fields"]["message"], "Export started");
        assert_eq!(entry["fields"]["track"], 3);
    }

    #[test]
    fn test_plain_file_output() {
        let lines = logged_lines(false);
        assert_eq!(lines.len(), 1);
        assert!(serde_json::from_str::<serde_json::Value>(&lines[0]).is_err());
        assert!(lines[0].contains("Export started"));
        assert!(lines[0].contains("track=3"));
    }
}
