//! Wall-clock helpers for naming export artifacts.

use chrono::Utc;

/// Milliseconds since the Unix epoch, the identifier used in export names.
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Build the file name of an exported video: `<prefix><millis>.mp4`.
pub fn export_file_name(prefix: &str, millis: i64) -> String {
    format!("{prefix}{millis}.mp4")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("Status_", 1_700_000_000_123),
            "Status_1700000000123.mp4"
        );
    }

    #[test]
    fn test_unix_millis_is_recent() {
        // 2023-11-14, well before any run of this test
        assert!(unix_millis() > 1_700_000_000_000);
    }
}
