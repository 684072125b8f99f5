pub mod config;
pub mod download;
pub mod list;
pub mod remove;
pub mod serve;
pub mod upload;
pub mod url;

use najie_core::Envelope;

/// Turn a failure envelope into a command error, prefixed with what failed.
pub(crate) fn require_ok<T>(envelope: Envelope<T>, what: &str) -> anyhow::Result<T> {
    envelope
        .into_result()
        .map_err(|e| anyhow::anyhow!("{what} failed: {e}"))
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 / 2), "1.5 GB");
    }

    #[test]
    fn failure_envelope_becomes_error() {
        let err = require_ok(Envelope::<()>::failure("NoSuchKey"), "Download").unwrap_err();
        assert_eq!(err.to_string(), "Download failed: NoSuchKey");
        assert_eq!(require_ok(Envelope::Ok(7), "List").unwrap(), 7);
    }
}
