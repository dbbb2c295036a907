// Remote commit journal format.
//
// The journal is an append-only UTF-8 document. Each entry is a blank line,
// `[<ISO-8601 timestamp>]`, a blank line, then the message. Entries carry no
// other delimiter, so readers must treat the whole document as free text.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::CommitRecord;

/// Formats a timestamp the way journal entries record it:
/// RFC 3339, UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Renders a single entry, including its leading newline.
pub fn render_entry(record: &CommitRecord) -> String {
    format!("\n[{}]\n\n{}", record.timestamp_iso, record.message)
}

/// Returns `existing` with `record` appended.
pub fn append_entry(existing: &str, record: &CommitRecord) -> String {
    let mut body = String::with_capacity(existing.len() + record.message.len() + 32);
    body.push_str(existing);
    body.push_str(&render_entry(record));
    body
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(message: &str) -> CommitRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        CommitRecord::new(format_timestamp(at), message).unwrap()
    }

    #[test]
    fn timestamp_matches_millisecond_utc_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_timestamp(at), "2024-03-09T14:05:07.000Z");
    }

    #[test]
    fn append_to_empty_document_is_exactly_one_entry() {
        let body = append_entry("", &record("feat: add parser"));
        assert_eq!(body, "\n[2024-03-09T14:05:07.000Z]\n\nfeat: add parser");
    }

    #[test]
    fn append_keeps_existing_text_verbatim() {
        let existing = "\n[2024-03-08T10:00:00.000Z]\n\nfirst";
        let body = append_entry(existing, &record("second"));
        assert!(body.starts_with(existing));
        assert!(body.ends_with("\n[2024-03-09T14:05:07.000Z]\n\nsecond"));
    }
}
