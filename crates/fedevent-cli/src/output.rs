//! Output formatting utilities.

use fedevent_core::RoomVersionDescriptor;
use serde_json::Value;

/// Formats a value as pretty JSON.
pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a room version as a table row.
pub fn format_version_row(version: &str, desc: &RoomVersionDescriptor) -> String {
    format!(
        "{:<8} {:<10} {:<7} {:<10} {:<20} {}",
        truncate(version, 8),
        format!("{:?}", desc.state_res),
        format!("{:?}", desc.event_format),
        if desc.stable { "stable" } else { "unstable" },
        format!("{:?}", desc.event_id_format),
        desc.strict_validity_checking
    )
}

/// Prints the room version table header.
#[allow(clippy::print_literal)]
pub fn print_version_header() {
    println!(
        "{:<8} {:<10} {:<7} {:<10} {:<20} {}",
        "VERSION", "STATE_RES", "FORMAT", "STABILITY", "EVENT_ID_FORMAT", "STRICT"
    );
    println!("{}", "-".repeat(70));
}

/// Prints an event summary as `key: value` lines.
pub fn print_summary(summary: &Value) {
    let Some(fields) = summary.as_object() else {
        return;
    };
    for (key, value) in fields {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            Value::Array(items) if items.is_empty() => "-".to_string(),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        println!("{:<18} {}", format!("{}:", key), rendered);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}
