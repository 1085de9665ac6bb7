//! Human-readable byte counts for limits shown to people.

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Format a byte count in IEC units, dropping trailing zeros (`2097152` → `2 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    let mut unit_index = 0;
    let mut scale = 1u64;
    while unit_index + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit_index += 1;
    }

    if bytes % scale == 0 {
        return format!("{} {}", bytes / scale, UNITS[unit_index]);
    }

    let value = bytes as f64 / scale as f64;
    let mut rendered = format!("{value:.2}");
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    format!("{rendered} {}", UNITS[unit_index])
}
