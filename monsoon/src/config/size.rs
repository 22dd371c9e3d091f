//! Human-readable byte sizes (`512KB`, `256MB`, `2GB`).

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Parses a size with an optional `B`, `KB`, `MB` or `GB` suffix.
///
/// Suffixes are case-insensitive and may be separated by whitespace.
/// Returns `None` for anything else.
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim().to_ascii_uppercase();
    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (number, suffix) = raw.split_at(digits_end);
    let number: usize = number.parse().ok()?;

    let multiplier = match suffix.trim() {
        "" | "B" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        _ => return None,
    };
    number.checked_mul(multiplier)
}

/// Formats a byte count using the largest whole unit.
pub fn format_size(bytes: usize) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}
