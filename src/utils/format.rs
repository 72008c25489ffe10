use chrono::NaiveTime;

/// Format a duration in seconds to "Xh Ym" or "Ym" string
pub fn format_duration_secs(secs: i64) -> String {
    if secs <= 0 {
        return "now".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "<1m".to_string()
    }
}

/// Format a NaiveTime to "HH:MM"
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Pad `label` to `width` display columns. Arabic and Latin labels are
/// counted per char, which is close enough for the prayer names we print.
pub fn pad_label(label: &str, width: usize) -> String {
    let len = label.chars().count();
    format!("{}{}", label, " ".repeat(width.saturating_sub(len)))
}
