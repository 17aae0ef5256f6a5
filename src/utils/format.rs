/// Render a second count as `m:ss`. Minutes are not wrapped into hours.
pub fn format_time(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Percentage of `position` through `total`, 0 when the total is empty.
pub fn progress_percent(position: f64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (position / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// `elapsed / total (pct%)` line for a position update
pub fn progress_line(position: f64, total: u64) -> String {
    format!(
        "{} / {} ({:.0}%)",
        format_time(position),
        format_time(total as f64),
        progress_percent(position, total)
    )
}
