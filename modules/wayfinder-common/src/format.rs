/// Human-readable distance: "850 m", "12.4 km", "1350 km".
pub fn format_distance(meters: u64) -> String {
    if meters < 1_000 {
        format!("{meters} m")
    } else if meters < 100_000 {
        format!("{:.1} km", meters as f64 / 1_000.0)
    } else {
        format!("{:.0} km", meters as f64 / 1_000.0)
    }
}

/// Human-readable duration rounded to the minute: "5 min", "1 hr 5 min", "2 days 3 hr".
pub fn format_duration(seconds: u64) -> String {
    let total_minutes = ((seconds as f64) / 60.0).round().max(1.0) as u64;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        let unit = if days == 1 { "day" } else { "days" };
        if hours > 0 {
            format!("{days} {unit} {hours} hr")
        } else {
            format!("{days} {unit}")
        }
    } else if hours > 0 {
        if minutes > 0 {
            format!("{hours} hr {minutes} min")
        } else {
            format!("{hours} hr")
        }
    } else {
        format!("{minutes} min")
    }
}
