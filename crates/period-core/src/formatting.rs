//! Human-readable rendering of energy totals and period lengths for the
//! run summary.

/// Format a value with thousands separators and a fixed number of decimals.
///
/// # Examples
///
/// ```
/// use period_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let plain = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && plain.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format an energy amount in kilowatt-hours with two decimals.
///
/// ```
/// use period_core::formatting::format_energy;
///
/// assert_eq!(format_energy(1520.0), "1,520.00 kWh");
/// ```
pub fn format_energy(kwh: f64) -> String {
    format!("{} kWh", format_number(kwh, 2))
}

/// Format a whole number of minutes as `"45m"`, `"3h"`, `"3h 45m"` or
/// `"2d 1h 5m"`.
///
/// ```
/// use period_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(45), "45m");
/// assert_eq!(format_minutes(225), "3h 45m");
/// ```
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let days = minutes / (24 * 60);
    let hours = (minutes % (24 * 60)) / 60;
    let mins = minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 {
        parts.push(format!("{}m", mins));
    }
    parts.join(" ")
}

/// `(part / whole) * 100` rounded to `decimal_places`; `0.0` when `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    (part / whole * 100.0 * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert a comma every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
