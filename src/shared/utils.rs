//! Utility functions and helpers

/// Format a balance with six decimals
pub fn format_amount(value: f64) -> String {
    format!("{:.6}", value)
}

/// Format a signed change with six decimals, `+` prefixed when positive
pub fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{:.6}", delta)
    } else {
        format!("{:.6}", delta)
    }
}
