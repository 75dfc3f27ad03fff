use chrono::{DateTime, Utc};
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use std::time::Duration;
use tokio::sync::Notify;

/// Format a duration (from Option<DateTime<Utc>>) as a human-readable age string (y d h m s)
pub fn format_age_string(created_at: Option<DateTime<Utc>>) -> String {
    if let Some(dt) = created_at {
        let now = Utc::now();
        let mut seconds = if now > dt { (now - dt).num_seconds() } else { 0 };
        let years = seconds / 31_536_000; // 365*24*60*60
        seconds %= 31_536_000;
        let days = seconds / 86_400;
        seconds %= 86_400;
        let hours = seconds / 3_600;
        seconds %= 3_600;
        let minutes = seconds / 60;
        seconds %= 60;
        let mut parts = Vec::new();
        if years > 0 {
            parts.push(format!("{}y", years));
        }
        if days > 0 {
            parts.push(format!("{}d", days));
        }
        if hours > 0 {
            parts.push(format!("{}h", hours));
        }
        if minutes > 0 {
            parts.push(format!("{}m", minutes));
        }
        if seconds > 0 || parts.is_empty() {
            parts.push(format!("{}s", seconds));
        }
        parts.join(" ")
    } else {
        "unknown".to_string()
    }
}

/// Waits for either shutdown signal or delay. Returns true if shutdown was triggered.
pub async fn check_shutdown_or_delay(shutdown: &Notify, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.notified() => true,
    }
}

/// `ABCD...WXYZ` form for log lines and tables
pub fn format_address_short(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn format_signature_short(signature: &str) -> String {
    let head: String = signature.chars().take(8).collect();
    if signature.chars().count() > 8 {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// SOL to lamports, rounded to the nearest lamport
///
/// Rejects negative, non-finite and out-of-range inputs.
pub fn sol_to_lamports(sol: f64) -> Option<u64> {
    if !sol.is_finite() || sol < 0.0 {
        return None;
    }
    let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
    if lamports > u64::MAX as f64 {
        return None;
    }
    Some(lamports as u64)
}

/// Current Unix time in seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sol_conversion_rounds_to_nearest_lamport() {
        assert_eq!(sol_to_lamports(0.1), Some(100_000_000));
        assert_eq!(sol_to_lamports(0.000_000_000_6), Some(1));
        assert_eq!(sol_to_lamports(1.5), Some(1_500_000_000));
        assert_eq!(sol_to_lamports(-1.0), None);
        assert_eq!(sol_to_lamports(f64::NAN), None);
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
    }

    #[test]
    fn short_forms() {
        assert_eq!(
            format_address_short("9ZtgtUtzDRraorcWZM7vSE7ydGhCJfhpMcV9hbTgLsRr"),
            "9Ztg...LsRr"
        );
        assert_eq!(format_address_short("short"), "short");
        assert_eq!(format_signature_short("5h6xBEauJ3PK6SWC"), "5h6xBEau...");
    }

    #[test]
    fn age_string_for_missing_timestamp() {
        assert_eq!(format_age_string(None), "unknown");
    }
}
