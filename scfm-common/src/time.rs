//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Return `candidate`, or `floor` when `candidate` would move backwards in time
///
/// Keeps append-only histories ordered even if the wall clock steps back.
pub fn not_before(candidate: DateTime<Utc>, floor: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match floor {
        Some(floor) if candidate < floor => floor,
        _ => candidate,
    }
}

/// Scale a millisecond delay by a factor, saturating at zero
pub fn scaled_millis(millis: u64, scale: f64) -> std::time::Duration {
    if !scale.is_finite() || scale <= 0.0 {
        return std::time::Duration::ZERO;
    }
    std::time::Duration::from_millis((millis as f64 * scale).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_not_before_keeps_later_candidate() {
        let floor = now();
        let later = floor + ChronoDuration::seconds(5);
        assert_eq!(not_before(later, Some(floor)), later);
    }

    #[test]
    fn test_not_before_clamps_earlier_candidate() {
        let floor = now();
        let earlier = floor - ChronoDuration::seconds(5);
        assert_eq!(not_before(earlier, Some(floor)), floor);
    }

    #[test]
    fn test_not_before_without_floor() {
        let t = now();
        assert_eq!(not_before(t, None), t);
    }

    #[test]
    fn test_scaled_millis() {
        assert_eq!(scaled_millis(1500, 1.0), Duration::from_millis(1500));
        assert_eq!(scaled_millis(1500, 0.01), Duration::from_millis(15));
        assert_eq!(scaled_millis(1500, 0.0), Duration::ZERO);
        assert_eq!(scaled_millis(1500, f64::NAN), Duration::ZERO);
    }
}
