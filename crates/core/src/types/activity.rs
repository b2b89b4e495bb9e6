//! Order-activity derivations shown on the customer list.
//!
//! Both values are recomputed on every read from the customer's aggregate
//! order statistics; nothing here is stored.

use core::fmt;

use chrono::{DateTime, TimeDelta, Utc};

/// How often a customer orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    NoOrders,
    FirstOrder,
    /// Several orders whose average gap rounds to zero days.
    SameDay,
    /// Average gap between consecutive orders, in whole days.
    EveryDays(i64),
    /// Several orders but the first or last timestamp is missing.
    Unknown,
}

impl Frequency {
    /// Derive the ordering frequency from aggregate statistics.
    ///
    /// For more than one order the gap is
    /// `round((last - first) / (total_orders - 1) / 1 day)`.
    #[must_use]
    pub fn derive(
        total_orders: i64,
        first_order_at: Option<DateTime<Utc>>,
        last_order_at: Option<DateTime<Utc>>,
    ) -> Self {
        match total_orders {
            i64::MIN..=0 => Self::NoOrders,
            1 => Self::FirstOrder,
            n => {
                let (Some(first), Some(last)) = (first_order_at, last_order_at) else {
                    return Self::Unknown;
                };
                let span_ms = (last - first).num_milliseconds().max(0);
                #[allow(clippy::cast_precision_loss)] // spans and counts stay far below 2^52
                let gap_days =
                    span_ms as f64 / (n - 1) as f64 / TimeDelta::days(1).num_milliseconds() as f64;
                #[allow(clippy::cast_possible_truncation)] // rounded day count fits in i64
                let days = gap_days.round() as i64;
                if days == 0 {
                    Self::SameDay
                } else {
                    Self::EveryDays(days)
                }
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOrders => f.write_str("No orders"),
            Self::FirstOrder => f.write_str("First order"),
            Self::SameDay => f.write_str("Same day"),
            Self::EveryDays(days) => write!(f, "Every {days} days"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// How long ago the customer last ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Never,
    Today,
    Yesterday,
    DaysAgo(i64),
}

impl Recency {
    /// Whole days elapsed between `last_order_at` and `now`.
    #[must_use]
    pub fn since(last_order_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last_order_at else {
            return Self::Never;
        };
        match (now - last).num_days() {
            i64::MIN..=0 => Self::Today,
            1 => Self::Yesterday,
            days => Self::DaysAgo(days),
        }
    }

    /// Days since the last order, if there was one.
    #[must_use]
    pub const fn days(self) -> Option<i64> {
        match self {
            Self::Never => None,
            Self::Today => Some(0),
            Self::Yesterday => Some(1),
            Self::DaysAgo(days) => Some(days),
        }
    }
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Today => f.write_str("Today"),
            Self::Yesterday => f.write_str("Yesterday"),
            Self::DaysAgo(days) => write!(f, "{days} days ago"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
            + TimeDelta::days(n)
    }

    #[test]
    fn test_no_orders() {
        assert_eq!(Frequency::derive(0, None, None), Frequency::NoOrders);
        assert_eq!(Frequency::derive(0, None, None).to_string(), "No orders");
    }

    #[test]
    fn test_first_order() {
        let f = Frequency::derive(1, Some(day(0)), Some(day(0)));
        assert_eq!(f, Frequency::FirstOrder);
        assert_eq!(f.to_string(), "First order");
    }

    #[test]
    fn test_three_orders_over_ten_days() {
        let f = Frequency::derive(3, Some(day(0)), Some(day(10)));
        assert_eq!(f, Frequency::EveryDays(5));
        assert_eq!(f.to_string(), "Every 5 days");
    }

    #[test]
    fn test_gap_rounds_half_up() {
        // 5 days over 2 gaps = 2.5 days
        assert_eq!(
            Frequency::derive(3, Some(day(0)), Some(day(5))),
            Frequency::EveryDays(3)
        );
    }

    #[test]
    fn test_same_day() {
        let first = day(0);
        let last = first + TimeDelta::hours(5);
        let f = Frequency::derive(4, Some(first), Some(last));
        assert_eq!(f, Frequency::SameDay);
        assert_eq!(f.to_string(), "Same day");
    }

    #[test]
    fn test_missing_timestamps() {
        assert_eq!(Frequency::derive(2, None, Some(day(3))), Frequency::Unknown);
    }

    #[test]
    fn test_recency() {
        let now = day(10);
        assert_eq!(Recency::since(None, now), Recency::Never);
        assert_eq!(Recency::since(Some(day(10)), now), Recency::Today);
        assert_eq!(Recency::since(Some(day(9)), now), Recency::Yesterday);
        assert_eq!(Recency::since(Some(day(3)), now).to_string(), "7 days ago");
        assert_eq!(Recency::since(Some(day(3)), now).days(), Some(7));
    }
}
