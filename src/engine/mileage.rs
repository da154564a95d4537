//! Total cost and per-fill mileage for a new fill.

use super::estimation::ResolvedFill;
use crate::domain::math::{self, MILEAGE_SCALE};
use crate::domain::ordering::latest_on_or_before;
use crate::domain::vehicle::odometer_advances;
use crate::domain::{Decimal, FillRecord};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Values derived for a fill at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillMetrics {
    /// `fuel_volume * price_per_liter`, scale 2.
    pub total_amount: Decimal,
    /// Distance per liter since the previous fill, scale 3.
    pub mileage: Option<Decimal>,
}

/// How a new reading compares to the vehicle's stored odometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometerCheck {
    /// The reading will advance the stored odometer.
    Advances,
    /// The reading is equal to or lower than the stored odometer.
    NonIncreasing { current: i64 },
}

/// What to do with a reading that does not advance the stored odometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometerPolicy {
    /// Store the fill silently.
    Accept,
    /// Store the fill and log a warning.
    Warn,
    /// Refuse the fill.
    Reject,
}

pub const DEFAULT_ODOMETER_POLICY: OdometerPolicy = OdometerPolicy::Warn;

impl Default for OdometerPolicy {
    fn default() -> Self {
        DEFAULT_ODOMETER_POLICY
    }
}

impl FromStr for OdometerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(OdometerPolicy::Accept),
            "warn" => Ok(OdometerPolicy::Warn),
            "reject" => Ok(OdometerPolicy::Reject),
            other => Err(format!("must be accept, warn, or reject, got {}", other)),
        }
    }
}

impl fmt::Display for OdometerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OdometerPolicy::Accept => "accept",
            OdometerPolicy::Warn => "warn",
            OdometerPolicy::Reject => "reject",
        };
        write!(f, "{}", s)
    }
}

pub struct MileageCalculator;

impl MileageCalculator {
    /// Derive total amount and mileage for a fill.
    ///
    /// `history` excludes the fill being created. The predecessor is the latest
    /// fill dated on or before `fill_date`.
    pub fn compute(
        resolved: &ResolvedFill,
        odometer_reading: i64,
        fill_date: NaiveDate,
        history: &[FillRecord],
    ) -> FillMetrics {
        let total_amount = math::mul(resolved.fuel_volume, resolved.price_per_liter);
        let mileage = latest_on_or_before(history, fill_date).and_then(|previous| {
            Self::mileage_between(
                previous.odometer_reading,
                odometer_reading,
                resolved.fuel_volume,
            )
        });

        FillMetrics {
            total_amount,
            mileage,
        }
    }

    /// `(odometer - previous) / fuel_volume`, two-stage rounded to scale 3.
    ///
    /// `None` unless both the distance and the volume are positive, so a
    /// produced mileage is always positive.
    pub fn mileage_between(
        previous_odometer: i64,
        odometer: i64,
        fuel_volume: Decimal,
    ) -> Option<Decimal> {
        if !fuel_volume.is_positive() {
            return None;
        }
        let distance = odometer.saturating_sub(previous_odometer);
        if distance <= 0 {
            return None;
        }
        math::div_two_stage(Decimal::from(distance), fuel_volume, MILEAGE_SCALE)
    }

    /// Compare a new reading with the stored odometer using the ratchet rule.
    pub fn check_odometer(current: Option<i64>, reading: i64) -> OdometerCheck {
        match current {
            Some(current) if !odometer_advances(Some(current), reading) => {
                OdometerCheck::NonIncreasing { current }
            }
            _ => OdometerCheck::Advances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FillId, UserId, VehicleId};
    use chrono::Utc;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn prior(seq: i64, on: NaiveDate, odometer: i64) -> FillRecord {
        FillRecord {
            id: FillId::random(),
            vehicle_id: VehicleId::random(),
            user_id: UserId::random(),
            seq,
            fill_date: on,
            odometer_reading: odometer,
            fuel_volume: None,
            price_per_liter: None,
            total_amount: Decimal::zero(),
            mileage: None,
            estimated: false,
            notes: Some("initial".to_string()),
            created_at: Utc::now(),
        }
    }

    fn resolved(volume: &str, price: &str) -> ResolvedFill {
        ResolvedFill {
            fuel_volume: d(volume),
            price_per_liter: d(price),
            estimated: false,
        }
    }

    #[test]
    fn test_second_fill_total_and_mileage() {
        let history = vec![prior(1, date(1, 1), 1000)];
        let metrics =
            MileageCalculator::compute(&resolved("28.000", "100.00"), 1400, date(1, 15), &history);

        assert_eq!(metrics.total_amount.to_scaled_string(), "2800.00");
        assert_eq!(metrics.mileage.unwrap().to_scaled_string(), "14.286");
    }

    #[test]
    fn test_estimated_fill_total_amount() {
        let metrics = MileageCalculator::compute(&resolved("20.000", "97.00"), 1780, date(2, 20), &[]);
        assert_eq!(metrics.total_amount.to_scaled_string(), "1940.00");
        assert_eq!(metrics.mileage, None);
    }

    #[test]
    fn test_no_predecessor_means_no_mileage() {
        let history = vec![prior(1, date(3, 1), 1000)];
        let metrics =
            MileageCalculator::compute(&resolved("30.000", "100.00"), 1400, date(2, 1), &history);
        assert_eq!(metrics.mileage, None);
    }

    #[test]
    fn test_zero_or_negative_distance_has_no_mileage() {
        let history = vec![prior(1, date(1, 1), 1000)];
        let same =
            MileageCalculator::compute(&resolved("30.000", "100.00"), 1000, date(1, 2), &history);
        let lower =
            MileageCalculator::compute(&resolved("30.000", "100.00"), 900, date(1, 2), &history);
        assert_eq!(same.mileage, None);
        assert_eq!(lower.mileage, None);
    }

    #[test]
    fn test_mileage_between_requires_positive_volume() {
        assert_eq!(MileageCalculator::mileage_between(0, 100, Decimal::zero()), None);
        assert_eq!(MileageCalculator::mileage_between(0, 100, d("-1")), None);
        assert_eq!(
            MileageCalculator::mileage_between(0, 100, d("8.000"))
                .unwrap()
                .to_scaled_string(),
            "12.500"
        );
    }

    #[test]
    fn test_mileage_uses_two_stage_rounding() {
        // 12344996 / 10000000 = 1.2344996 -> 1.234500 -> 1.235
        let mileage = MileageCalculator::mileage_between(0, 12_344_996, d("10000000")).unwrap();
        assert_eq!(mileage.to_scaled_string(), "1.235");
    }

    #[test]
    fn test_odometer_policy_parse() {
        assert_eq!("reject".parse::<OdometerPolicy>(), Ok(OdometerPolicy::Reject));
        assert_eq!(OdometerPolicy::default(), OdometerPolicy::Warn);
        assert!("strict".parse::<OdometerPolicy>().is_err());
        assert_eq!(OdometerPolicy::Accept.to_string(), "accept");
    }

    #[test]
    fn test_check_odometer() {
        assert_eq!(MileageCalculator::check_odometer(None, 10), OdometerCheck::Advances);
        assert_eq!(MileageCalculator::check_odometer(Some(5), 10), OdometerCheck::Advances);
        assert_eq!(
            MileageCalculator::check_odometer(Some(10), 10),
            OdometerCheck::NonIncreasing { current: 10 }
        );
        assert_eq!(
            MileageCalculator::check_odometer(Some(10), 3),
            OdometerCheck::NonIncreasing { current: 10 }
        );
    }
}
