//! Pricing engine - deterministic parking fee computation
//!
//! Pure functions over entry/exit timestamps and a [`PricingConfig`]. The
//! same inputs always yield the same output, which is what makes payment
//! creation idempotent: the caller captures "now" once and passes it in.
//!
//! Rule order: validation, grace period (short-circuits), rate selection
//! (override > weekend > weekday), ceiling hour rounding, first-hour-free
//! discount, daily cap clamp.

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum billable span for a single session
pub const MAX_DURATION_DAYS: i64 = 30;

/// Pricing configuration, externally supplied (see `Config::from_env`)
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Weekday hourly rate
    pub hourly_rate: f64,
    /// Hourly rate applied when the entry date falls on Sat/Sun
    pub weekend_hourly_rate: f64,
    /// Occupancy up to this many minutes incurs no charge
    pub grace_period_minutes: i64,
    /// Subtract one chargeable hour before multiplying by the rate
    pub first_hour_free: bool,
    /// Ceiling on the fee for any single session
    pub maximum_daily_fee: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            hourly_rate: 5.0,
            weekend_hourly_rate: 7.0,
            grace_period_minutes: 15,
            first_hour_free: false,
            maximum_daily_fee: 50.0,
        }
    }
}

/// Pricing validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Exit time cannot be before entry time")]
    ExitBeforeEntry,

    #[error("Duration cannot exceed {max_days} days")]
    DurationExceeded { max_days: i64 },
}

/// Rules that contributed to a computed fee
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PricingRule {
    GracePeriod,
    WeekendRate,
    FirstHourFree,
    DailyCap,
}

/// Itemized charge breakdown
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FeeBreakdown {
    /// Rounded hours times the selected rate, before any discount
    pub base_amount: f64,
    /// Total discounts (one hour's rate when first-hour-free applies)
    pub discounts: f64,
    /// Amount shaved off by the daily cap, 0.0 when the cap did not bind
    pub capped_amount: f64,
    /// Equals the top-level `amount`
    pub final_amount: f64,
}

/// Result of a fee computation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FeeCalculation {
    /// Final amount, rounded to 2 decimal places, never negative
    pub amount: f64,
    /// Whole elapsed minutes (floor)
    pub duration_minutes: i64,
    /// Elapsed minutes rounded up to whole hours
    pub hours: i64,
    /// Hours actually billed after discounts
    pub chargeable_hours: i64,
    /// The rate that was selected for this computation
    pub hourly_rate: f64,
    pub applied_rules: Vec<PricingRule>,
    pub breakdown: FeeBreakdown,
}

/// Whether a date falls on Saturday or Sunday
pub fn is_weekend(date: DateTime<Utc>) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Round a monetary amount to 2 decimal places
fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Compute the parking fee for a completed or in-progress stay.
///
/// `rate_override` takes precedence over both weekday and weekend rates.
pub fn compute_fee(
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
    config: &PricingConfig,
    rate_override: Option<f64>,
) -> Result<FeeCalculation, PricingError> {
    if exit_time < entry_time {
        return Err(PricingError::ExitBeforeEntry);
    }

    let elapsed = exit_time - entry_time;
    let duration_minutes = elapsed.num_minutes();

    if duration_minutes > MAX_DURATION_DAYS * 24 * 60 {
        return Err(PricingError::DurationExceeded {
            max_days: MAX_DURATION_DAYS,
        });
    }

    let mut applied_rules = Vec::new();

    let hourly_rate = match rate_override {
        Some(rate) => rate,
        None if is_weekend(entry_time) => {
            applied_rules.push(PricingRule::WeekendRate);
            config.weekend_hourly_rate
        }
        None => config.hourly_rate,
    };

    // Grace period short-circuits every other rule
    if duration_minutes <= config.grace_period_minutes {
        return Ok(FeeCalculation {
            amount: 0.0,
            duration_minutes,
            hours: 0,
            chargeable_hours: 0,
            hourly_rate,
            applied_rules: vec![PricingRule::GracePeriod],
            breakdown: FeeBreakdown {
                base_amount: 0.0,
                discounts: 0.0,
                capped_amount: 0.0,
                final_amount: 0.0,
            },
        });
    }

    // Round up to whole chargeable hours
    let hours = (duration_minutes + 59) / 60;

    let mut chargeable_hours = hours;
    let mut discounts = 0.0;
    if config.first_hour_free && hours >= 1 {
        chargeable_hours = hours - 1;
        discounts = hourly_rate;
        applied_rules.push(PricingRule::FirstHourFree);
    }

    let base_amount = round_currency(hours as f64 * hourly_rate);
    let uncapped = (chargeable_hours as f64 * hourly_rate).max(0.0);

    let (amount, capped_amount) = if uncapped > config.maximum_daily_fee {
        applied_rules.push(PricingRule::DailyCap);
        (
            config.maximum_daily_fee,
            round_currency(uncapped - config.maximum_daily_fee),
        )
    } else {
        (uncapped, 0.0)
    };

    let amount = round_currency(amount);

    Ok(FeeCalculation {
        amount,
        duration_minutes,
        hours,
        chargeable_hours,
        hourly_rate,
        applied_rules,
        breakdown: FeeBreakdown {
            base_amount,
            discounts: round_currency(discounts),
            capped_amount,
            final_amount: amount,
        },
    })
}
