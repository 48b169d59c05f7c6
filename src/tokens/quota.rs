//! Monthly token budget tracking and linear usage projection.
//!
//! [`MonthlyUsage`] is the cumulative counter the orchestrator feeds with
//! provider token usage; it rolls over when the calendar month changes.
//! [`QuotaProjector`] extrapolates the month-to-date figure linearly:
//! `daily_rate = used / day_of_month`, `projected = daily_rate × days_in_month`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Token counter for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthlyUsage {
    /// Format: `"2026-03"`.
    pub period_key: String,
    pub tokens: u64,
}

impl MonthlyUsage {
    pub fn period_key_for(date: NaiveDate) -> String {
        format!("{:04}-{:02}", date.year(), date.month())
    }

    /// Add `tokens` to the counter for `today`'s month, resetting first if the
    /// stored counter belongs to an earlier period.
    pub fn record(&mut self, tokens: u64, today: NaiveDate) {
        self.roll_over(today);
        self.tokens = self.tokens.saturating_add(tokens);
    }

    /// Overwrite the counter for `today`'s month (e.g. when seeding from storage).
    pub fn set(&mut self, tokens: u64, today: NaiveDate) {
        self.period_key = Self::period_key_for(today);
        self.tokens = tokens;
    }

    /// Tokens used in `today`'s month; 0 when the counter is stale.
    pub fn tokens_for(&self, today: NaiveDate) -> u64 {
        if self.period_key == Self::period_key_for(today) {
            self.tokens
        } else {
            0
        }
    }

    fn roll_over(&mut self, today: NaiveDate) {
        let key = Self::period_key_for(today);
        if self.period_key != key {
            self.period_key = key;
            self.tokens = 0;
        }
    }
}

/// Result of a quota projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaStatus {
    pub tokens_used: u64,
    pub monthly_token_limit: u64,
    pub tokens_remaining: u64,
    pub percentage_used: f64,
    pub days_until_reset: u32,
    pub daily_rate: f64,
    pub projected_monthly_usage: f64,
    pub within_limit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaProjector {
    monthly_token_limit: u64,
}

impl QuotaProjector {
    pub fn new(monthly_token_limit: u64) -> Self {
        Self {
            monthly_token_limit,
        }
    }

    pub fn monthly_token_limit(&self) -> u64 {
        self.monthly_token_limit
    }

    pub fn project(&self, tokens_used: u64, today: NaiveDate) -> QuotaStatus {
        let limit = self.monthly_token_limit;
        let day = today.day();
        let days = days_in_month(today);
        let daily_rate = tokens_used as f64 / day as f64;
        let projected = daily_rate * days as f64;
        let percentage_used = if limit > 0 {
            tokens_used as f64 / limit as f64 * 100.0
        } else if tokens_used > 0 {
            100.0
        } else {
            0.0
        };
        QuotaStatus {
            tokens_used,
            monthly_token_limit: limit,
            tokens_remaining: limit.saturating_sub(tokens_used),
            percentage_used,
            days_until_reset: days - day,
            daily_rate,
            projected_monthly_usage: projected,
            within_limit: projected <= limit as f64,
        }
    }
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}
