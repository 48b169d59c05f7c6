//! Token 计费与配额模块：缓存节省成本估算与月度用量预测。
//!
//! # Token Pricing and Quota Module
//!
//! This module values the tokens the cache saves and keeps an eye on the
//! monthly token budget.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TokenPricing`] | Flat price per 1K tokens |
//! | [`MonthlyUsage`] | Cumulative token counter for the current calendar month |
//! | [`QuotaProjector`] | Linear month-end projection against a token limit |
//! | [`QuotaStatus`] | Projection result |
//!
//! ## Example
//!
//! ```rust
//! use ai_response_cache::tokens::{QuotaProjector, TokenPricing};
//! use chrono::NaiveDate;
//!
//! let pricing = TokenPricing::new("gpt-3.5-turbo", 0.002);
//! assert!((pricing.cost_of(10_000) - 0.02).abs() < 1e-12);
//!
//! let day = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
//! let status = QuotaProjector::new(1_000_000).project(100_000, day);
//! assert_eq!(status.projected_monthly_usage, 300_000.0);
//! assert!(status.within_limit);
//! ```
//!
//! The projection assumes the month-to-date daily rate holds for the rest
//! of the month.

mod pricing;
mod quota;

pub use pricing::TokenPricing;
pub use quota::{days_in_month, MonthlyUsage, QuotaProjector, QuotaStatus};
