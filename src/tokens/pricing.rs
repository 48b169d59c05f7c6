//! Token pricing and cost estimation.

use serde::{Deserialize, Serialize};

/// Flat per-1K-token price used to value cached tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPricing {
    pub model: String,
    pub cost_per_1k: f64,
    pub currency: String,
}

impl TokenPricing {
    pub fn new(model: &str, cost_per_1k: f64) -> Self {
        Self {
            model: model.into(),
            cost_per_1k,
            currency: "USD".into(),
        }
    }
    pub fn cost_of(&self, tokens: u64) -> f64 {
        (tokens as f64 / 1000.0) * self.cost_per_1k
    }
    pub fn format(&self, amount: f64) -> String {
        if amount < 0.01 {
            format!("{:.4}¢", amount * 100.0)
        } else {
            format!("${:.4}", amount)
        }
    }
    pub fn gpt_35_turbo() -> Self {
        Self::new("gpt-3.5-turbo", 0.002)
    }
    pub fn gpt_4o_mini() -> Self {
        Self::new("gpt-4o-mini", 0.0006)
    }
    pub fn gpt_4o() -> Self {
        Self::new("gpt-4o", 0.015)
    }
    pub fn claude_3_haiku() -> Self {
        Self::new("claude-3-haiku", 0.00125)
    }
    pub fn for_model(model: &str) -> Option<Self> {
        let m = model.to_lowercase();
        if m.contains("gpt-4o-mini") {
            Some(Self::gpt_4o_mini())
        } else if m.contains("gpt-4o") {
            Some(Self::gpt_4o())
        } else if m.contains("gpt-3.5") || m.contains("gpt-35") {
            Some(Self::gpt_35_turbo())
        } else if m.contains("claude-3-haiku") {
            Some(Self::claude_3_haiku())
        } else {
            None
        }
    }
}

impl Default for TokenPricing {
    fn default() -> Self {
        Self::gpt_35_turbo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_of() {
        let p = TokenPricing::new("m", 0.002);
        assert!((p.cost_of(1_500) - 0.003).abs() < 1e-12);
        assert_eq!(p.cost_of(0), 0.0);
    }

    #[test]
    fn test_for_model() {
        assert_eq!(
            TokenPricing::for_model("GPT-4o-mini-2024").unwrap().model,
            "gpt-4o-mini"
        );
        assert_eq!(
            TokenPricing::for_model("azure/gpt-35-turbo").unwrap().cost_per_1k,
            0.002
        );
        assert!(TokenPricing::for_model("mystery").is_none());
    }

    #[test]
    fn test_format() {
        let p = TokenPricing::default();
        assert_eq!(p.format(0.005), "0.5000¢");
        assert_eq!(p.format(1.5), "$1.5000");
    }
}
