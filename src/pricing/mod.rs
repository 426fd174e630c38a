//! Bedrock on-demand prices and rough per-session cost estimates.

use serde::{Deserialize, Serialize};

/// USD prices per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub friendly_name: &'static str,
    pub input_per_m: f64,
    pub output_per_m: f64,
}

/// Bedrock prices as of October 2025, keyed by friendly name.
const PRICE_TABLE: &[ModelPrice] = &[
    ModelPrice { friendly_name: "anthropic.claude-opus-4", input_per_m: 15.00, output_per_m: 75.00 },
    ModelPrice { friendly_name: "anthropic.claude-sonnet-4-5", input_per_m: 3.00, output_per_m: 15.00 },
    ModelPrice { friendly_name: "anthropic.claude-haiku-4-5", input_per_m: 0.80, output_per_m: 4.00 },
    ModelPrice { friendly_name: "anthropic.claude-sonnet-3-5", input_per_m: 3.00, output_per_m: 15.00 },
    ModelPrice { friendly_name: "anthropic.claude-haiku-3-5", input_per_m: 0.80, output_per_m: 4.00 },
    ModelPrice { friendly_name: "meta.llama-3-2-90b", input_per_m: 2.65, output_per_m: 3.50 },
    ModelPrice { friendly_name: "meta.llama-3-2-11b", input_per_m: 0.35, output_per_m: 0.40 },
    ModelPrice { friendly_name: "amazon.titan-text-premier", input_per_m: 0.50, output_per_m: 1.50 },
];

// Typical session: ~25k input and ~10k output tokens.
const AVG_INPUT_TOKENS: u64 = 25_000;
const AVG_OUTPUT_TOKENS: u64 = 10_000;

/// Estimated cost for a token count.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Cost {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
}

impl Cost {
    pub fn from_tokens(price: &ModelPrice, input_tokens: u64, output_tokens: u64) -> Self {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * price.input_per_m;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * price.output_per_m;
        Self {
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
            currency: "USD".to_string(),
        }
    }
}

pub fn model_price(friendly_name: &str) -> Option<&'static ModelPrice> {
    PRICE_TABLE.iter().find(|p| p.friendly_name == friendly_name)
}

/// Cost of the given tokens, zero for unpriced models.
pub fn calculate_cost(friendly_name: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    model_price(friendly_name)
        .map(|price| Cost::from_tokens(price, input_tokens, output_tokens).total_cost)
        .unwrap_or(0.0)
}

/// Average cost of one launch, zero for unpriced models.
pub fn estimate_cost_per_launch(friendly_name: &str) -> f64 {
    calculate_cost(friendly_name, AVG_INPUT_TOKENS, AVG_OUTPUT_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonnet_launch_estimate() {
        // 25k * $3/M + 10k * $15/M
        let cost = estimate_cost_per_launch("anthropic.claude-sonnet-4-5");
        assert!((cost - 0.225).abs() < 1e-9, "cost: {cost}");
    }

    #[test]
    fn unknown_model_costs_nothing() {
        assert_eq!(estimate_cost_per_launch("cohere.command-r"), 0.0);
        assert_eq!(calculate_cost("", 1_000_000, 1_000_000), 0.0);
    }

    #[test]
    fn cost_breakdown_adds_up() {
        let price = model_price("anthropic.claude-haiku-4-5").unwrap();
        let cost = Cost::from_tokens(price, 1_000_000, 500_000);
        assert!((cost.input_cost - 0.8).abs() < 1e-9);
        assert!((cost.output_cost - 2.0).abs() < 1e-9);
        assert!((cost.total_cost - 2.8).abs() < 1e-9);
        assert_eq!(cost.currency, "USD");
    }
}
