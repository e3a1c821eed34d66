//! Per-token pricing used for usage logging.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) USD cost per token for a model name.
///
/// Matches on model family prefixes; unknown models cost zero so that
/// logging never blocks a call.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    let model = model.to_lowercase();
    if model.starts_with("gemini-1.5-flash") || model.starts_with("gemini-2.0-flash") {
        (dec!(0.000000075), dec!(0.0000003))
    } else if model.starts_with("gemini-1.5-pro") {
        (dec!(0.00000125), dec!(0.000005))
    } else if model.contains("haiku") {
        (dec!(0.0000008), dec!(0.000004))
    } else if model.contains("sonnet") {
        (dec!(0.000003), dec!(0.000015))
    } else if model.contains("opus") {
        (dec!(0.000015), dec!(0.000075))
    } else if model.starts_with("gpt-4o-mini") {
        (dec!(0.00000015), dec!(0.0000006))
    } else if model.starts_with("gpt-4o") {
        (dec!(0.0000025), dec!(0.00001))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    }
}

/// Estimated USD cost of a call.
pub fn estimate_cost(
    (input_rate, output_rate): (Decimal, Decimal),
    input_tokens: u32,
    output_tokens: u32,
) -> Decimal {
    input_rate * Decimal::from(input_tokens) + output_rate * Decimal::from(output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_have_prices() {
        let (input, output) = model_cost("gemini-1.5-flash-latest");
        assert!(input > Decimal::ZERO);
        assert!(output > input);
        assert!(model_cost("claude-sonnet-4-20250514").0 > Decimal::ZERO);
    }

    #[test]
    fn unknown_model_is_free() {
        assert_eq!(model_cost("local-llama"), (Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn estimate_sums_both_directions() {
        let cost = estimate_cost((dec!(0.001), dec!(0.002)), 100, 50);
        assert_eq!(cost, dec!(0.2));
    }
}
