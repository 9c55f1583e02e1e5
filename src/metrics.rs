//! Per-turn cost, token and latency estimates

use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHARS_PER_TOKEN: f64 = 4.0;
const INPUT_USD_PER_MILLION: f64 = 5.00;
const OUTPUT_USD_PER_MILLION: f64 = 15.00;

/// Phrases that mark a response as a fallback rather than an answer
const FALLBACK_MARKERS: [&str; 2] = ["I couldn't classify", "provide a city name"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetrics {
    /// Estimated cost, e.g. `$0.000125`
    pub cost: String,
    /// Wall-clock latency of the turn, e.g. `1534.27ms`
    pub latency: String,
    #[serde(with = "yes_no")]
    pub fallback: bool,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TurnMetrics {
    /// Estimate metrics from the user message and response text.
    /// Tokens are approximated as four characters each.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(user_message: &str, response_text: &str, latency: Duration) -> Self {
        let input_tokens = user_message.chars().count() as f64 / CHARS_PER_TOKEN;
        let output_tokens = response_text.chars().count() as f64 / CHARS_PER_TOKEN;

        let cost = input_tokens / 1_000_000.0 * INPUT_USD_PER_MILLION
            + output_tokens / 1_000_000.0 * OUTPUT_USD_PER_MILLION;
        let latency_ms = (latency.as_secs_f64() * 1000.0 * 100.0).round() / 100.0;

        Self {
            cost: format!("${cost:.6}"),
            latency: format!("{latency_ms:.2}ms"),
            fallback: is_fallback(response_text),
            prompt_tokens: input_tokens as u64,
            completion_tokens: output_tokens as u64,
            total_tokens: (input_tokens + output_tokens) as u64,
        }
    }
}

pub fn is_fallback(response_text: &str) -> bool {
    FALLBACK_MARKERS
        .iter()
        .any(|marker| response_text.contains(marker))
}

mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.eq_ignore_ascii_case("yes"))
    }
}
