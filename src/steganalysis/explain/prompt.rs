use std::fmt::Write;

use crate::steganalysis::scoring::Verdict;

/// Returned verbatim whenever the text-generation service cannot answer.
pub const FALLBACK_EXPLANATION: &str = "Explanation generation failed. LLM unavailable.";

/// Deterministic prompt embedding the label and ranked contributions.
///
/// The instructions pin the answer to 3-5 sentences about this verdict
/// only; the model must not issue a prediction of its own.
pub fn build_prompt(verdict: &Verdict) -> String {
    let mut features = String::new();
    for (i, contribution) in verdict.top_features.iter().enumerate() {
        if i > 0 {
            features.push('\n');
        }
        let _ = write!(
            features,
            "- {} (score: {})",
            contribution.feature,
            format_score(contribution.influence_score)
        );
    }

    format!(
        "\nYou are explaining a steganography classification result.\n\
         \n\
         The image was classified as: {label}\n\
         \n\
         Key influencing features:\n\
         {features}\n\
         \n\
         Write exactly 3 to 5 short sentences explaining this result.\n\
         Do NOT create new predictions.\n\
         Do NOT mention unrelated scenarios.\n\
         Keep it clear and technical but simple.\n",
        label = verdict.label,
        features = features,
    )
}

/// Shortest round-trip rendering with a trailing `.0` on integral values
/// and a signed two-digit exponent outside `1e-4..1e16`, e.g. `-7.0` and
/// `1e-06`.
fn format_score(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let mut plain = value.to_string();
    if !plain.contains('.') {
        plain.push_str(".0");
    }
    plain
}
