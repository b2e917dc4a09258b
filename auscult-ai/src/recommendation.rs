//! Advice text for each diagnosed condition

/// Conditions the classifiers are trained to recognize
pub const KNOWN_CONDITIONS: [&str; 3] = ["Normal", "Murmur", "Noisy"];

/// Advice returned for any label outside [`KNOWN_CONDITIONS`]
pub const DEFAULT_RECOMMENDATION: &str = "Consult a healthcare professional for advice.";

/// Look up the advice for a predicted condition
pub fn recommendation_for(condition: &str) -> &'static str {
    match condition {
        "Normal" => "Maintain a healthy lifestyle with regular exercise and balanced diet.",
        "Murmur" => {
            "Consider consulting a doctor for further evaluation and maintain daily walking/exercise."
        }
        "Noisy" => "It is highly recommended to consult a doctor immediately for a detailed check-up.",
        _ => DEFAULT_RECOMMENDATION,
    }
}
