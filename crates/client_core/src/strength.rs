use shared::domain::{StrengthScore, StrengthTier};

const WEAK_SEQUENCES: [&str; 3] = ["123", "abc", "qwe"];

/// Scores a candidate secret on a 0..=100 scale.
///
/// The policy is shared with the service frontend and must not drift:
/// length contributes `min(len * 4, 40)`, each character class adds a
/// fixed bonus, and repeated runs or well-known sequences subtract.
pub fn score(secret: &str) -> StrengthScore {
    let chars: Vec<char> = secret.chars().collect();

    let mut value = (chars.len() as i32 * 4).min(40);
    if chars.iter().any(|c| c.is_ascii_lowercase()) {
        value += 10;
    }
    if chars.iter().any(|c| c.is_ascii_uppercase()) {
        value += 10;
    }
    if chars.iter().any(|c| c.is_ascii_digit()) {
        value += 10;
    }
    if chars.iter().any(|c| !c.is_ascii_alphanumeric()) {
        value += 15;
    }
    if has_triple_repeat(&chars) {
        value -= 10;
    }
    let lowered = secret.to_lowercase();
    if WEAK_SEQUENCES.iter().any(|seq| lowered.contains(seq)) {
        value -= 15;
    }

    let value = value.clamp(0, 100) as u8;
    let tier = if value >= 70 {
        StrengthTier::Strong
    } else if value >= 40 {
        StrengthTier::Medium
    } else {
        StrengthTier::Weak
    };
    StrengthScore { value, tier }
}

fn has_triple_repeat(chars: &[char]) -> bool {
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}
