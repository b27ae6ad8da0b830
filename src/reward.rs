// location-bingo/src/reward.rs
// This module handles the reward code handed out on the first completed line.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::LineKind;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const RANDOM_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardCode(String);

impl RewardCode {
    /// Wraps a code read back from the address bar, kept verbatim.
    pub fn from_raw(code: impl Into<String>) -> Self {
        RewardCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Line type encoded in the prefix, when the code has one.
    pub fn line_kind(&self) -> Option<LineKind> {
        match self.0.split('-').next()? {
            "H" => Some(LineKind::Horizontal),
            "V" => Some(LineKind::Vertical),
            "D" => Some(LineKind::Diagonal),
            _ => None,
        }
    }
}

impl fmt::Display for RewardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{tag}-{millis in base 36}-{8 random base 36 digits}`, all uppercase.
pub fn generate_reward_code(kind: LineKind) -> RewardCode {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    generate_reward_code_with(kind, millis, &mut rand::rng())
}

pub fn generate_reward_code_with<R: Rng>(kind: LineKind, millis: u64, rng: &mut R) -> RewardCode {
    let random: String = (0..RANDOM_LEN)
        .map(|_| BASE36_DIGITS[rng.random_range(0..BASE36_DIGITS.len())] as char)
        .collect();
    RewardCode(format!("{}-{}-{}", kind.tag(), to_base36(millis), random))
}

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn is_base36_upper(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_code_shape() {
        let code = generate_reward_code(LineKind::Horizontal);
        let parts: Vec<&str> = code.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "H");
        assert!(is_base36_upper(parts[1]));
        assert_eq!(parts[2].len(), RANDOM_LEN);
        assert!(is_base36_upper(parts[2]));
    }

    #[test]
    fn test_tags_per_line_kind() {
        let mut rng = StdRng::seed_from_u64(7);
        let vertical = generate_reward_code_with(LineKind::Vertical, 36, &mut rng);
        let diagonal = generate_reward_code_with(LineKind::from_name("other"), 36, &mut rng);
        assert!(vertical.as_str().starts_with("V-10-"));
        assert!(diagonal.as_str().starts_with("D-10-"));
        assert_eq!(vertical.line_kind(), Some(LineKind::Vertical));
        assert_eq!(diagonal.line_kind(), Some(LineKind::Diagonal));
    }

    #[test]
    fn test_raw_code_is_kept_verbatim() {
        let code = RewardCode::from_raw("whatever code");
        assert_eq!(code.to_string(), "whatever code");
        assert_eq!(code.line_kind(), None);
    }
}
