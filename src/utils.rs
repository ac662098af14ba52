//! Identifier helpers shared by the seeder and the controllers.

use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

/// Lowest student number; the first generated code is `S1001`.
const STUDENT_CODE_FLOOR: u64 = 1000;

/// Random identifier with a type prefix, e.g. `s_k3j9x0a`.
#[must_use]
pub fn uid(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{prefix}{suffix}")
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").unwrap_or_else(|_| unreachable!("static pattern")))
}

/// Next user-facing student code.
///
/// Takes the first run of digits in each existing code, finds the maximum
/// (never below 1000) and adds one. Codes without digits, or with digit runs
/// too long to fit a `u64`, are ignored.
pub fn next_student_code<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|code| digits().find(code))
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .fold(STUDENT_CODE_FLOOR, u64::max);
    format!("S{}", max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_has_prefix_and_length() {
        let id = uid("b_");
        assert!(id.starts_with("b_"));
        assert_eq!(id.len(), 9);
    }

    #[test]
    fn test_next_code_after_seeded_students() {
        assert_eq!(next_student_code(["S1001", "S1002", "S1003"]), "S1004");
    }

    #[test]
    fn test_next_code_ignores_garbage() {
        assert_eq!(next_student_code(["", "abc", "S1005", "X-2000-7"]), "S2001");
    }

    #[test]
    fn test_next_code_with_no_students() {
        assert_eq!(next_student_code(std::iter::empty()), "S1001");
    }

    #[test]
    fn test_next_code_below_floor() {
        assert_eq!(next_student_code(["S7"]), "S1001");
    }
}
