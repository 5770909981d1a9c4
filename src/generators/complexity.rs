// Wistro Coder: Complexity Heuristic
// Scores generated logic from surface features: length, branching keywords,
// bracket nesting and call density.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Raw substrings counted towards the branching score. Not tokenized and not
/// case-normalized, so `"elif"` also counts as an `"if"`.
pub const BRANCH_KEYWORDS: [&str; 9] = [
    "if", "else", "elif", "for", "while", "case", "switch", "try", "except",
];

pub const LENGTH_WEIGHT: f64 = 20.0;
pub const BRANCHING_WEIGHT: f64 = 40.0;
pub const NESTING_WEIGHT: f64 = 20.0;
pub const CALL_WEIGHT: f64 = 20.0;

static CALL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\(").unwrap());

/// Per-component breakdown of the complexity score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub length: f64,
    pub branching: f64,
    pub nesting: f64,
    pub calls: f64,
}

impl ComplexityReport {
    pub fn analyze(logic: &str) -> Self {
        let line_count = logic.lines().count();
        let length = (line_count as f64 / 50.0).min(1.0) * LENGTH_WEIGHT;

        let branch_count: usize = BRANCH_KEYWORDS
            .iter()
            .map(|keyword| logic.matches(keyword).count())
            .sum();
        let branching = (branch_count as f64 / 10.0).min(1.0) * BRANCHING_WEIGHT;

        // Not clamped at zero: `def` can outnumber every bracket kind.
        let bracket_count = logic
            .matches('{')
            .count()
            .max(logic.matches('(').count())
            .max(logic.matches(':').count());
        let nesting_level = bracket_count as i64 - logic.matches("def").count() as i64;
        let nesting = (nesting_level as f64 / 5.0).min(1.0) * NESTING_WEIGHT;

        let call_count = CALL_PATTERN.find_iter(logic).count();
        let calls = (call_count as f64 / 15.0).min(1.0) * CALL_WEIGHT;

        Self {
            length,
            branching,
            nesting,
            calls,
        }
    }

    pub fn total(&self) -> f64 {
        self.length + self.branching + self.nesting + self.calls
    }

    /// Integer score, truncated toward zero
    pub fn score(&self) -> i32 {
        self.total() as i32
    }
}

/// Complexity score of generated logic, nominally 0 to 100
pub fn calculate_complexity(logic: &str) -> i32 {
    ComplexityReport::analyze(logic).score()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORIAL: &str = "def factorial(n):\n    if n == 0:\n        return 1\n    else:\n        return n * factorial(n - 1)";

    #[test]
    fn test_empty_logic_scores_zero() {
        let report = ComplexityReport::analyze("");
        assert_eq!(report, ComplexityReport::default());
        assert_eq!(calculate_complexity(""), 0);
    }

    #[test]
    fn test_factorial_breakdown() {
        let report = ComplexityReport::analyze(FACTORIAL);
        // 5 lines, 2 keywords (if, else), max(0, 2, 3) - 1 def, 2 calls
        assert!((report.length - 2.0).abs() < 1e-9);
        assert!((report.branching - 8.0).abs() < 1e-9);
        assert!((report.nesting - 8.0).abs() < 1e-9);
        assert!((report.calls - 20.0 * 2.0 / 15.0).abs() < 1e-9);
        assert_eq!(report.score(), 20);
    }

    #[test]
    fn test_def_only_goes_negative() {
        let report = ComplexityReport::analyze("def");
        assert!((report.nesting + 4.0).abs() < 1e-9);
        assert_eq!(report.score(), -3);
    }

    #[test]
    fn test_keywords_are_raw_substrings() {
        // "elif" holds both "elif" and "if"; "If" is not counted
        let report = ComplexityReport::analyze("elif If");
        assert!((report.branching - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_branching_is_monotonic_until_cap() {
        let mut previous = calculate_complexity("x");
        for count in 1..=15 {
            let logic = format!("x{}", "if".repeat(count));
            let score = calculate_complexity(&logic);
            assert!(score >= previous, "score dropped at {} keywords", count);
            previous = score;
        }
        assert_eq!(
            calculate_complexity(&format!("x{}", "if".repeat(10))),
            calculate_complexity(&format!("x{}", "if".repeat(15)))
        );
    }

    #[test]
    fn test_every_component_caps() {
        let mut logic = String::new();
        for i in 0..60 {
            logic.push_str(&format!("if call{}(x): {{ while y: try_it() }}\n", i));
        }
        let report = ComplexityReport::analyze(&logic);
        assert_eq!(report.length, LENGTH_WEIGHT);
        assert_eq!(report.branching, BRANCHING_WEIGHT);
        assert_eq!(report.nesting, NESTING_WEIGHT);
        assert_eq!(report.calls, CALL_WEIGHT);
        assert_eq!(report.score(), 100);
    }

    #[test]
    fn test_call_pattern_needs_word_before_paren() {
        let report = ComplexityReport::analyze("(a) + foo(b) + bar (c)");
        assert!((report.calls - 20.0 / 15.0).abs() < 1e-9);
    }
}
