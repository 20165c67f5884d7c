use std::path::Path;

use crate::error::HarnessError;

/// Prompts used when none are given on the command line
pub const DEFAULT_TEST_CASES: &[&str] = &[
    "Two cloud architects from HDI are looking if they can get rid of the platform team and use EKS Auto mode",
    "Tell me a short story about a brave knight.",
    "What is the capital of France?",
];

pub fn default_test_cases() -> Vec<String> {
    DEFAULT_TEST_CASES.iter().map(|s| s.to_string()).collect()
}

/// One prompt per line; blank lines and `#` comments are skipped.
pub fn parse_test_cases(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_test_cases(path: &Path) -> Result<Vec<String>, HarnessError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_test_cases(&text))
}
