//! Log excerpt extraction
//!
//! Reduces a raw log stream to the bounded tail of lines that indicate
//! trouble. The excerpt is what gets fingerprinted and handed to the
//! inference service, so its content must depend only on the error lines
//! themselves.

/// Maximum number of matching lines kept in an excerpt
pub const MAX_EXCERPT_LINES: usize = 100;

/// Returns true if a single log line signals an error
fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error") || lower.contains("exception")
}

/// Extract the relevant tail of a raw log stream.
///
/// Keeps only lines containing "error" or "exception" (case-insensitive),
/// capped at the last [`MAX_EXCERPT_LINES`] matches, in original order.
/// Empty input yields an empty excerpt.
pub fn extract_error_lines(raw: &str) -> Vec<String> {
    let matching: Vec<&str> = raw.lines().filter(|line| is_error_line(line)).collect();
    let start = matching.len().saturating_sub(MAX_EXCERPT_LINES);
    matching[start..].iter().map(|s| (*s).to_string()).collect()
}

/// Join an excerpt back into the text form used for fingerprinting and
/// diagnosis context.
pub fn excerpt_text(lines: &[String]) -> String {
    lines.join("\n")
}
