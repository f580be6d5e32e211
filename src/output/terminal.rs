//! Terminal report rendering.
//!
//! Provides formatting helpers and the colored per-resource compliance
//! report.

use crate::models::UnknownBool;
use crate::AuditFinding;
use colored::Colorize;
use itertools::Itertools;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

fn verdict_label(verdict: UnknownBool) -> colored::ColoredString {
    match verdict {
        UnknownBool::True => "ok".green(),
        UnknownBool::False => "FAIL".red(),
        UnknownBool::NotApplicable => "n/a".dimmed(),
        UnknownBool::Unknown => "??".yellow(),
    }
}

/// Print the compliance report for a full audit run.
pub fn print_report(findings: &[AuditFinding]) {
    log::info!("#Start print_report() with {} findings", findings.len());

    for f in findings {
        let violations = f.violations.iter().map(ToString::to_string).join(", ");
        let detail = match &f.error {
            Some(e) => format!("check failed: {e}").red().to_string(),
            None => violations,
        };
        println!(
            "{label:>6}  {kind:<12} {resource:<32} {detail}",
            label = verdict_label(f.verdict),
            kind = f.kind,
            resource = f.resource,
        );
    }

    let (ok, fail, unknown, na) = summarize(findings);
    println!(
        "{} checked: {} ok, {} failing, {} unknown, {} n/a",
        findings.len(),
        ok.to_string().green(),
        fail.to_string().red(),
        unknown.to_string().yellow(),
        na
    );
}

fn summarize(findings: &[AuditFinding]) -> (usize, usize, usize, usize) {
    let mut ok = 0;
    let mut fail = 0;
    let mut unknown = 0;
    let mut na = 0;
    for f in findings {
        match f.verdict {
            UnknownBool::True => ok += 1,
            UnknownBool::False => fail += 1,
            UnknownBool::Unknown => unknown += 1,
            UnknownBool::NotApplicable => na += 1,
        }
    }
    (ok, fail, unknown, na)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 6), "\"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "\"long_value\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "  \"42\"");
    }

    #[test]
    fn test_summarize() {
        let findings = vec![
            AuditFinding {
                resource: "a".to_string(),
                kind: "redis",
                verdict: UnknownBool::False,
                violations: Vec::new(),
                error: None,
            },
            AuditFinding {
                resource: "b".to_string(),
                kind: "sql",
                verdict: UnknownBool::True,
                violations: Vec::new(),
                error: None,
            },
        ];
        assert_eq!(summarize(&findings), (1, 1, 0, 0));
    }
}
