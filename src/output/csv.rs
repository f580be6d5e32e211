//! CSV export of allowlist violations.

use super::terminal::format_field;
use crate::AuditFinding;

/// Render every violation as one CSV row. Resources with a clean verdict
/// contribute no rows.
pub fn render_violations_csv(findings: &[AuditFinding]) -> String {
    let mut out = String::new();
    out.push_str(r#""resource","kind","verdict","ip","port""#);
    out.push('\n');
    for f in findings {
        for violation in &f.violations {
            out.push_str(&format!(
                "{resource},{kind},{verdict},{ip},{port}\n",
                resource = format_field(&f.resource, 0),
                kind = format_field(f.kind, 0),
                verdict = format_field(f.verdict, 0),
                ip = format_field(&violation.ip, 0),
                port = format_field(&violation.port, 0),
            ));
        }
    }
    out
}

/// Print the violation CSV to stdout.
pub fn print_violations_csv(findings: &[AuditFinding]) {
    log::info!("#Start print_violations_csv() with {} findings", findings.len());
    print!("{}", render_violations_csv(findings));
}
