use crate::models::{DiagnosticCode, Severity};
use crate::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CodeEntry {
    code: DiagnosticCode,
    severity: Severity,
    description: &'static str,
}

/// List every diagnostic code with its severity
pub fn run(json: bool) -> Result<()> {
    if json {
        let entries: Vec<_> = DiagnosticCode::ALL
            .iter()
            .map(|code| CodeEntry {
                code: *code,
                severity: code.severity(),
                description: code.description(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for code in DiagnosticCode::ALL {
        let severity = format!("{:<8}", code.severity().name());
        let severity = match code.severity() {
            Severity::Error => severity.red(),
            Severity::Warning => severity.yellow(),
            Severity::Info => severity.bright_black(),
        };
        println!(
            "{} {} {}",
            format!("{:<26}", code.name()).bold(),
            severity,
            code.description()
        );
    }
    Ok(())
}
