use crate::models::{
    Course, Diagnostic, DiagnosticCode, OlxcheckConfig, OutputFormat, Severity,
};
use crate::pipeline::{resolve_root, validate, Stage, ValidateOptions};
use crate::validator::{ErrorStore, Registries};
use crate::Result;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Options for the validate command, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct ValidateCommand {
    pub path: PathBuf,
    pub steps: Option<u8>,
    pub ignore: Vec<String>,
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

/// Settings after combining config file and flags
#[derive(Debug, Clone, PartialEq)]
pub struct Effective {
    pub until: Option<Stage>,
    pub ignore: Vec<String>,
    pub format: OutputFormat,
}

impl ValidateCommand {
    /// Merge flags over config: ignore lists are unioned, steps and
    /// format are replaced when given on the command line
    pub fn effective(&self, config: &OlxcheckConfig) -> Result<Effective> {
        let steps = self.steps.or(config.steps).unwrap_or(0);
        let until = Stage::from_steps(steps)?;

        let ignore: BTreeSet<String> = config
            .ignore
            .iter()
            .chain(self.ignore.iter())
            .cloned()
            .collect();

        let format = if self.json {
            OutputFormat::Json
        } else {
            config.format
        };

        Ok(Effective {
            until,
            ignore: ignore.into_iter().collect(),
            format,
        })
    }

    fn load_config(&self) -> Result<OlxcheckConfig> {
        match &self.config {
            Some(path) => OlxcheckConfig::load_from(path),
            None => {
                let (directory, _) = resolve_root(&self.path);
                OlxcheckConfig::load(&directory)
            }
        }
    }
}

/// Counts by severity for reported diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// One diagnostic in JSON output
#[derive(Debug, Clone, Serialize)]
pub struct JsonDiagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Full JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub valid: bool,
    pub loaded: bool,
    pub counts: SeverityCounts,
    pub suppressed: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
}

impl JsonReport {
    pub fn new(course: Option<&Course>, store: &ErrorStore) -> Self {
        let diagnostics: Vec<JsonDiagnostic> = store
            .diagnostics()
            .map(|d| JsonDiagnostic {
                code: d.code,
                severity: d.severity,
                message: d.message.clone(),
                objects: object_labels(course, d),
                file: location_file(course, d),
            })
            .collect();

        Self {
            valid: course.is_some() && !store.has_errors(),
            loaded: course.is_some(),
            counts: counts(store),
            suppressed: store.all().len() - diagnostics.len(),
            diagnostics,
        }
    }
}

fn counts(store: &ErrorStore) -> SeverityCounts {
    SeverityCounts {
        errors: store.count_by_severity(Severity::Error),
        warnings: store.count_by_severity(Severity::Warning),
        info: store.count_by_severity(Severity::Info),
    }
}

fn object_labels(course: Option<&Course>, diagnostic: &Diagnostic) -> Vec<String> {
    let Some(course) = course else {
        return Vec::new();
    };
    diagnostic
        .nodes
        .iter()
        .filter_map(|id| course.get(*id))
        .map(|node| node.label())
        .collect()
}

fn location_file(course: Option<&Course>, diagnostic: &Diagnostic) -> Option<PathBuf> {
    if let Some(file) = &diagnostic.file {
        return Some(file.clone());
    }
    let course = course?;
    let id = diagnostic.nodes.first()?;
    course.get(*id).map(|node| node.file.clone())
}

/// Run the validate command. Returns whether the course passed.
pub fn run(command: &ValidateCommand, registries: &Registries) -> Result<bool> {
    let config = command.load_config()?;
    let effective = command.effective(&config)?;

    for code in &effective.ignore {
        if code.parse::<DiagnosticCode>().is_err() {
            tracing::warn!(code = %code, "ignoring unknown diagnostic code");
        }
    }

    let text = effective.format == OutputFormat::Text;
    if text && !command.quiet {
        println!(
            "{}",
            format!("🔍 Validating course: {}", command.path.display()).cyan()
        );
        if let Some(stage) = effective.until {
            println!("{}", format!("   Stopping after stage {}", stage).bright_black());
        }
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
    }

    let options = ValidateOptions::new()
        .with_until(effective.until)
        .with_ignore(effective.ignore.iter().cloned());
    let (course, store) = validate(&command.path, &options, registries);
    let report = JsonReport::new(course.as_ref(), &store);

    match effective.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for diagnostic in store.diagnostics() {
                print_diagnostic(course.as_ref(), diagnostic, command.verbose);
            }
            if !command.quiet {
                print_summary(&report);
            }
        }
    }

    Ok(report.valid)
}

fn print_diagnostic(course: Option<&Course>, diagnostic: &Diagnostic, verbose: bool) {
    let severity_label = match diagnostic.severity {
        Severity::Error => "ERROR:".red(),
        Severity::Warning => "WARNING:".yellow(),
        Severity::Info => "INFO:".bright_black(),
    };

    if verbose {
        let mut location = object_labels(course, diagnostic).join(", ");
        if let Some(file) = location_file(course, diagnostic) {
            if !location.is_empty() {
                location.push_str(" in ");
            }
            location.push_str(&file.display().to_string());
        }
        println!(
            "{} {} {} ({})",
            severity_label,
            diagnostic.code.name().bold(),
            diagnostic.message,
            location.bright_black()
        );
    } else {
        println!(
            "{} {} {}",
            severity_label,
            diagnostic.code.name().bold(),
            diagnostic.message
        );
    }
}

fn print_summary(report: &JsonReport) {
    println!();
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
    if !report.loaded {
        println!("{}", "❌ Course could not be loaded".red().bold());
        return;
    }

    let line = format!(
        "{} error(s), {} warning(s), {} info",
        report.counts.errors, report.counts.warnings, report.counts.info
    );
    if report.valid {
        println!("{} {}", "✅ Passed:".green().bold(), line);
    } else {
        println!("{} {}", "❌ Failed:".red().bold(), line);
    }
    if report.suppressed > 0 {
        println!(
            "{}",
            format!("   {} suppressed finding(s) not shown", report.suppressed).bright_black()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_merges_config_and_flags() {
        let config = OlxcheckConfig {
            ignore: vec!["UnreferencedFile".into(), "UnknownTag".into()],
            steps: Some(7),
            format: OutputFormat::Text,
        };
        let command = ValidateCommand {
            ignore: vec!["UnknownTag".into(), "EmptyContainer".into()],
            json: true,
            ..ValidateCommand::default()
        };

        let effective = command.effective(&config).unwrap();
        assert_eq!(effective.until, Some(Stage::StandardValidators));
        assert_eq!(
            effective.ignore,
            vec!["EmptyContainer", "UnknownTag", "UnreferencedFile"]
        );
        assert_eq!(effective.format, OutputFormat::Json);
    }

    #[test]
    fn test_flag_steps_override_config() {
        let config = OlxcheckConfig {
            steps: Some(7),
            ..OlxcheckConfig::default()
        };
        let command = ValidateCommand {
            steps: Some(0),
            ..ValidateCommand::default()
        };
        assert_eq!(command.effective(&config).unwrap().until, None);
    }

    #[test]
    fn test_out_of_range_steps() {
        let command = ValidateCommand {
            steps: Some(12),
            ..ValidateCommand::default()
        };
        assert!(command.effective(&OlxcheckConfig::default()).is_err());
    }

    #[test]
    fn test_report_for_unloaded_course() {
        let mut store = ErrorStore::default();
        store.add(Diagnostic::new(DiagnosticCode::FileNotFound, "gone"));
        let report = JsonReport::new(None, &store);
        assert!(!report.valid);
        assert!(!report.loaded);
        assert_eq!(report.counts.errors, 1);
    }
}
