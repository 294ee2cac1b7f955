//! The staged validation pipeline.
//!
//! ```text
//! course.xml ──► 1 load course ──► 2 load policy ──► 3 index url_names
//!            ──► 4 merge policy ──► 5 grading policy ──► 6 self checks
//!            ──► 7 standard validators ──► 8 extended validators
//! ```
//!
//! Only stage 1 can end a run early. Running up to stage `k` leaves the
//! course and the store exactly as a full run leaves them after stage `k`.

pub mod index;
pub mod merge;
pub mod walker;

pub use index::{find_url_names, UrlNameIndex};
pub use merge::merge_policy;
pub use walker::{traverse, Traverse};

use crate::models::Course;
use crate::parser::{load_course, load_policy};
use crate::validator::{validate_grading_policy, ErrorStore, Registries};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Root file name used when validating a directory
pub const DEFAULT_ROOT_FILE: &str = "course.xml";

/// One step of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    LoadCourse = 1,
    LoadPolicy = 2,
    IndexUrlNames = 3,
    MergePolicy = 4,
    GradingPolicy = 5,
    SelfValidate = 6,
    StandardValidators = 7,
    ExtendedValidators = 8,
}

/// Stage number outside 0..=8
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stage must be between 0 and 8, got {0}")]
pub struct StageError(pub u8);

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::LoadCourse,
        Stage::LoadPolicy,
        Stage::IndexUrlNames,
        Stage::MergePolicy,
        Stage::GradingPolicy,
        Stage::SelfValidate,
        Stage::StandardValidators,
        Stage::ExtendedValidators,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.number() == n)
    }

    /// Interpret a step count: 0 runs everything
    pub fn from_steps(steps: u8) -> Result<Option<Stage>, StageError> {
        match steps {
            0 => Ok(None),
            n => Stage::from_number(n).map(Some).ok_or(StageError(n)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::LoadCourse => "load-course",
            Stage::LoadPolicy => "load-policy",
            Stage::IndexUrlNames => "index-url-names",
            Stage::MergePolicy => "merge-policy",
            Stage::GradingPolicy => "grading-policy",
            Stage::SelfValidate => "self-validate",
            Stage::StandardValidators => "standard-validators",
            Stage::ExtendedValidators => "extended-validators",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

/// Options for a single validation run
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Last stage to run; `None` runs the whole pipeline
    pub until: Option<Stage>,
    /// Diagnostic codes to hide when reporting
    pub ignore: Vec<String>,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_until(mut self, until: Option<Stage>) -> Self {
        self.until = until;
        self
    }

    pub fn with_ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }

    fn runs(&self, stage: Stage) -> bool {
        self.until.map_or(true, |last| stage <= last)
    }
}

/// Split a location into (directory, root file name)
pub fn resolve_root(location: &Path) -> (PathBuf, String) {
    if location.is_dir() {
        return (location.to_path_buf(), DEFAULT_ROOT_FILE.to_string());
    }
    let directory = location
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let file = location
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_ROOT_FILE.to_string());
    (directory, file)
}

/// Validate the course at `location` (a directory or a root file).
///
/// Returns the course, or `None` if it could not be loaded, together with
/// every diagnostic recorded along the way.
pub fn validate(
    location: &Path,
    options: &ValidateOptions,
    registries: &Registries,
) -> (Option<Course>, ErrorStore) {
    let mut store = ErrorStore::new(options.ignore.iter().cloned());
    let (directory, file) = resolve_root(location);

    let span = tracing::info_span!("validate", course = %location.display());
    let _guard = span.enter();

    // Stage 1
    let Some(mut course) = load_course(&directory, &file, &mut store) else {
        tracing::warn!(diagnostics = store.all().len(), "course failed to load");
        return (None, store);
    };
    finished(Stage::LoadCourse, &store);
    if !options.runs(Stage::LoadPolicy) {
        return (Some(course), store);
    }

    // Stage 2
    let (policy, grading) = load_policy(&directory, &course, &mut store);
    finished(Stage::LoadPolicy, &store);
    if !options.runs(Stage::IndexUrlNames) {
        return (Some(course), store);
    }

    // Stage 3
    let url_names = find_url_names(&course);
    finished(Stage::IndexUrlNames, &store);
    if !options.runs(Stage::MergePolicy) {
        return (Some(course), store);
    }

    // Stage 4
    merge_policy(&mut course, &policy, &url_names, &mut store);
    finished(Stage::MergePolicy, &store);
    if !options.runs(Stage::GradingPolicy) {
        return (Some(course), store);
    }

    // Stage 5
    if let Some(grading) = &grading {
        validate_grading_policy(grading, &course, &mut store);
    }
    finished(Stage::GradingPolicy, &store);
    if !options.runs(Stage::SelfValidate) {
        return (Some(course), store);
    }

    // Stage 6
    for node in traverse(&course) {
        node.validate(&course, &mut store);
    }
    finished(Stage::SelfValidate, &store);
    if !options.runs(Stage::StandardValidators) {
        return (Some(course), store);
    }

    // Stage 7
    for validator in registries.standard.validators() {
        tracing::debug!(validator = validator.name(), "running");
        validator.validate(&course, &mut store, &url_names);
    }
    finished(Stage::StandardValidators, &store);
    if !options.runs(Stage::ExtendedValidators) {
        return (Some(course), store);
    }

    // Stage 8
    for validator in registries.extended.validators() {
        tracing::debug!(validator = validator.name(), "running");
        validator.validate(&course, &mut store, &url_names);
    }
    finished(Stage::ExtendedValidators, &store);

    tracing::info!(
        reported = store.count(),
        recorded = store.all().len(),
        "validation complete"
    );
    (Some(course), store)
}

fn finished(stage: Stage, store: &ErrorStore) {
    tracing::debug!(stage = stage.name(), diagnostics = store.all().len(), "stage finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_steps() {
        assert_eq!(Stage::from_steps(0), Ok(None));
        assert_eq!(Stage::from_steps(1), Ok(Some(Stage::LoadCourse)));
        assert_eq!(Stage::from_steps(8), Ok(Some(Stage::ExtendedValidators)));
        assert_eq!(Stage::from_steps(9), Err(StageError(9)));
    }

    #[test]
    fn test_stage_order() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].number() + 1, pair[1].number());
        }
    }

    #[test]
    fn test_runs() {
        let options = ValidateOptions::new().with_until(Some(Stage::MergePolicy));
        assert!(options.runs(Stage::MergePolicy));
        assert!(!options.runs(Stage::GradingPolicy));
        assert!(ValidateOptions::new().runs(Stage::ExtendedValidators));
    }

    #[test]
    fn test_resolve_root_for_file() {
        let (dir, file) = resolve_root(Path::new("/no/such/dir/root.xml"));
        assert_eq!(dir, PathBuf::from("/no/such/dir"));
        assert_eq!(file, "root.xml");
    }
}
