use super::course::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Severity level for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The course will not behave correctly on import
    Error,
    /// Probably a mistake, but the course still imports
    Warning,
    /// Informational only
    Info,
}

impl Severity {
    /// Get display symbol for severity
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Error => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "🔵",
        }
    }

    /// Get display name for severity
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// Stable diagnostic code, used for suppression matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Course loading
    FileNotFound,
    XmlParseError,
    UnexpectedRootTag,
    CircularReference,
    PathOutsideCourse,
    // Policy loading
    PolicyNotFound,
    PolicyParseError,
    InvalidPolicyEntry,
    GradingPolicyNotFound,
    GradingPolicyParseError,
    // Policy merge
    PolicyTargetMissing,
    PolicyConflict,
    // Grading policy
    GraderWeightSum,
    InvalidDropCount,
    InvalidGradeCutoff,
    DuplicateGraderType,
    UnknownAssignmentType,
    UnusedGrader,
    // Per-node checks
    InvalidUrlName,
    InvalidChildType,
    MissingRequiredAttribute,
    InvalidDate,
    EndBeforeStart,
    MissingDisplayName,
    MissingUrlName,
    EmptyProblem,
    VideoMissingSource,
    UnknownTag,
    // Cross-object checks
    DuplicateUrlName,
    DuplicateDiscussionId,
    StartBeforeParent,
    EmptyContainer,
    // Expensive cross-object checks
    MissingStaticFile,
    UnreferencedFile,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 34] = [
        DiagnosticCode::FileNotFound,
        DiagnosticCode::XmlParseError,
        DiagnosticCode::UnexpectedRootTag,
        DiagnosticCode::CircularReference,
        DiagnosticCode::PathOutsideCourse,
        DiagnosticCode::PolicyNotFound,
        DiagnosticCode::PolicyParseError,
        DiagnosticCode::InvalidPolicyEntry,
        DiagnosticCode::GradingPolicyNotFound,
        DiagnosticCode::GradingPolicyParseError,
        DiagnosticCode::PolicyTargetMissing,
        DiagnosticCode::PolicyConflict,
        DiagnosticCode::GraderWeightSum,
        DiagnosticCode::InvalidDropCount,
        DiagnosticCode::InvalidGradeCutoff,
        DiagnosticCode::DuplicateGraderType,
        DiagnosticCode::UnknownAssignmentType,
        DiagnosticCode::UnusedGrader,
        DiagnosticCode::InvalidUrlName,
        DiagnosticCode::InvalidChildType,
        DiagnosticCode::MissingRequiredAttribute,
        DiagnosticCode::InvalidDate,
        DiagnosticCode::EndBeforeStart,
        DiagnosticCode::MissingDisplayName,
        DiagnosticCode::MissingUrlName,
        DiagnosticCode::EmptyProblem,
        DiagnosticCode::VideoMissingSource,
        DiagnosticCode::UnknownTag,
        DiagnosticCode::DuplicateUrlName,
        DiagnosticCode::DuplicateDiscussionId,
        DiagnosticCode::StartBeforeParent,
        DiagnosticCode::EmptyContainer,
        DiagnosticCode::MissingStaticFile,
        DiagnosticCode::UnreferencedFile,
    ];

    /// Stable name used in ignore lists and output
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticCode::FileNotFound => "FileNotFound",
            DiagnosticCode::XmlParseError => "XmlParseError",
            DiagnosticCode::UnexpectedRootTag => "UnexpectedRootTag",
            DiagnosticCode::CircularReference => "CircularReference",
            DiagnosticCode::PathOutsideCourse => "PathOutsideCourse",
            DiagnosticCode::PolicyNotFound => "PolicyNotFound",
            DiagnosticCode::PolicyParseError => "PolicyParseError",
            DiagnosticCode::InvalidPolicyEntry => "InvalidPolicyEntry",
            DiagnosticCode::GradingPolicyNotFound => "GradingPolicyNotFound",
            DiagnosticCode::GradingPolicyParseError => "GradingPolicyParseError",
            DiagnosticCode::PolicyTargetMissing => "PolicyTargetMissing",
            DiagnosticCode::PolicyConflict => "PolicyConflict",
            DiagnosticCode::GraderWeightSum => "GraderWeightSum",
            DiagnosticCode::InvalidDropCount => "InvalidDropCount",
            DiagnosticCode::InvalidGradeCutoff => "InvalidGradeCutoff",
            DiagnosticCode::DuplicateGraderType => "DuplicateGraderType",
            DiagnosticCode::UnknownAssignmentType => "UnknownAssignmentType",
            DiagnosticCode::UnusedGrader => "UnusedGrader",
            DiagnosticCode::InvalidUrlName => "InvalidUrlName",
            DiagnosticCode::InvalidChildType => "InvalidChildType",
            DiagnosticCode::MissingRequiredAttribute => "MissingRequiredAttribute",
            DiagnosticCode::InvalidDate => "InvalidDate",
            DiagnosticCode::EndBeforeStart => "EndBeforeStart",
            DiagnosticCode::MissingDisplayName => "MissingDisplayName",
            DiagnosticCode::MissingUrlName => "MissingUrlName",
            DiagnosticCode::EmptyProblem => "EmptyProblem",
            DiagnosticCode::VideoMissingSource => "VideoMissingSource",
            DiagnosticCode::UnknownTag => "UnknownTag",
            DiagnosticCode::DuplicateUrlName => "DuplicateUrlName",
            DiagnosticCode::DuplicateDiscussionId => "DuplicateDiscussionId",
            DiagnosticCode::StartBeforeParent => "StartBeforeParent",
            DiagnosticCode::EmptyContainer => "EmptyContainer",
            DiagnosticCode::MissingStaticFile => "MissingStaticFile",
            DiagnosticCode::UnreferencedFile => "UnreferencedFile",
        }
    }

    /// Severity attached to every diagnostic carrying this code
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::PolicyNotFound
            | DiagnosticCode::GradingPolicyNotFound
            | DiagnosticCode::PolicyTargetMissing
            | DiagnosticCode::UnusedGrader
            | DiagnosticCode::MissingDisplayName
            | DiagnosticCode::MissingUrlName
            | DiagnosticCode::EmptyProblem
            | DiagnosticCode::VideoMissingSource
            | DiagnosticCode::StartBeforeParent
            | DiagnosticCode::EmptyContainer
            | DiagnosticCode::MissingStaticFile => Severity::Warning,
            DiagnosticCode::PolicyConflict
            | DiagnosticCode::UnknownTag
            | DiagnosticCode::UnreferencedFile => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// One-line description for `olxcheck codes`
    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticCode::FileNotFound => "A referenced file does not exist",
            DiagnosticCode::XmlParseError => "A file is not well-formed XML",
            DiagnosticCode::UnexpectedRootTag => "A file's root tag does not match what points to it",
            DiagnosticCode::CircularReference => "A pointer tag leads back to a file already being loaded",
            DiagnosticCode::PathOutsideCourse => "A url_name or filename resolves outside the course directory",
            DiagnosticCode::PolicyNotFound => "No policy.json was found for the course",
            DiagnosticCode::PolicyParseError => "policy.json is not a valid JSON object",
            DiagnosticCode::InvalidPolicyEntry => "A policy entry has a malformed key or value",
            DiagnosticCode::GradingPolicyNotFound => "No grading_policy.json was found for the course",
            DiagnosticCode::GradingPolicyParseError => "grading_policy.json could not be parsed",
            DiagnosticCode::PolicyTargetMissing => "A policy entry names an object that is not in the course",
            DiagnosticCode::PolicyConflict => "A policy attribute is shadowed by an inline attribute",
            DiagnosticCode::GraderWeightSum => "Grader weights are out of range or do not sum to 1",
            DiagnosticCode::InvalidDropCount => "A grader drops more assignments than it counts",
            DiagnosticCode::InvalidGradeCutoff => "A grade cutoff is outside (0, 1]",
            DiagnosticCode::DuplicateGraderType => "Two graders share an assignment type",
            DiagnosticCode::UnknownAssignmentType => "A graded subsection uses a format with no grader",
            DiagnosticCode::UnusedGrader => "A grader type is not used by any subsection",
            DiagnosticCode::InvalidUrlName => "A url_name is empty or contains invalid characters",
            DiagnosticCode::InvalidChildType => "An object contains a child of a type it cannot hold",
            DiagnosticCode::MissingRequiredAttribute => "A required attribute is missing",
            DiagnosticCode::InvalidDate => "A date attribute cannot be parsed",
            DiagnosticCode::EndBeforeStart => "The course ends before it starts",
            DiagnosticCode::MissingDisplayName => "An object has no display_name",
            DiagnosticCode::MissingUrlName => "A structural object has no url_name",
            DiagnosticCode::EmptyProblem => "A problem has no content",
            DiagnosticCode::VideoMissingSource => "A video has no YouTube id or HTML5 source",
            DiagnosticCode::UnknownTag => "A tag is not one of the known content types",
            DiagnosticCode::DuplicateUrlName => "Two or more objects share a url_name",
            DiagnosticCode::DuplicateDiscussionId => "Two or more discussions share a discussion_id",
            DiagnosticCode::StartBeforeParent => "An object starts before its enclosing object",
            DiagnosticCode::EmptyContainer => "A chapter, sequential or vertical has no children",
            DiagnosticCode::MissingStaticFile => "A /static/ link points at a file that does not exist",
            DiagnosticCode::UnreferencedFile => "A content file is never referenced by the course",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiagnosticCode {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagnosticCode::ALL
            .iter()
            .copied()
            .find(|code| code.name() == s)
            .ok_or_else(|| UnknownCode(s.to_string()))
    }
}

/// Returned when a string does not name any diagnostic code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagnostic code '{0}'")]
pub struct UnknownCode(pub String);

/// A single finding recorded during validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Offending content objects, if any (several for collisions)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeId>,
    /// File the finding relates to, if not attached to a node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new diagnostic; severity follows the code
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            nodes: Vec::new(),
            file: None,
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Format diagnostic for display
    pub fn format(&self) -> String {
        match &self.file {
            Some(file) => format!(
                "{} [{}] {}: {} ({})",
                self.severity.symbol(),
                self.severity.name(),
                self.code,
                self.message,
                file.display()
            ),
            None => format!(
                "{} [{}] {}: {}",
                self.severity.symbol(),
                self.severity.name(),
                self.code,
                self.message
            ),
        }
    }
}
