use super::store::ErrorStore;
use crate::models::{Course, Diagnostic, DiagnosticCode, GradingPolicy, NodeKind};
use std::collections::{BTreeMap, BTreeSet};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Check grading_policy.json against itself and against the graded
/// subsections of the course
pub fn validate_grading_policy(grading: &GradingPolicy, course: &Course, store: &mut ErrorStore) {
    check_graders(grading, store);
    check_cutoffs(grading, store);
    check_assignment_types(grading, course, store);
}

fn check_graders(grading: &GradingPolicy, store: &mut ErrorStore) {
    let mut seen = BTreeSet::new();
    let mut total = 0.0;

    for grader in &grading.graders {
        if !seen.insert(grader.assignment_type.as_str()) {
            store.add(Diagnostic::new(
                DiagnosticCode::DuplicateGraderType,
                format!("assignment type '{}' has more than one grader", grader.assignment_type),
            ));
        }
        if !(0.0..=1.0).contains(&grader.weight) {
            store.add(Diagnostic::new(
                DiagnosticCode::GraderWeightSum,
                format!(
                    "grader '{}' has weight {} outside [0, 1]",
                    grader.assignment_type, grader.weight
                ),
            ));
        }
        if grader.drop_count > grader.min_count {
            store.add(Diagnostic::new(
                DiagnosticCode::InvalidDropCount,
                format!(
                    "grader '{}' drops {} of only {} assignments",
                    grader.assignment_type, grader.drop_count, grader.min_count
                ),
            ));
        }
        total += grader.weight;
    }

    if !grading.graders.is_empty() && (total - 1.0).abs() > WEIGHT_TOLERANCE {
        store.add(Diagnostic::new(
            DiagnosticCode::GraderWeightSum,
            format!("grader weights sum to {}, not 1", total),
        ));
    }
}

fn check_cutoffs(grading: &GradingPolicy, store: &mut ErrorStore) {
    for (label, cutoff) in &grading.cutoffs {
        if *cutoff <= 0.0 || *cutoff > 1.0 {
            store.add(Diagnostic::new(
                DiagnosticCode::InvalidGradeCutoff,
                format!("grade cutoff '{}' is {}, outside (0, 1]", label, cutoff),
            ));
        }
    }
}

fn check_assignment_types(grading: &GradingPolicy, course: &Course, store: &mut ErrorStore) {
    let mut used: BTreeMap<&str, usize> = grading
        .graders
        .iter()
        .map(|g| (g.assignment_type.as_str(), 0))
        .collect();

    for node in course.traverse() {
        if node.kind != NodeKind::Sequential || !node.flag("graded") {
            continue;
        }
        match node.attr("format") {
            Some(format) => match used.get_mut(format.as_str()) {
                Some(count) => *count += 1,
                None => store.add(
                    Diagnostic::new(
                        DiagnosticCode::UnknownAssignmentType,
                        format!(
                            "graded {} uses format '{}', which has no grader",
                            node.label(),
                            format
                        ),
                    )
                    .with_node(node.id),
                ),
            },
            None => store.add(
                Diagnostic::new(
                    DiagnosticCode::UnknownAssignmentType,
                    format!("graded {} has no format", node.label()),
                )
                .with_node(node.id),
            ),
        }
    }

    for (assignment_type, count) in used {
        if count == 0 {
            store.add(Diagnostic::new(
                DiagnosticCode::UnusedGrader,
                format!("no graded subsection uses assignment type '{}'", assignment_type),
            ));
        }
    }
}
