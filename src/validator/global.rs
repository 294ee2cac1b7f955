//! Standard-tier validators: cheap checks across the whole course.

use super::dates::node_date;
use super::registry::Validator;
use super::store::ErrorStore;
use crate::models::{Course, Diagnostic, DiagnosticCode, NodeId, NodeKind};
use crate::pipeline::UrlNameIndex;
use std::collections::BTreeMap;

/// One diagnostic per url_name declared by more than one node
pub struct DuplicateUrlNames;

impl Validator for DuplicateUrlNames {
    fn name(&self) -> &'static str {
        "duplicate-url-names"
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, url_names: &UrlNameIndex) {
        for (url_name, ids) in url_names.collisions() {
            let tags: Vec<_> = ids.iter().map(|id| course.node(*id).tag()).collect();
            store.add(
                Diagnostic::new(
                    DiagnosticCode::DuplicateUrlName,
                    format!(
                        "url_name '{}' is used by {} objects ({})",
                        url_name,
                        ids.len(),
                        tags.join(", ")
                    ),
                )
                .with_nodes(ids.iter().copied()),
            );
        }
    }
}

/// Discussion components must not share a discussion_id
pub struct DuplicateDiscussionIds;

impl Validator for DuplicateDiscussionIds {
    fn name(&self) -> &'static str {
        "duplicate-discussion-ids"
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, _url_names: &UrlNameIndex) {
        let mut by_id: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for node in course.traverse().filter(|n| n.kind == NodeKind::Discussion) {
            if let Some(id) = node.attr("discussion_id") {
                by_id.entry(id).or_default().push(node.id);
            }
        }

        for (discussion_id, ids) in by_id.into_iter().filter(|(_, ids)| ids.len() > 1) {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::DuplicateDiscussionId,
                    format!(
                        "discussion_id '{}' is used by {} discussions",
                        discussion_id,
                        ids.len()
                    ),
                )
                .with_nodes(ids),
            );
        }
    }
}

/// Nothing may start before the nearest ancestor that has a start date
pub struct StartDates;

impl Validator for StartDates {
    fn name(&self) -> &'static str {
        "start-dates"
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, _url_names: &UrlNameIndex) {
        for node in course.traverse() {
            let Some(start) = node_date(node, "start") else {
                continue;
            };
            let ancestor = course
                .ancestors(node.id)
                .find_map(|a| node_date(a, "start").map(|date| (a, date)));
            if let Some((ancestor, ancestor_start)) = ancestor {
                if start < ancestor_start {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::StartBeforeParent,
                            format!(
                                "{} starts {} but its enclosing {} starts {}",
                                node.label(),
                                start,
                                ancestor.label(),
                                ancestor_start
                            ),
                        )
                        .with_node(node.id),
                    );
                }
            }
        }
    }
}

/// Chapters, sequentials and verticals should contain something
pub struct EmptyContainers;

impl Validator for EmptyContainers {
    fn name(&self) -> &'static str {
        "empty-containers"
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, _url_names: &UrlNameIndex) {
        for node in course.traverse() {
            if node.kind.is_structural() && node.children.is_empty() {
                store.add(
                    Diagnostic::new(
                        DiagnosticCode::EmptyContainer,
                        format!("{} is empty", node.label()),
                    )
                    .with_node(node.id),
                );
            }
        }
    }
}
