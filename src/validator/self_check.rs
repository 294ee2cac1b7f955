//! Per-object checks, run once per node at stage 6.
//!
//! Dispatch is by [`NodeKind`]; checks shared by every kind (url_name
//! syntax, child types, date attributes) run first.

use super::dates::{node_date, parse_date, DATE_ATTRIBUTES};
use super::store::ErrorStore;
use crate::models::{ContentNode, Course, Diagnostic, DiagnosticCode, NodeKind};
use regex::Regex;
use std::sync::OnceLock;

const DISCUSSION_ATTRIBUTES: [&str; 3] = ["discussion_id", "discussion_category", "discussion_target"];
const VIDEO_SOURCE_ATTRIBUTES: [&str; 3] = ["youtube", "youtube_id_1_0", "html5_sources"];

fn url_name_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").ok())
        .as_ref()
}

impl ContentNode {
    /// Check this node in isolation (plus its direct children's kinds)
    pub fn validate(&self, course: &Course, store: &mut ErrorStore) {
        self.check_url_name(store);
        self.check_children(course, store);
        self.check_dates(store);

        match &self.kind {
            NodeKind::Course => {
                self.check_display_name(store);
                self.require(&["start"], store);
                self.check_course_dates(store);
            }
            NodeKind::Chapter | NodeKind::Sequential | NodeKind::Vertical => {
                if self.url_name.is_none() {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::MissingUrlName,
                            format!("{} has no url_name", self.tag()),
                        )
                        .with_node(self.id),
                    );
                }
                self.check_display_name(store);
            }
            NodeKind::Discussion => self.require(&DISCUSSION_ATTRIBUTES, store),
            NodeKind::Problem => {
                if self.content.is_none() {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::EmptyProblem,
                            format!("{} has no content", self.label()),
                        )
                        .with_node(self.id),
                    );
                }
            }
            NodeKind::Video => {
                let has_attr = VIDEO_SOURCE_ATTRIBUTES
                    .iter()
                    .any(|key| self.attr(key).is_some_and(|v| !v.trim().is_empty()));
                if !has_attr && self.content.is_none() {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::VideoMissingSource,
                            format!("{} has no YouTube id or HTML5 source", self.label()),
                        )
                        .with_node(self.id),
                    );
                }
            }
            NodeKind::Html => {}
            NodeKind::Other(tag) => {
                store.add(
                    Diagnostic::new(DiagnosticCode::UnknownTag, format!("unknown tag <{}>", tag))
                        .with_node(self.id),
                );
            }
        }
    }

    fn check_url_name(&self, store: &mut ErrorStore) {
        let Some(url_name) = &self.url_name else {
            return;
        };
        let valid = url_name_regex().is_some_and(|re| re.is_match(url_name));
        if !valid {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::InvalidUrlName,
                    format!("{} has an invalid url_name '{}'", self.tag(), url_name),
                )
                .with_node(self.id),
            );
        }
    }

    fn check_children(&self, course: &Course, store: &mut ErrorStore) {
        for child in course.children(self.id) {
            if !self.kind.allows_child(&child.kind) {
                store.add(
                    Diagnostic::new(
                        DiagnosticCode::InvalidChildType,
                        format!("{} cannot contain {}", self.label(), child.label()),
                    )
                    .with_node(child.id),
                );
            }
        }
    }

    fn check_dates(&self, store: &mut ErrorStore) {
        for key in DATE_ATTRIBUTES {
            if let Some(value) = self.attr(key) {
                if parse_date(&value).is_none() {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::InvalidDate,
                            format!("{} has an unparseable {} date '{}'", self.label(), key, value),
                        )
                        .with_node(self.id),
                    );
                }
            }
        }
    }

    fn check_course_dates(&self, store: &mut ErrorStore) {
        if let (Some(start), Some(end)) = (node_date(self, "start"), node_date(self, "end")) {
            if end < start {
                store.add(
                    Diagnostic::new(
                        DiagnosticCode::EndBeforeStart,
                        format!("course ends ({}) before it starts ({})", end, start),
                    )
                    .with_node(self.id),
                );
            }
        }
    }

    fn check_display_name(&self, store: &mut ErrorStore) {
        let present = self
            .attr("display_name")
            .is_some_and(|name| !name.trim().is_empty());
        if !present {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::MissingDisplayName,
                    format!("{} has no display_name", self.label()),
                )
                .with_node(self.id),
            );
        }
    }

    fn require(&self, keys: &[&str], store: &mut ErrorStore) {
        for key in keys {
            if self.attr(key).is_none() {
                store.add(
                    Diagnostic::new(
                        DiagnosticCode::MissingRequiredAttribute,
                        format!("{} is missing required attribute '{}'", self.label(), key),
                    )
                    .with_node(self.id),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn node(tag: &str, pairs: &[(&str, &str)]) -> ContentNode {
        let attrs: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ContentNode::new(tag, attrs, "course.xml")
    }

    fn good_course() -> Course {
        Course::new(
            "/c",
            node(
                "course",
                &[("url_name", "2014"), ("display_name", "Demo"), ("start", "2014-01-01")],
            ),
        )
    }

    fn check_all(course: &Course) -> ErrorStore {
        let mut store = ErrorStore::default();
        for n in course.traverse() {
            n.validate(course, &mut store);
        }
        store
    }

    #[test]
    fn test_clean_course() {
        let mut course = good_course();
        let root = course.root_id();
        course.push_child(root, node("chapter", &[("url_name", "w1"), ("display_name", "W1")]));
        let store = check_all(&course);
        assert!(store.all().is_empty(), "{:?}", store.all());
    }

    #[test]
    fn test_course_requires_start_and_display_name() {
        let course = Course::new("/c", node("course", &[]));
        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::MissingRequiredAttribute), 1);
        assert_eq!(store.count_code(DiagnosticCode::MissingDisplayName), 1);
    }

    #[test]
    fn test_end_before_start() {
        let course = Course::new(
            "/c",
            node(
                "course",
                &[("display_name", "D"), ("start", "2015-01-01"), ("end", "2014-01-01")],
            ),
        );
        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::EndBeforeStart), 1);
    }

    #[test]
    fn test_invalid_child_and_url_name() {
        let mut course = good_course();
        let root = course.root_id();
        course.push_child(
            root,
            node("vertical", &[("url_name", "bad name"), ("display_name", "V")]),
        );
        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::InvalidChildType), 1);
        assert_eq!(store.count_code(DiagnosticCode::InvalidUrlName), 1);
    }

    #[test]
    fn test_invalid_date() {
        let mut course = good_course();
        let root = course.root_id();
        course.push_child(
            root,
            node(
                "chapter",
                &[("url_name", "w1"), ("display_name", "W1"), ("start", "soon")],
            ),
        );
        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::InvalidDate), 1);
    }

    #[test]
    fn test_null_policy_date_is_not_checked() {
        let mut course = good_course();
        let root = course.root_id();
        let ch = course.push_child(root, node("chapter", &[("url_name", "w1"), ("display_name", "W1")]));
        course
            .node_mut(ch)
            .resolved
            .insert("due".into(), serde_json::Value::Null);
        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::InvalidDate), 0);
    }

    #[test]
    fn test_leaf_rules() {
        let mut course = good_course();
        let root = course.root_id();
        let ch = course.push_child(root, node("chapter", &[("url_name", "c"), ("display_name", "C")]));
        let seq = course.push_child(ch, node("sequential", &[("url_name", "s"), ("display_name", "S")]));
        let v = course.push_child(seq, node("vertical", &[("url_name", "v"), ("display_name", "V")]));
        course.push_child(v, node("problem", &[("url_name", "p")]));
        course.push_child(v, node("video", &[("url_name", "vid")]));
        course.push_child(v, node("video", &[("url_name", "yt"), ("youtube_id_1_0", "abc")]));
        course.push_child(v, node("discussion", &[("url_name", "d"), ("discussion_id", "x")]));
        course.push_child(v, node("poll", &[("url_name", "poll")]));

        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::EmptyProblem), 1);
        assert_eq!(store.count_code(DiagnosticCode::VideoMissingSource), 1);
        assert_eq!(store.count_code(DiagnosticCode::MissingRequiredAttribute), 2);
        assert_eq!(store.count_code(DiagnosticCode::UnknownTag), 1);
        assert_eq!(store.count_code(DiagnosticCode::InvalidChildType), 0);
    }

    #[test]
    fn test_structural_node_without_url_name() {
        let mut course = good_course();
        let root = course.root_id();
        course.push_child(root, node("chapter", &[("display_name", "W1")]));
        let store = check_all(&course);
        assert_eq!(store.count_code(DiagnosticCode::MissingUrlName), 1);
    }
}
