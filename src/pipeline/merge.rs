use super::index::UrlNameIndex;
use crate::models::{Course, Diagnostic, DiagnosticCode, Policy};
use crate::validator::ErrorStore;

/// Write policy attributes into matching nodes' resolved attributes.
///
/// Inline attributes win: a policy key the document already sets is left
/// alone and reported as `PolicyConflict`. Entries whose target is absent
/// are reported and skipped; the remaining entries are still merged.
pub fn merge_policy(
    course: &mut Course,
    policy: &Policy,
    url_names: &UrlNameIndex,
    store: &mut ErrorStore,
) {
    let mut merged = 0usize;

    for (key, attributes) in policy.iter() {
        let targets: Vec<_> = url_names
            .get(&key.url_name)
            .iter()
            .copied()
            .filter(|id| course.node(*id).tag() == key.category)
            .collect();

        if targets.is_empty() {
            let message = if url_names.contains(&key.url_name) {
                format!(
                    "Policy entry '{}' names url_name '{}', but no {} has it",
                    key, key.url_name, key.category
                )
            } else {
                format!("Policy entry '{}' does not match any object in the course", key)
            };
            store.add(Diagnostic::new(DiagnosticCode::PolicyTargetMissing, message));
            continue;
        }

        for id in targets {
            let node = course.node_mut(id);
            for (attr, value) in attributes {
                if node.attributes.contains_key(attr) {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::PolicyConflict,
                            format!(
                                "Policy value for '{}' on {} is shadowed by the inline attribute",
                                attr,
                                node.label()
                            ),
                        )
                        .with_node(id),
                    );
                    continue;
                }
                node.resolved.insert(attr.clone(), value.clone());
            }
            merged += 1;
        }
    }

    tracing::debug!(entries = policy.len(), merged, "merged policy");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentNode, PolicyKey};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn node(tag: &str, pairs: &[(&str, &str)]) -> ContentNode {
        let attrs = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ContentNode::new(tag, attrs, "course.xml")
    }

    fn entry(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn course_with(child: ContentNode) -> Course {
        let mut course = Course::new("/c", node("course", &[("url_name", "root")]));
        let root = course.root_id();
        course.push_child(root, child);
        course
    }

    #[test]
    fn test_policy_fills_missing_attribute() {
        let mut course = course_with(node("meta", &[("url_name", "X")]));
        let mut policy = Policy::new();
        policy.insert(PolicyKey::new("meta", "X"), entry(&[("key", json!("v"))]));
        let index = UrlNameIndex::build(&course);
        let mut store = ErrorStore::default();

        merge_policy(&mut course, &policy, &index, &mut store);

        let id = index.get("X")[0];
        assert_eq!(course.node(id).resolved.get("key"), Some(&json!("v")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_inline_attribute_wins() {
        let mut course = course_with(node("meta", &[("url_name", "X"), ("key", "w")]));
        let mut policy = Policy::new();
        policy.insert(PolicyKey::new("meta", "X"), entry(&[("key", json!("v"))]));
        let index = UrlNameIndex::build(&course);
        let mut store = ErrorStore::default();

        merge_policy(&mut course, &policy, &index, &mut store);

        let id = index.get("X")[0];
        assert_eq!(course.node(id).resolved.get("key"), Some(&json!("w")));
        assert_eq!(store.count_code(DiagnosticCode::PolicyConflict), 1);
    }

    #[test]
    fn test_missing_target_does_not_stop_merge() {
        let mut course = course_with(node("chapter", &[("url_name", "week1")]));
        let mut policy = Policy::new();
        policy.insert(PolicyKey::new("chapter", "absent"), entry(&[("a", json!(1))]));
        policy.insert(PolicyKey::new("sequential", "week1"), entry(&[("b", json!(2))]));
        policy.insert(
            PolicyKey::new("chapter", "week1"),
            entry(&[("display_name", json!("Week 1"))]),
        );
        let index = UrlNameIndex::build(&course);
        let mut store = ErrorStore::default();

        merge_policy(&mut course, &policy, &index, &mut store);

        assert_eq!(store.count_code(DiagnosticCode::PolicyTargetMissing), 2);
        let id = index.get("week1")[0];
        assert_eq!(course.node(id).attr("display_name").as_deref(), Some("Week 1"));
        assert!(!course.node(id).resolved.contains_key("b"));
    }
}
