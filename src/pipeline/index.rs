use super::walker::traverse;
use crate::models::{Course, NodeId};
use std::collections::BTreeMap;

/// url_name → nodes declaring it, in document order.
///
/// A list longer than one is a collision; the index keeps every entry and
/// leaves reporting to the `duplicate-url-names` validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlNameIndex {
    entries: BTreeMap<String, Vec<NodeId>>,
}

impl UrlNameIndex {
    pub fn build(course: &Course) -> Self {
        let mut entries: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for node in traverse(course) {
            if let Some(name) = node.url_name.as_deref().filter(|n| !n.is_empty()) {
                entries.entry(name.to_string()).or_default().push(node.id);
            }
        }
        tracing::debug!(url_names = entries.len(), "built url_name index");
        Self { entries }
    }

    pub fn get(&self, url_name: &str) -> &[NodeId] {
        self.entries.get(url_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, url_name: &str) -> bool {
        self.entries.contains_key(url_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.entries
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Entries declared by more than one node
    pub fn collisions(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.iter().filter(|(_, ids)| ids.len() > 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the url_name index for a course
pub fn find_url_names(course: &Course) -> UrlNameIndex {
    UrlNameIndex::build(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentNode;

    fn node(tag: &str, url_name: Option<&str>) -> ContentNode {
        let mut attrs = std::collections::BTreeMap::new();
        if let Some(name) = url_name {
            attrs.insert("url_name".to_string(), name.to_string());
        }
        ContentNode::new(tag, attrs, "course.xml")
    }

    #[test]
    fn test_collision_keeps_both_nodes() {
        let mut course = Course::new("/c", node("course", Some("root")));
        let root = course.root_id();
        let a = course.push_child(root, node("chapter", Some("X")));
        let b = course.push_child(root, node("chapter", Some("X")));

        let index = UrlNameIndex::build(&course);
        assert_eq!(index.get("X"), &[a, b]);
        assert_eq!(index.collisions().count(), 1);
    }

    #[test]
    fn test_anonymous_and_empty_names_are_skipped() {
        let mut course = Course::new("/c", node("course", None));
        let root = course.root_id();
        course.push_child(root, node("chapter", Some("")));
        course.push_child(root, node("chapter", None));

        let index = find_url_names(&course);
        assert!(index.is_empty());
        assert!(index.get("anything").is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut course = Course::new("/c", node("course", Some("root")));
        let root = course.root_id();
        let ch = course.push_child(root, node("chapter", Some("b")));
        course.push_child(ch, node("sequential", Some("a")));

        assert_eq!(UrlNameIndex::build(&course), UrlNameIndex::build(&course));
        let names: Vec<_> = UrlNameIndex::build(&course).iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["a", "b", "root"]);
    }
}
