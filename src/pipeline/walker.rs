use crate::models::{ContentNode, Course, NodeId};

/// Pre-order traversal over a course: node first, then its children in
/// document order. Each call to [`traverse`] starts again from the root.
pub struct Traverse<'a> {
    course: &'a Course,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a ContentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.course.node(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

pub fn traverse(course: &Course) -> Traverse<'_> {
    Traverse {
        course,
        stack: vec![course.root_id()],
    }
}

impl Course {
    pub fn traverse(&self) -> Traverse<'_> {
        traverse(self)
    }

    /// Node ids in traversal order, for passes that mutate as they go
    pub fn node_ids(&self) -> Vec<NodeId> {
        traverse(self).map(|n| n.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn node(tag: &str, url_name: &str) -> ContentNode {
        let mut attrs = BTreeMap::new();
        attrs.insert("url_name".to_string(), url_name.to_string());
        ContentNode::new(tag, attrs, "course.xml")
    }

    fn sample() -> Course {
        let mut course = Course::new("/c", node("course", "root"));
        let root = course.root_id();
        let ch1 = course.push_child(root, node("chapter", "ch1"));
        let ch2 = course.push_child(root, node("chapter", "ch2"));
        let s1 = course.push_child(ch1, node("sequential", "s1"));
        course.push_child(s1, node("vertical", "v1"));
        course.push_child(ch1, node("sequential", "s2"));
        course.push_child(ch2, node("sequential", "s3"));
        course
    }

    fn names(course: &Course) -> Vec<String> {
        traverse(course)
            .map(|n| n.url_name.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_pre_order() {
        let course = sample();
        assert_eq!(
            names(&course),
            vec!["root", "ch1", "s1", "v1", "s2", "ch2", "s3"]
        );
    }

    #[test]
    fn test_restartable_after_mutation() {
        let mut course = sample();
        let first = names(&course);

        let ids = course.node_ids();
        course
            .node_mut(ids[2])
            .resolved
            .insert("display_name".into(), "Seq".into());

        assert_eq!(names(&course), first);
        assert_eq!(course.traverse().count(), course.len());
    }

    #[test]
    fn test_single_node() {
        let course = Course::new("/c", node("course", "only"));
        assert_eq!(names(&course), vec!["only"]);
    }
}
