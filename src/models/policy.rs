use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// `(category, url_name)` key of a policy entry, written `category/url_name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyKey {
    pub category: String,
    pub url_name: String,
}

impl PolicyKey {
    pub fn new(category: impl Into<String>, url_name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            url_name: url_name.into(),
        }
    }

    /// Parse `category/url_name`; both halves must be non-empty
    pub fn parse(key: &str) -> Option<Self> {
        let (category, url_name) = key.split_once('/')?;
        if category.is_empty() || url_name.is_empty() {
            return None;
        }
        Some(Self::new(category, url_name))
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.url_name)
    }
}

/// Attribute data supplied out-of-band in policy.json
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    entries: BTreeMap<PolicyKey, BTreeMap<String, Value>>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PolicyKey, attributes: BTreeMap<String, Value>) {
        self.entries.insert(key, attributes);
    }

    pub fn get(&self, key: &PolicyKey) -> Option<&BTreeMap<String, Value>> {
        self.entries.get(key)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&PolicyKey, &BTreeMap<String, Value>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One entry of the `GRADER` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grader {
    #[serde(rename = "type")]
    pub assignment_type: String,
    #[serde(default)]
    pub min_count: u32,
    #[serde(default)]
    pub drop_count: u32,
    #[serde(default)]
    pub short_label: Option<String>,
    pub weight: f64,
}

/// Contents of grading_policy.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingPolicy {
    #[serde(rename = "GRADER", default)]
    pub graders: Vec<Grader>,
    #[serde(rename = "GRADE_CUTOFFS", default)]
    pub cutoffs: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_key() {
        assert_eq!(
            PolicyKey::parse("chapter/week1"),
            Some(PolicyKey::new("chapter", "week1"))
        );
        assert_eq!(
            PolicyKey::parse("course/2014/extra"),
            Some(PolicyKey::new("course", "2014/extra"))
        );
        assert_eq!(PolicyKey::parse("chapter"), None);
        assert_eq!(PolicyKey::parse("/week1"), None);
        assert_eq!(PolicyKey::parse("chapter/"), None);
    }

    #[test]
    fn test_grading_policy_deserializes() {
        let json = r#"{
            "GRADER": [
                {"type": "Homework", "min_count": 12, "drop_count": 2, "short_label": "HW", "weight": 0.4},
                {"type": "Final Exam", "weight": 0.6}
            ],
            "GRADE_CUTOFFS": {"Pass": 0.5}
        }"#;
        let policy: GradingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.graders.len(), 2);
        assert_eq!(policy.graders[0].assignment_type, "Homework");
        assert_eq!(policy.graders[1].min_count, 0);
        assert_eq!(policy.cutoffs.get("Pass"), Some(&0.5));
    }
}
