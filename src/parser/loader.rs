//! Loading an OLX course directory into a [`Course`] and its policy files.
//!
//! Both loaders report problems into the [`ErrorStore`] instead of returning
//! errors. Only a course whose root cannot be read comes back as `None`.

use super::xml::{parse_xml, XmlElement, XmlError};
use crate::models::{
    ContentNode, Course, Diagnostic, DiagnosticCode, GradingPolicy, NodeId, NodeKind, Policy,
    PolicyKey,
};
use crate::validator::ErrorStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub const POLICY_FILE: &str = "policy.json";
pub const GRADING_POLICY_FILE: &str = "grading_policy.json";

/// Failure reading a single file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8: {source}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid XML in {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound(path) => path,
            LoadError::Io { path, .. }
            | LoadError::Encoding { path, .. }
            | LoadError::Xml { path, .. }
            | LoadError::Json { path, .. } => path,
        }
    }

    /// Diagnostic code for this failure; `parse_code` is used for
    /// malformed content
    fn code(&self, parse_code: DiagnosticCode) -> DiagnosticCode {
        match self {
            LoadError::NotFound(_) | LoadError::Io { .. } => DiagnosticCode::FileNotFound,
            LoadError::Encoding { .. } | LoadError::Xml { .. } | LoadError::Json { .. } => parse_code,
        }
    }

    fn into_diagnostic(self, parse_code: DiagnosticCode) -> Diagnostic {
        let code = self.code(parse_code);
        let path = self.path().to_path_buf();
        Diagnostic::new(code, self.to_string()).with_file(path)
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        std::io::ErrorKind::InvalidData => LoadError::Encoding {
            path: path.to_path_buf(),
            source,
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn read_xml(path: &Path) -> Result<XmlElement, LoadError> {
    let content = read_file(path)?;
    parse_xml(&content).map_err(|source| LoadError::Xml {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of the file a pointer tag refers to: `<dir>/<tag>/<url_name>.xml`,
/// with `:` in the url_name standing for a subdirectory separator
pub fn pointer_path(directory: &Path, tag: &str, url_name: &str) -> PathBuf {
    directory
        .join(tag)
        .join(format!("{}.xml", url_name.replace(':', "/")))
}

/// Path of an html component's body: `<dir>/html/<filename>[.html]`
pub fn html_path(directory: &Path, filename: &str) -> PathBuf {
    let file = if filename.ends_with(".html") {
        filename.to_string()
    } else {
        format!("{}.html", filename)
    };
    directory.join("html").join(file)
}

/// Whether a relative path stays inside the directory it is joined to
pub fn stays_inside(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Directory holding policy.json and grading_policy.json
pub fn policy_dir(directory: &Path, course: &Course) -> PathBuf {
    match course.root().url_name.as_deref() {
        Some(url_name) => directory.join("policies").join(url_name),
        None => directory.join("policies"),
    }
}

struct CourseLoader<'s> {
    directory: PathBuf,
    store: &'s mut ErrorStore,
    /// Files currently being expanded, root first
    loading: Vec<PathBuf>,
}

impl<'s> CourseLoader<'s> {
    /// Follow a pointer tag into its own file. Returns the merged element
    /// and its path, or `None` after recording why it could not be followed.
    fn follow(&mut self, pointer: &XmlElement, from: &Path) -> Option<(XmlElement, PathBuf)> {
        let url_name = pointer.attr("url_name")?;
        if !stays_inside(&url_name.replace(':', "/")) {
            self.store.add(
                Diagnostic::new(
                    DiagnosticCode::PathOutsideCourse,
                    format!(
                        "{} url_name '{}' points outside the course directory",
                        pointer.tag, url_name
                    ),
                )
                .with_file(from),
            );
            return None;
        }
        let path = pointer_path(&self.directory, &pointer.tag, url_name);

        if self.loading.contains(&path) {
            self.store.add(
                Diagnostic::new(
                    DiagnosticCode::CircularReference,
                    format!(
                        "{} '{}' points back to {}, which is already being loaded",
                        pointer.tag,
                        url_name,
                        path.display()
                    ),
                )
                .with_file(from),
            );
            return None;
        }

        let mut loaded = match read_xml(&path) {
            Ok(element) => element,
            Err(err) => {
                self.store
                    .add(err.into_diagnostic(DiagnosticCode::XmlParseError));
                return None;
            }
        };

        if loaded.tag != pointer.tag {
            self.store.add(
                Diagnostic::new(
                    DiagnosticCode::UnexpectedRootTag,
                    format!(
                        "expected <{}> as the root of the file, found <{}>",
                        pointer.tag, loaded.tag
                    ),
                )
                .with_file(&path),
            );
            return None;
        }

        for (key, value) in &pointer.attributes {
            loaded.attributes.insert(key.clone(), value.clone());
        }
        tracing::debug!(file = %path.display(), "following pointer");
        self.loading.push(path.clone());
        Some((loaded, path))
    }

    fn make_node(&self, element: &XmlElement, file: &Path) -> ContentNode {
        let mut node = ContentNode::new(&element.tag, element.attributes.clone(), file);
        if node.kind.is_leaf() {
            let mut parts = Vec::new();
            if !element.text.is_empty() {
                parts.push(element.text.clone());
            }
            parts.extend(element.children.iter().map(XmlElement::flatten_text));
            let content = parts.join("\n");
            if !content.trim().is_empty() {
                node.content = Some(content);
            }
        }
        node
    }

    /// Read an html component's external body into its content
    fn load_html_body(&mut self, course: &mut Course, id: NodeId) {
        let Some(filename) = course.node(id).attributes.get("filename").cloned() else {
            return;
        };
        if !stays_inside(&filename) {
            self.store.add(
                Diagnostic::new(
                    DiagnosticCode::PathOutsideCourse,
                    format!("html filename '{}' points outside the course directory", filename),
                )
                .with_node(id),
            );
            return;
        }
        let path = html_path(&self.directory, &filename);
        match read_file(&path) {
            Ok(body) => {
                let node = course.node_mut(id);
                node.content = Some(match node.content.take() {
                    Some(inline) => format!("{}\n{}", inline, body),
                    None => body,
                });
                course.record_file(path);
            }
            Err(err) => {
                let diagnostic = err.into_diagnostic(DiagnosticCode::XmlParseError).with_node(id);
                self.store.add(diagnostic);
            }
        }
    }

    fn add_element(&mut self, course: &mut Course, parent: NodeId, element: XmlElement, from: &Path) {
        let (element, file, followed) = if element.is_pointer() {
            match self.follow(&element, from) {
                Some((loaded, path)) => (loaded, path, true),
                None => (element, from.to_path_buf(), false),
            }
        } else {
            (element, from.to_path_buf(), false)
        };

        let node = self.make_node(&element, &file);
        let kind = node.kind.clone();
        let id = course.push_child(parent, node);

        if kind == NodeKind::Html {
            self.load_html_body(course, id);
        }
        if !kind.is_leaf() {
            for child in element.children {
                self.add_element(course, id, child, &file);
            }
        }

        if followed {
            self.loading.pop();
        }
    }
}

/// Load a course from `directory/file`.
///
/// Returns `None` when the root file is missing or unparseable, its root tag
/// is not `course`, or the root course pointer cannot be followed.
pub fn load_course(directory: &Path, file: &str, store: &mut ErrorStore) -> Option<Course> {
    let root_path = directory.join(file);
    let root = match read_xml(&root_path) {
        Ok(element) => element,
        Err(err) => {
            store.add(err.into_diagnostic(DiagnosticCode::XmlParseError));
            return None;
        }
    };

    if root.tag != "course" {
        store.add(
            Diagnostic::new(
                DiagnosticCode::UnexpectedRootTag,
                format!("expected <course> as the root element, found <{}>", root.tag),
            )
            .with_file(&root_path),
        );
        return None;
    }

    let mut loader = CourseLoader {
        directory: directory.to_path_buf(),
        store,
        loading: vec![root_path.clone()],
    };

    let (root, root_file) = if root.is_pointer() {
        loader.follow(&root, &root_path)?
    } else {
        (root, root_path.clone())
    };

    let node = loader.make_node(&root, &root_file);
    let mut course = Course::new(directory, node);
    course.record_file(&root_path);
    let root_id = course.root_id();
    for child in root.children {
        loader.add_element(&mut course, root_id, child, &root_file);
    }

    tracing::info!(
        nodes = course.len(),
        files = course.files().len(),
        "loaded course"
    );
    Some(course)
}

/// Load policy.json and grading_policy.json for a loaded course.
///
/// Missing or malformed files are reported; the returned policy is then
/// empty (or partial) and the grading policy absent.
pub fn load_policy(
    directory: &Path,
    course: &Course,
    store: &mut ErrorStore,
) -> (Policy, Option<GradingPolicy>) {
    if let Some(url_name) = course.root().url_name.as_deref() {
        if !stays_inside(url_name) {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::PathOutsideCourse,
                    format!("course url_name '{}' points outside the policies directory", url_name),
                )
                .with_node(course.root_id()),
            );
            return (Policy::new(), None);
        }
    }
    let dir = policy_dir(directory, course);
    let policy = load_policy_file(&dir.join(POLICY_FILE), store);
    let grading = load_grading_policy_file(&dir.join(GRADING_POLICY_FILE), store);
    tracing::debug!(
        entries = policy.len(),
        grading = grading.is_some(),
        "loaded policy"
    );
    (policy, grading)
}

fn load_policy_file(path: &Path, store: &mut ErrorStore) -> Policy {
    let mut policy = Policy::new();

    let value = match read_json(path) {
        Ok(value) => value,
        Err(LoadError::NotFound(_)) => {
            store.add(
                Diagnostic::new(DiagnosticCode::PolicyNotFound, "no policy file for this course")
                    .with_file(path),
            );
            return policy;
        }
        Err(err) => {
            store.add(err.into_diagnostic(DiagnosticCode::PolicyParseError));
            return policy;
        }
    };

    let Value::Object(entries) = value else {
        store.add(
            Diagnostic::new(
                DiagnosticCode::PolicyParseError,
                "policy file must contain a JSON object",
            )
            .with_file(path),
        );
        return policy;
    };

    for (raw_key, raw_value) in entries {
        let Some(key) = PolicyKey::parse(&raw_key) else {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::InvalidPolicyEntry,
                    format!("policy key '{}' is not of the form category/url_name", raw_key),
                )
                .with_file(path),
            );
            continue;
        };
        let Value::Object(attributes) = raw_value else {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::InvalidPolicyEntry,
                    format!("policy entry '{}' must be a JSON object", raw_key),
                )
                .with_file(path),
            );
            continue;
        };
        let attributes: BTreeMap<String, Value> = attributes.into_iter().collect();
        policy.insert(key, attributes);
    }

    policy
}

fn load_grading_policy_file(path: &Path, store: &mut ErrorStore) -> Option<GradingPolicy> {
    let content = match read_file(path) {
        Ok(content) => content,
        Err(LoadError::NotFound(_)) => {
            store.add(
                Diagnostic::new(
                    DiagnosticCode::GradingPolicyNotFound,
                    "no grading policy file for this course",
                )
                .with_file(path),
            );
            return None;
        }
        Err(err) => {
            store.add(err.into_diagnostic(DiagnosticCode::GradingPolicyParseError));
            return None;
        }
    };

    match serde_json::from_str::<GradingPolicy>(&content) {
        Ok(grading) => Some(grading),
        Err(source) => {
            let err = LoadError::Json {
                path: path.to_path_buf(),
                source,
            };
            store.add(err.into_diagnostic(DiagnosticCode::GradingPolicyParseError));
            None
        }
    }
}
