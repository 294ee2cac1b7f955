//! Extended-tier validators. These touch the file system and run last.

use super::registry::Validator;
use super::store::ErrorStore;
use crate::models::{Course, Diagnostic, DiagnosticCode};
use crate::pipeline::UrlNameIndex;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Directories scanned for content files
pub const CONTENT_DIRS: [&str; 8] = [
    "course",
    "chapter",
    "sequential",
    "vertical",
    "html",
    "problem",
    "video",
    "discussion",
];

fn static_link_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // Only course-relative links: the path must start an attribute value,
    // a quoted string, a CSS url( ) or a line, never the middle of a URL
    RE.get_or_init(|| Regex::new(r#"(?m)(?:^|["'\s(=])/static/([^\s"'<>()?#]+)"#).ok())
        .as_ref()
}

/// Percent-decode a link path; malformed escapes are checked verbatim
fn decode_link(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Every `/static/...` reference must exist under `<course>/static/`
pub struct StaticLinks;

impl Validator for StaticLinks {
    fn name(&self) -> &'static str {
        "static-links"
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, _url_names: &UrlNameIndex) {
        let Some(re) = static_link_regex() else {
            return;
        };
        let static_dir = course.directory().join("static");

        for node in course.traverse() {
            let Some(content) = &node.content else {
                continue;
            };
            let links: BTreeSet<String> = re
                .captures_iter(content)
                .filter_map(|c| c.get(1).map(|m| decode_link(m.as_str())))
                .collect();
            for link in links {
                if !static_dir.join(&link).is_file() {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::MissingStaticFile,
                            format!("{} links to missing file /static/{}", node.label(), link),
                        )
                        .with_node(node.id),
                    );
                }
            }
        }
    }
}

/// Content files on disk that the course never loaded
pub struct UnreferencedFiles;

impl Validator for UnreferencedFiles {
    fn name(&self) -> &'static str {
        "unreferenced-files"
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, _url_names: &UrlNameIndex) {
        let loaded = course.files();
        for dir in CONTENT_DIRS {
            let root = course.directory().join(dir);
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                let is_content = path
                    .extension()
                    .is_some_and(|ext| ext == "xml" || ext == "html");
                if is_content && !loaded.contains(path) {
                    store.add(
                        Diagnostic::new(
                            DiagnosticCode::UnreferencedFile,
                            "file is not referenced by the course",
                        )
                        .with_file(path),
                    );
                }
            }
        }
    }
}
