use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// A parsed XML element with its attributes, text, and child elements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlElement>,
    /// Direct text content, whitespace-trimmed and concatenated
    pub text: String,
}

/// Failure to turn a file into an element tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum XmlError {
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element")]
    MultipleRoots,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Pointer tags carry only a url_name (plus org/course on `course`)
    /// and have no children of their own.
    pub fn is_pointer(&self) -> bool {
        if !self.children.is_empty() || !self.attributes.contains_key("url_name") {
            return false;
        }
        self.attributes.keys().all(|key| match key.as_str() {
            "url_name" => true,
            "org" | "course" => self.tag == "course",
            _ => false,
        })
    }

    /// All text and attribute values in this subtree, one per line
    pub fn flatten_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join("\n")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        parts.extend(self.attributes.values().map(String::as_str));
        if !self.text.is_empty() {
            parts.push(&self.text);
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }
}

/// Parse a document into its root element
///
/// # Example
/// ```
/// use olxcheck::parser::parse_xml;
///
/// let root = parse_xml(r#"<chapter url_name="week1"><sequential url_name="s1"/></chapter>"#).unwrap();
/// assert_eq!(root.tag, "chapter");
/// assert_eq!(root.attr("url_name"), Some("week1"));
/// assert_eq!(root.children.len(), 1);
/// ```
pub fn parse_xml(content: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let element = element_from(&start).map_err(|message| XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message,
                })?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from(&start).map_err(|message| XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message,
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| XmlError::Syntax {
                        position: reader.buffer_position() as u64,
                        message: e.to_string(),
                    })?;
                    push_text(&mut current.text, &text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    push_text(&mut current.text, &String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.tag));
    }
    root.ok_or(XmlError::NoRoot)
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.insert(key, value.into_owned());
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(buffer: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let content = r#"<?xml version="1.0"?>
<course display_name="Demo">
  <!-- comment -->
  <chapter url_name="week1" display_name="Week 1">
    <sequential url_name="s1"/>
  </chapter>
  <chapter url_name="week2"/>
</course>"#;

        let root = parse_xml(content).unwrap();
        assert_eq!(root.tag, "course");
        assert_eq!(root.attr("display_name"), Some("Demo"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].tag, "sequential");
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let root = parse_xml(r#"<html display_name="Q &amp; A"/>"#).unwrap();
        assert_eq!(root.attr("display_name"), Some("Q & A"));
    }

    #[test]
    fn test_text_and_cdata() {
        let root = parse_xml("<problem>Pick one <![CDATA[<b>raw</b>]]></problem>").unwrap();
        assert_eq!(root.text, "Pick one <b>raw</b>");
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        let err = parse_xml("<chapter><sequential></chapter>").unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }));
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse_xml("<chapter><sequential/>").unwrap_err();
        assert!(matches!(err, XmlError::Unclosed(_) | XmlError::Syntax { .. }));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_xml("   ").unwrap_err(), XmlError::NoRoot);
    }

    #[test]
    fn test_multiple_roots() {
        assert_eq!(
            parse_xml("<a/><b/>").unwrap_err(),
            XmlError::MultipleRoots
        );
    }

    #[test]
    fn test_pointer_detection() {
        let pointer = parse_xml(r#"<chapter url_name="week1"/>"#).unwrap();
        assert!(pointer.is_pointer());

        let inline = parse_xml(r#"<chapter url_name="week1" display_name="W"/>"#).unwrap();
        assert!(!inline.is_pointer());

        let course = parse_xml(r#"<course url_name="2014" org="edX" course="101"/>"#).unwrap();
        assert!(course.is_pointer());

        let anonymous = parse_xml("<chapter/>").unwrap();
        assert!(!anonymous.is_pointer());
    }

    #[test]
    fn test_flatten_text() {
        let root = parse_xml(
            r#"<video><source src="/static/clip.mp4"/><track src="/static/subs.srt"/></video>"#,
        )
        .unwrap();
        let text = root.flatten_text();
        assert!(text.contains("/static/clip.mp4"));
        assert!(text.contains("/static/subs.srt"));
    }
}
