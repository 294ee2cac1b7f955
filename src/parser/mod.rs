pub mod loader;
pub mod xml;

pub use loader::{load_course, load_policy, LoadError};
pub use xml::{parse_xml, XmlElement, XmlError};
