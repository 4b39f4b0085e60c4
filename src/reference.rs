//! Reference locator
//!
//! Normalizes raw location references into canonical URI form and classifies
//! them as absolute or relative. Normalization collapses `.` and `..`
//! segments where the path allows it; leading `..` runs of a relative
//! reference are preserved for the tree resolver to consume.

use url::Url;

use crate::error::{ModelerError, Result};

/// Normalize a raw location reference.
///
/// Absolute references are parsed and re-serialized by the URL parser (which
/// removes dot segments); relative references get their dot segments
/// collapsed directly. Empty or unparseable input is a
/// [`ModelerError::MalformedReference`].
pub fn normalize(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(malformed(raw, "empty reference"));
    }
    match Url::parse(raw) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(collapse_dot_segments(raw)),
        Err(e) => Err(malformed(raw, &e.to_string())),
    }
}

/// Whether a reference has no scheme component
pub fn is_relative(raw: &str) -> Result<bool> {
    if raw.trim().is_empty() {
        return Err(malformed(raw, "empty reference"));
    }
    match Url::parse(raw) {
        Ok(_) => Ok(false),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(true),
        Err(e) => Err(malformed(raw, &e.to_string())),
    }
}

fn malformed(reference: &str, reason: &str) -> ModelerError {
    ModelerError::MalformedReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

fn collapse_dot_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_segments_are_stripped() {
        assert_eq!(normalize("./encoding/soap_encoding.xsd").unwrap(), "encoding/soap_encoding.xsd");
        assert_eq!(normalize("a/./b.xsd").unwrap(), "a/b.xsd");
    }

    #[test]
    fn test_leading_parent_segments_are_preserved() {
        assert_eq!(normalize("../data/types/BookDatatypes.xsd").unwrap(), "../data/types/BookDatatypes.xsd");
        assert_eq!(normalize("../../Shared.xsd").unwrap(), "../../Shared.xsd");
    }

    #[test]
    fn test_interior_parent_segments_collapse() {
        assert_eq!(normalize("a/b/../c.xsd").unwrap(), "a/c.xsd");
        assert_eq!(normalize("a/../../b.xsd").unwrap(), "../b.xsd");
    }

    #[test]
    fn test_absolute_references_pass_through() {
        assert_eq!(
            normalize("http://example.org/schemas/Books.xsd").unwrap(),
            "http://example.org/schemas/Books.xsd"
        );
        assert_eq!(
            normalize("http://example.org/a/../b.xsd").unwrap(),
            "http://example.org/b.xsd"
        );
    }

    #[test]
    fn test_empty_reference_is_malformed() {
        assert!(matches!(normalize(""), Err(ModelerError::MalformedReference { .. })));
        assert!(matches!(normalize("   "), Err(ModelerError::MalformedReference { .. })));
        assert!(matches!(is_relative(""), Err(ModelerError::MalformedReference { .. })));
    }

    #[test]
    fn test_unparseable_reference_is_malformed() {
        assert!(matches!(normalize("http://"), Err(ModelerError::MalformedReference { .. })));
    }

    #[test]
    fn test_classification() {
        assert!(is_relative("data/types/Foo.xsd").unwrap());
        assert!(is_relative("../Shared.xsd").unwrap());
        assert!(!is_relative("http://example.org/Foo.xsd").unwrap());
        assert!(!is_relative("file:///schemas/Foo.xsd").unwrap());
    }
}
