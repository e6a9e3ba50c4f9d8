//! Narrative XHTML checks.
//!
//! A `Narrative.div` value is stored as the exact text of one `<div>` element
//! in the XHTML namespace. Both wire formats carry it verbatim, so the text
//! has to stand on its own as an XML document: nothing before or after the
//! element, and the namespace declared on the element itself.

use crate::error::ModelError;

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Checks that `text` is exactly one well-formed XHTML `<div>` element.
pub fn check_div(text: &str) -> Result<(), ModelError> {
    let invalid = |reason: String| ModelError::InvalidXhtml { reason };

    let document = roxmltree::Document::parse(text).map_err(|e| invalid(e.to_string()))?;
    let root = document.root_element();
    let tag = root.tag_name();
    if tag.name() != "div" || tag.namespace() != Some(XHTML_NAMESPACE) {
        return Err(invalid(format!(
            "expected a div in {}, found {}",
            XHTML_NAMESPACE,
            match tag.namespace() {
                Some(ns) => format!("{{{}}}{}", ns, tag.name()),
                None => tag.name().to_string(),
            }
        )));
    }
    if root.range() != (0..text.len()) {
        return Err(invalid("content outside the div element".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_namespaced_div() {
        assert!(check_div(r#"<div xmlns="http://www.w3.org/1999/xhtml">hi</div>"#).is_ok());
        assert!(
            check_div(r#"<x:div xmlns:x="http://www.w3.org/1999/xhtml"><x:p>a</x:p></x:div>"#)
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_other_content() {
        for text in [
            "hello",
            "<div>no namespace</div>",
            r#"<p xmlns="http://www.w3.org/1999/xhtml">not a div</p>"#,
            r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>unclosed</div>"#,
            r#" <div xmlns="http://www.w3.org/1999/xhtml">padded</div>"#,
            r#"<!-- note --><div xmlns="http://www.w3.org/1999/xhtml">x</div>"#,
            r#"<?xml version="1.0"?><div xmlns="http://www.w3.org/1999/xhtml">x</div>"#,
        ] {
            assert!(
                matches!(check_div(text), Err(ModelError::InvalidXhtml { .. })),
                "accepted {text:?}"
            );
        }
    }
}
