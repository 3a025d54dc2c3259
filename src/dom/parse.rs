//! HTML input: convert a `tl` parse tree into the document arena.
//!
//! Pages without an `<html>` element (fragments, templates) get one
//! synthesized around their top-level nodes, so every document has a root
//! element to carry capability markers.

use super::{Document, DomError, Element, NodeData, NodeId};
use crate::utils::html::unescape;

/// Parse a full page or fragment.
pub fn parse_document(html: &str) -> Result<Document, DomError> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| DomError::Parse(format!("{e:?}")))?;
    let parser = dom.parser();

    let mut doc = Document::empty();
    doc.set_doctype(dom.version().is_some());
    let root = doc.root();

    for handle in dom.children() {
        let Some(node) = handle.get(parser) else {
            continue;
        };

        // Adopt an existing <html> element as the root instead of nesting it
        if let tl::Node::Tag(tag) = node
            && tag.name().as_utf8_str().eq_ignore_ascii_case("html")
        {
            copy_attributes(tag, doc.root_element_mut());
            for child in tag.children().top().iter() {
                convert(&mut doc, *child, parser, root);
            }
            continue;
        }

        convert(&mut doc, *handle, parser, root);
    }

    Ok(doc)
}

/// Convert one `tl` node (recursively) and append it under `parent`.
fn convert(
    doc: &mut Document,
    handle: tl::NodeHandle,
    parser: &tl::Parser,
    parent: NodeId,
) {
    let Some(node) = handle.get(parser) else {
        return;
    };

    match node {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            let mut element = Element::new(&name);
            copy_attributes(tag, &mut element);

            let id = doc.create_element(element);
            doc.append_child(parent, id);

            for child in tag.children().top().iter() {
                convert(doc, *child, parser, id);
            }
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            // Whitespace between top-level tags carries no content
            if text.trim().is_empty() && parent == doc.root() {
                return;
            }
            // Kept verbatim: already escaped in regular content, raw in script/style
            let id = doc.push_node(NodeData::Text(text.into_owned()));
            doc.append_child(parent, id);
        }
        tl::Node::Comment(bytes) => {
            let text = bytes.as_utf8_str();
            let body = text
                .strip_prefix("<!--")
                .and_then(|t| t.strip_suffix("-->"))
                .unwrap_or(&*text)
                .to_string();
            let id = doc.push_node(NodeData::Comment(body));
            doc.append_child(parent, id);
        }
    }
}

/// Copy attributes, decoding entities in values.
///
/// `tl` keeps `id` and `class` in dedicated slots; they are merged back in
/// when the generic iterator does not yield them.
fn copy_attributes(tag: &tl::HTMLTag, element: &mut Element) {
    let attrs = tag.attributes();
    for (key, value) in attrs.iter() {
        let key: &str = key.as_ref();
        match value {
            Some(value) => element.set_attr(key, unescape(&value).into_owned()),
            None => element.set_flag(key),
        }
    }

    if !element.has_attr("id")
        && let Some(id) = attrs.id()
    {
        element.set_attr("id", unescape(&id.as_utf8_str()).into_owned());
    }
    if !element.has_attr("class")
        && let Some(class) = attrs.class()
    {
        element.set_attr("class", unescape(&class.as_utf8_str()).into_owned());
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{Document, Selector};

    #[test]
    fn test_parse_full_page() {
        let html = r#"<!DOCTYPE html>
<html lang="es">
<head><title>Colchones</title></head>
<body>
  <img class="lazy" data-lazy="/media/a.jpg" alt="A">
  <picture><source data-lazy="/media/a.webp" type="image/webp"></picture>
</body>
</html>"#;
        let doc = Document::parse(html).unwrap();
        let root = doc.element(doc.root()).unwrap();
        assert_eq!(root.attr("lang"), Some("es"));
        assert!(doc.head().is_some());

        let sel = Selector::parse("img[data-lazy], source[data-lazy]").unwrap();
        let found = doc.select_all(&sel);
        assert_eq!(found.len(), 2);
        let img = doc.element(found[0]).unwrap();
        assert_eq!(img.attr("data-lazy"), Some("/media/a.jpg"));
        assert!(img.has_class("lazy"));
    }

    #[test]
    fn test_parse_fragment_gets_root() {
        let doc = Document::parse(r#"<div id="x"><span>hi</span></div>"#).unwrap();
        assert_eq!(doc.element(doc.root()).unwrap().tag(), "html");
        let div = doc.get_element_by_id("x").unwrap();
        assert_eq!(doc.parent(div), Some(doc.root()));
        assert_eq!(doc.text_content(div), "hi");
    }

    #[test]
    fn test_parse_decodes_attribute_entities() {
        let doc = Document::parse(r#"<img id="i" data-lazy="/a.jpg?w=1&amp;h=2">"#).unwrap();
        let img = doc.get_element_by_id("i").unwrap();
        assert_eq!(doc.element(img).unwrap().attr("data-lazy"), Some("/a.jpg?w=1&h=2"));
    }

    #[test]
    fn test_parse_keeps_script_raw() {
        let doc = Document::parse("<script>if (a && b) { go(); }</script>").unwrap();
        let script = doc.first_by_tag("script").unwrap();
        assert_eq!(doc.text_content(script), "if (a && b) { go(); }");
    }
}
