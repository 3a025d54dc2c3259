//! HTML output.

use std::fmt::Write;

use super::{Document, Element, NodeData, NodeId};
use crate::utils::html::{escape_attr, is_void_element};

/// Serialize the whole document, root element included.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    if doc.has_doctype() {
        out.push_str("<!DOCTYPE html>\n");
    }
    write_node(doc, doc.root(), &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        Some(NodeData::Element(el)) => {
            write_open_tag(el, out);
            if is_void_element(el.tag()) {
                return;
            }
            for &child in doc.children(id) {
                write_node(doc, child, out);
            }
            let _ = write!(out, "</{}>", el.tag());
        }
        Some(NodeData::Text(text)) => out.push_str(text),
        Some(NodeData::Comment(text)) => {
            let _ = write!(out, "<!--{text}-->");
        }
        None => {}
    }
}

fn write_open_tag(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(el.tag());
    for (name, value) in el.attrs() {
        match value {
            Some(value) => {
                let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
            }
            None => {
                let _ = write!(out, " {name}");
            }
        }
    }
    out.push('>');
}

#[cfg(test)]
mod tests {
    use crate::dom::{Document, Element};

    #[test]
    fn test_serialize_new_document() {
        let doc = Document::new();
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html>\n<html><head></head><body></body></html>"
        );
    }

    #[test]
    fn test_serialize_void_and_flags() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let mut input = Element::new("input").with_attr("type", "file");
        input.set_flag("multiple");
        let input = doc.create_element(input);
        doc.append_child(body, input);

        let html = doc.to_html();
        assert!(html.contains(r#"<body><input type="file" multiple></body>"#));
    }

    #[test]
    fn test_serialize_escapes_attribute_values() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let img = doc.create_element(Element::new("img").with_attr("src", "/a.jpg?w=1&h=2"));
        doc.append_child(body, img);
        let mut el = Element::new("img").with_attr("alt", "24\" pillow");
        el.set_attr("src", "/b.jpg");
        let pillow = doc.create_element(el);
        doc.append_child(body, pillow);

        let html = doc.to_html();
        assert!(html.contains(r#"<img src="/a.jpg?w=1&h=2">"#));
        assert!(html.contains(r#"<img alt="24&quot; pillow" src="/b.jpg">"#));
    }

    #[test]
    fn test_parse_serialize_preserves_structure() {
        let html = r#"<div class="product-card" data-product-id="7"><p>Colch&oacute;n <b>Premium</b></p><!-- promo --></div>"#;
        let doc = Document::parse(html).unwrap();
        let out = doc.to_html();
        assert!(out.starts_with("<html>"));
        assert!(out.contains(r#"class="product-card""#));
        assert!(out.contains(r#"data-product-id="7""#));
        assert!(out.contains("<p>Colch&oacute;n <b>Premium</b></p>"));
        assert!(out.contains("<!-- promo -->"));
    }
}
