//! Compound selector matching.
//!
//! Supports the subset the storefront scripts use: comma-separated lists of
//! compound selectors built from a tag name, `#id`, `.class` and attribute
//! tests (`[a]`, `[a=v]`, `[a*=v]`, `[a^=v]`, `[a$=v]`, `[a~=v]`).
//! Combinators (descendant, child, sibling) are not supported; scope a
//! search with [`Document::select_within`](super::Document::select_within)
//! instead.

use std::fmt;
use std::str::FromStr;

use super::{DomError, Element};

/// A parsed selector list (`a, b, c`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
    Word(String),
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let alternatives = source
            .split(',')
            .map(|part| parse_compound(part.trim(), source))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Whether the element matches any alternative.
    pub fn matches(&self, element: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag
            && !el.is(tag)
        {
            return false;
        }
        self.ids.iter().all(|id| el.attr("id") == Some(id.as_str()))
            && self.classes.iter().all(|c| el.has_class(c))
            && self.attrs.iter().all(|test| test.matches(el))
    }
}

impl AttrTest {
    fn matches(&self, el: &Element) -> bool {
        let Some(value) = el.attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
            AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
            AttrOp::Word(v) => value.split_ascii_whitespace().any(|w| w == v),
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn invalid(selector: &str, reason: impl Into<String>) -> DomError {
    DomError::Selector {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(part: &str, full: &str) -> Result<Compound, DomError> {
    if part.is_empty() {
        return Err(invalid(full, "empty selector"));
    }
    if part.contains(char::is_whitespace) && !part.contains('[') {
        return Err(invalid(full, "combinators are not supported"));
    }

    let mut compound = Compound::default();
    let mut rest = part;

    // Leading tag name or universal selector
    let tag_len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    if tag_len > 0 {
        compound.tag = Some(rest[..tag_len].to_ascii_lowercase());
        rest = &rest[tag_len..];
    } else if let Some(after) = rest.strip_prefix('*') {
        rest = after;
    }

    while let Some(c) = rest.chars().next() {
        match c {
            '#' | '.' => {
                let body = &rest[1..];
                let len = body.find(|c: char| !is_ident_char(c)).unwrap_or(body.len());
                if len == 0 {
                    return Err(invalid(full, format!("expected name after `{c}`")));
                }
                let name = body[..len].to_string();
                if c == '#' {
                    compound.ids.push(name);
                } else {
                    compound.classes.push(name);
                }
                rest = &body[len..];
            }
            '[' => {
                let end = rest
                    .find(']')
                    .ok_or_else(|| invalid(full, "unterminated attribute selector"))?;
                compound.attrs.push(parse_attr_test(&rest[1..end], full)?);
                rest = &rest[end + 1..];
            }
            other => return Err(invalid(full, format!("unexpected character `{other}`"))),
        }
    }

    Ok(compound)
}

fn parse_attr_test(body: &str, full: &str) -> Result<AttrTest, DomError> {
    let body = body.trim();
    let Some(eq) = body.find('=') else {
        if body.is_empty() || !body.chars().all(is_ident_char) {
            return Err(invalid(full, "invalid attribute name"));
        }
        return Ok(AttrTest {
            name: body.to_ascii_lowercase(),
            op: AttrOp::Exists,
        });
    };

    let (lhs, value) = (&body[..eq], unquote(body[eq + 1..].trim()));
    let (name, op) = match lhs.chars().last() {
        Some('*') => (&lhs[..lhs.len() - 1], AttrOp::Contains(value)),
        Some('^') => (&lhs[..lhs.len() - 1], AttrOp::Prefix(value)),
        Some('$') => (&lhs[..lhs.len() - 1], AttrOp::Suffix(value)),
        Some('~') => (&lhs[..lhs.len() - 1], AttrOp::Word(value)),
        _ => (lhs, AttrOp::Equals(value)),
    };

    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(invalid(full, "invalid attribute name"));
    }

    Ok(AttrTest {
        name: name.to_ascii_lowercase(),
        op,
    })
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(attrs: &[(&str, &str)]) -> Element {
        attrs
            .iter()
            .fold(Element::new("img"), |el, (k, v)| el.with_attr(k, *v))
    }

    #[test]
    fn test_tag_and_attr_exists() {
        let sel = Selector::parse("img[data-lazy], source[data-lazy]").unwrap();
        assert!(sel.matches(&img(&[("data-lazy", "/a.jpg")])));
        assert!(!sel.matches(&img(&[("src", "/a.jpg")])));
        assert!(sel.matches(&Element::new("source").with_attr("data-lazy", "/a.webp")));
        assert!(!sel.matches(&Element::new("video").with_attr("data-lazy", "/a.mp4")));
    }

    #[test]
    fn test_file_input_selector() {
        let sel: Selector = r#"input[type="file"][accept*="image"]"#.parse().unwrap();
        let input = Element::new("input")
            .with_attr("type", "file")
            .with_attr("accept", "image/*");
        assert!(sel.matches(&input));

        let docs = Element::new("input")
            .with_attr("type", "file")
            .with_attr("accept", ".pdf");
        assert!(!sel.matches(&docs));

        let text = Element::new("input").with_attr("type", "text");
        assert!(!sel.matches(&text));
    }

    #[test]
    fn test_class_and_id() {
        let sel = Selector::parse("div.product-card[data-product-id]").unwrap();
        let card = Element::new("div")
            .with_attr("class", "col product-card")
            .with_attr("data-product-id", "17");
        assert!(sel.matches(&card));

        let sel = Selector::parse("#mainImage").unwrap();
        assert!(sel.matches(&img(&[("id", "mainImage")])));
        assert!(!sel.matches(&img(&[("id", "thumb")])));
    }

    #[test]
    fn test_prefix_suffix_word() {
        let el = img(&[("src", "/media/a.webp"), ("rel", "preload prefetch")]);
        assert!(Selector::parse("[src^=/media]").unwrap().matches(&el));
        assert!(Selector::parse("[src$='.webp']").unwrap().matches(&el));
        assert!(Selector::parse("[rel~=preload]").unwrap().matches(&el));
        assert!(!Selector::parse("[rel~=pre]").unwrap().matches(&el));
    }

    #[test]
    fn test_universal() {
        let sel = Selector::parse("*[data-preload]").unwrap();
        assert!(sel.matches(&img(&[("data-preload", "/hero.jpg")])));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("img,").is_err());
        assert!(Selector::parse("div img").is_err());
        assert!(Selector::parse("img[data-lazy").is_err());
        assert!(Selector::parse("img.").is_err());
        assert!(Selector::parse("img > source").is_err());
    }

    #[test]
    fn test_display_keeps_source() {
        let sel = Selector::parse(" img[data-lazy] ").unwrap();
        assert_eq!(sel.to_string(), "img[data-lazy]");
    }
}
