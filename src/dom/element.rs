//! Element data: tag, ordered attributes, class list and inline style.
//!
//! Classes and inline style are not stored separately; they are views over
//! the `class` and `style` attributes so serialization stays faithful to
//! what the page authored.

/// An HTML element without its tree links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    /// Attributes in source order. `None` value = valueless attribute.
    attrs: Vec<(String, Option<String>)>,
}

impl Element {
    /// Create an element with a lowercase tag name and no attributes.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Get attribute value. Valueless attributes read as `""`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Set attribute value, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_ascii_lowercase(), value)),
        }
    }

    /// Set a valueless attribute (e.g. `disabled`).
    pub fn set_flag(&mut self, name: &str) {
        if !self.has_attr(name) {
            self.attrs.push((name.to_ascii_lowercase(), None));
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        self.attrs.remove(pos).1.or_else(|| Some(String::new()))
    }

    /// Iterate attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    // =========================================================================
    // Class list
    // =========================================================================

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class. Returns `false` if it was already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let mut list: Vec<&str> = self.classes().collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attr("class", joined);
        true
    }

    /// Remove a class. Returns `false` if it was not present.
    ///
    /// The `class` attribute is kept (possibly empty) once it exists.
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let joined = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("class", joined);
        true
    }

    /// Force a class on or off.
    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    // =========================================================================
    // Inline style
    // =========================================================================

    /// Read one inline style property.
    pub fn style(&self, property: &str) -> Option<&str> {
        parse_declarations(self.attr("style")?)
            .into_iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set one inline style property, keeping the other declarations.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let current = self.attr("style").unwrap_or("");
        let mut decls: Vec<(String, String)> = parse_declarations(current)
            .into_iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();

        match decls
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }

        let style = decls
            .iter()
            .map(|(n, v)| format!("{n}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", style);
    }
}

/// Split a `style` attribute into `(property, value)` pairs.
fn parse_declarations(style: &str) -> Vec<(&str, &str)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name, value.trim()))
        })
        .collect()
}
