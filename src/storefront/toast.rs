//! Toast notifications.

use std::fmt;

use crate::dom::{Document, Element, NodeId};

pub const CONTAINER_ID: &str = "toastContainer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Info,
    Danger,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Warning)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Info)
    }
}

/// Toasts raised during a session, in order, until dismissed.
#[derive(Debug, Default)]
pub struct ToastStack {
    toasts: Vec<Toast>,
    /// Nodes of the toasts already in the document, in order.
    shown: Vec<NodeId>,
}

impl ToastStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Append toasts not yet shown to `#toastContainer`, creating it at the
    /// end of `<body>` when missing.
    pub fn render(&mut self, doc: &mut Document) {
        if self.shown.len() >= self.toasts.len() {
            return;
        }
        let Some(container) = container(doc) else {
            return;
        };
        for toast in &self.toasts[self.shown.len()..] {
            let node = toast_node(doc, toast);
            doc.append_child(container, node);
            self.shown.push(node);
        }
    }

    /// Hide every shown toast: remove it from the document and forget it.
    /// Toasts pushed but not rendered yet are kept.
    ///
    /// Returns the number of toasts removed.
    pub fn dismiss(&mut self, doc: &mut Document) -> usize {
        for &node in &self.shown {
            doc.detach(node);
        }
        let dismissed = self.shown.len();
        self.toasts.drain(..dismissed);
        self.shown.clear();
        dismissed
    }
}

fn container(doc: &mut Document) -> Option<NodeId> {
    if let Some(id) = doc.get_element_by_id(CONTAINER_ID) {
        return Some(id);
    }
    let body = doc.body()?;
    let mut el = Element::new("div")
        .with_attr("id", CONTAINER_ID)
        .with_attr("class", "toast-container position-fixed bottom-0 end-0 p-3");
    el.set_style("z-index", "1060");
    let id = doc.create_element(el);
    doc.append_child(body, id);
    Some(id)
}

fn toast_node(doc: &mut Document, toast: &Toast) -> NodeId {
    let root = doc.create_element(
        Element::new("div")
            .with_attr(
                "class",
                format!("toast align-items-center text-white bg-{} border-0", toast.kind),
            )
            .with_attr("role", "alert"),
    );
    let flex = doc.create_element(Element::new("div").with_attr("class", "d-flex"));
    let body = doc.create_element(Element::new("div").with_attr("class", "toast-body"));
    doc.set_text(body, &toast.message);
    let close = doc.create_element(
        Element::new("button")
            .with_attr("type", "button")
            .with_attr("class", "btn-close btn-close-white me-2 m-auto")
            .with_attr("data-bs-dismiss", "toast"),
    );

    doc.append_child(flex, body);
    doc.append_child(flex, close);
    doc.append_child(root, flex);
    root
}
