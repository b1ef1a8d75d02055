use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::chat::format::escape_html;

/// One addressable region of the rendered view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub html: String,
    /// Current value of an input element.
    pub value: String,
    pub hidden: bool,
    pub active: bool,
    pub class: Option<String>,
}

/// Element-id keyed view state the shell and its components render into.
///
/// Elements are created on first touch; reading an unknown id yields
/// `None` rather than an error.
#[derive(Debug, Default)]
pub struct Document {
    elements: HashMap<String, Element>,
}

pub type SharedDocument = Arc<RwLock<Document>>;

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedDocument {
        Arc::new(RwLock::new(Self::new()))
    }

    fn entry(&mut self, id: &str) -> &mut Element {
        self.elements.entry(id.to_string()).or_default()
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Replaces the markup of an element.
    pub fn set_html(&mut self, id: &str, html: impl Into<String>) {
        self.entry(id).html = html.into();
    }

    /// Replaces the content of an element with escaped text.
    pub fn set_text(&mut self, id: &str, text: &str) {
        self.entry(id).html = escape_html(text);
    }

    pub fn html(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.html.as_str())
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) {
        self.entry(id).value = value.into();
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.value.as_str())
    }

    pub fn show(&mut self, id: &str) {
        self.entry(id).hidden = false;
    }

    pub fn hide(&mut self, id: &str) {
        self.entry(id).hidden = true;
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.elements.get(id).map(|e| e.hidden).unwrap_or(false)
    }

    pub fn set_active(&mut self, id: &str, active: bool) {
        self.entry(id).active = active;
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.elements.get(id).map(|e| e.active).unwrap_or(false)
    }

    pub fn set_class(&mut self, id: &str, class: &str) {
        self.entry(id).class = Some(class.to_string());
    }

    pub fn class(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.class.as_deref())
    }

    /// Deactivates every element whose id ends with `suffix`.
    pub fn deactivate_all(&mut self, suffix: &str) {
        for (id, element) in self.elements.iter_mut() {
            if id.ends_with(suffix) {
                element.active = false;
            }
        }
    }

    pub fn active_ids(&self, suffix: &str) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|(id, e)| e.active && id.ends_with(suffix))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let mut doc = Document::new();
        doc.set_text("userName", "<b>Eve</b>");
        assert_eq!(doc.html("userName"), Some("&lt;b&gt;Eve&lt;/b&gt;"));
    }

    #[test]
    fn test_single_active_page() {
        let mut doc = Document::new();
        doc.set_active("homePage", true);
        doc.set_active("browsePage", true);
        doc.deactivate_all("Page");
        doc.set_active("loginPage", true);
        assert_eq!(doc.active_ids("Page"), vec!["loginPage"]);
    }

    #[test]
    fn test_unknown_element_defaults() {
        let doc = Document::new();
        assert!(!doc.is_hidden("missing"));
        assert!(!doc.is_active("missing"));
        assert_eq!(doc.html("missing"), None);
    }
}
