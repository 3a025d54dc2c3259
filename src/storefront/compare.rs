//! Product comparison list.
//!
//! Up to `max` product ids, persisted as a JSON array under
//! `comparisonList` in local storage. Every operation reports its result as
//! a [`Toast`].

use super::toast::Toast;
use crate::debug;
use crate::dom::{Document, Element, Selector};
use crate::store::{KeyValueStore, StorageError};

pub const STORAGE_KEY: &str = "comparisonList";
pub const ADD_BUTTON_CLASS: &str = "comparison-add-btn";

pub const MSG_DUPLICATE: &str = "Product already in comparison";
pub const MSG_ADDED: &str = "Product added to comparison";
pub const MSG_REMOVED: &str = "Product removed from comparison";
pub const MSG_CLEARED: &str = "Comparison cleared";
pub const MSG_EMPTY: &str = "No products to compare";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonList {
    ids: Vec<String>,
    max: usize,
}

impl ComparisonList {
    /// Read the list from storage. Missing or malformed data is an empty
    /// list; entries beyond `max` are dropped.
    pub fn load(store: &dyn KeyValueStore, max: usize) -> Self {
        let mut ids: Vec<String> = match store.get(STORAGE_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!("compare"; "ignoring stored list: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        ids.truncate(max);
        Self { ids, max }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.max
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Storage is written before the list changes, so a failed write
    /// leaves both untouched.
    pub fn add(&mut self, id: &str, store: &mut dyn KeyValueStore) -> Result<Toast, StorageError> {
        if self.contains(id) {
            return Ok(Toast::warning(MSG_DUPLICATE));
        }
        if self.is_full() {
            return Ok(Toast::warning(format!(
                "At most {} products can be compared",
                self.max
            )));
        }
        let mut ids = self.ids.clone();
        ids.push(id.to_owned());
        save(&ids, store)?;
        self.ids = ids;
        Ok(Toast::success(MSG_ADDED))
    }

    pub fn remove(
        &mut self,
        id: &str,
        store: &mut dyn KeyValueStore,
    ) -> Result<Toast, StorageError> {
        let ids: Vec<String> = self.ids.iter().filter(|i| *i != id).cloned().collect();
        save(&ids, store)?;
        self.ids = ids;
        Ok(Toast::info(MSG_REMOVED))
    }

    pub fn clear(&mut self, store: &mut dyn KeyValueStore) -> Result<Toast, StorageError> {
        store.remove(STORAGE_KEY)?;
        self.ids.clear();
        Ok(Toast::info(MSG_CLEARED))
    }

    /// Warning when there is nothing to compare, `None` when the
    /// comparison can be shown.
    pub fn toggle(&self) -> Option<Toast> {
        self.is_empty().then(|| Toast::warning(MSG_EMPTY))
    }

    /// Show the count in `#comparisonCount` and toggle `#comparisonWidget`.
    /// Does nothing unless both exist.
    pub fn update_widget(&self, doc: &mut Document) {
        let (Some(widget), Some(count)) = (
            doc.get_element_by_id("comparisonWidget"),
            doc.get_element_by_id("comparisonCount"),
        ) else {
            return;
        };

        doc.set_text(count, &self.ids.len().to_string());
        if let Some(el) = doc.element_mut(widget) {
            el.set_style("display", if self.is_empty() { "none" } else { "block" });
        }
    }
}

fn save(ids: &[String], store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
    // Vec<String> always serializes
    let json = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_owned());
    store.set(STORAGE_KEY, &json)
}

/// Append a compare button to the `.product-info` of every product card.
/// Returns the number of buttons added.
pub fn install_buttons(doc: &mut Document) -> usize {
    let (Ok(cards), Ok(info), Ok(button)) = (
        Selector::parse(".product-card[data-product-id]"),
        Selector::parse(".product-info"),
        Selector::parse(&format!("button.{ADD_BUTTON_CLASS}")),
    ) else {
        return 0;
    };

    let mut added = 0;
    for card in doc.select_all(&cards) {
        let Some(product_id) = doc
            .element(card)
            .and_then(|el| el.attr("data-product-id"))
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };
        let Some(&target) = doc.select_within(card, &info).first() else {
            continue;
        };
        if !doc.select_within(target, &button).is_empty() {
            continue;
        }

        let node = doc.create_element(
            Element::new("button")
                .with_attr("type", "button")
                .with_attr(
                    "class",
                    format!("btn btn-outline-primary btn-sm {ADD_BUTTON_CLASS}"),
                )
                .with_attr("data-product-id", product_id),
        );
        doc.set_text(node, "Compare");
        doc.append_child(target, node);
        added += 1;
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::storefront::toast::ToastKind;

    fn list(store: &MemoryStore) -> ComparisonList {
        ComparisonList::load(store, 3)
    }

    /// Reads from the wrapped store, refuses every write.
    struct ReadOnly(MemoryStore);

    impl KeyValueStore for ReadOnly {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(
                "storage.json".into(),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.set(key, "")
        }
    }

    #[test]
    fn test_failed_write_leaves_list_unchanged() {
        let mut inner = MemoryStore::new();
        inner.set(STORAGE_KEY, r#"["3","5"]"#).unwrap();
        let mut store = ReadOnly(inner);
        let mut compare = ComparisonList::load(&store, 3);

        assert!(compare.add("8", &mut store).is_err());
        assert!(compare.remove("3", &mut store).is_err());
        assert!(compare.clear(&mut store).is_err());
        assert_eq!(compare.ids(), ["3", "5"]);
        assert_eq!(store.get(STORAGE_KEY).as_deref(), Some(r#"["3","5"]"#));
    }

    #[test]
    fn test_add_and_persist() {
        let mut store = MemoryStore::new();
        let mut compare = list(&store);

        let toast = compare.add("12", &mut store).unwrap();
        assert_eq!(toast, Toast::success(MSG_ADDED));
        assert_eq!(store.get(STORAGE_KEY).as_deref(), Some(r#"["12"]"#));
        assert_eq!(list(&store).ids(), ["12"]);
    }

    #[test]
    fn test_add_duplicate() {
        let mut store = MemoryStore::new();
        let mut compare = list(&store);
        compare.add("12", &mut store).unwrap();

        let toast = compare.add("12", &mut store).unwrap();
        assert_eq!(toast, Toast::warning(MSG_DUPLICATE));
        assert_eq!(compare.len(), 1);
    }

    #[test]
    fn test_add_when_full() {
        let mut store = MemoryStore::new();
        let mut compare = list(&store);
        for id in ["1", "2", "3"] {
            compare.add(id, &mut store).unwrap();
        }
        assert!(compare.is_full());

        let toast = compare.add("4", &mut store).unwrap();
        assert_eq!(toast.kind, ToastKind::Warning);
        assert_eq!(toast.message, "At most 3 products can be compared");
        assert_eq!(compare.ids(), ["1", "2", "3"]);
        assert_eq!(store.get(STORAGE_KEY).as_deref(), Some(r#"["1","2","3"]"#));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = MemoryStore::new();
        let mut compare = list(&store);
        compare.add("1", &mut store).unwrap();
        compare.add("2", &mut store).unwrap();

        assert_eq!(compare.remove("1", &mut store).unwrap(), Toast::info(MSG_REMOVED));
        assert_eq!(list(&store).ids(), ["2"]);

        assert_eq!(compare.clear(&mut store).unwrap(), Toast::info(MSG_CLEARED));
        assert!(compare.is_empty());
        assert_eq!(store.get(STORAGE_KEY), None);
    }

    #[test]
    fn test_toggle() {
        let mut store = MemoryStore::new();
        let mut compare = list(&store);
        assert_eq!(compare.toggle(), Some(Toast::warning(MSG_EMPTY)));
        compare.add("5", &mut store).unwrap();
        assert_eq!(compare.toggle(), None);
    }

    #[test]
    fn test_load_tolerates_bad_data() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{not json").unwrap();
        assert!(list(&store).is_empty());

        store.set(STORAGE_KEY, r#"["a","b","c","d"]"#).unwrap();
        assert_eq!(list(&store).ids(), ["a", "b", "c"]);
    }

    #[test]
    fn test_update_widget() {
        let mut doc = Document::parse(
            r#"<html><body><div id="comparisonWidget" style="display: none"><span id="comparisonCount">0</span></div></body></html>"#,
        )
        .unwrap();
        let mut store = MemoryStore::new();
        let mut compare = list(&store);
        compare.add("9", &mut store).unwrap();
        compare.update_widget(&mut doc);

        let widget = doc.get_element_by_id("comparisonWidget").unwrap();
        let count = doc.get_element_by_id("comparisonCount").unwrap();
        assert_eq!(doc.text_content(count), "1");
        assert_eq!(doc.element(widget).unwrap().style("display"), Some("block"));

        compare.clear(&mut store).unwrap();
        compare.update_widget(&mut doc);
        assert_eq!(doc.text_content(count), "0");
        assert_eq!(doc.element(widget).unwrap().style("display"), Some("none"));
    }

    #[test]
    fn test_update_widget_missing_elements() {
        let mut doc = Document::parse(r#"<html><body><span id="comparisonCount">0</span></body></html>"#)
            .unwrap();
        let before = doc.to_html();
        list(&MemoryStore::new()).update_widget(&mut doc);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_install_buttons() {
        let mut doc = Document::parse(
            r#"<html><body>
<div class="product-card" data-product-id="7"><div class="product-info"><h5>Viscoelastic</h5></div></div>
<div class="product-card" data-product-id="8"><h5>No info block</h5></div>
<div class="product-card"><div class="product-info"></div></div>
</body></html>"#,
        )
        .unwrap();

        assert_eq!(install_buttons(&mut doc), 1);
        assert_eq!(install_buttons(&mut doc), 0);

        let buttons = doc.select_all(&Selector::parse("button.comparison-add-btn").unwrap());
        assert_eq!(buttons.len(), 1);
        let el = doc.element(buttons[0]).unwrap();
        assert_eq!(el.attr("data-product-id"), Some("7"));
        assert_eq!(doc.text_content(buttons[0]), "Compare");
    }
}
