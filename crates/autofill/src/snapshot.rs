//! Serializable page model sent by the content script.

use crate::page::{DomEvent, Page, Scope};
use crate::{AutofillError, AutofillResult, FieldSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_ELEMENTS: usize = 10_000;

fn default_visible() -> bool {
    true
}

/// One element of interest: forms, inputs and textareas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Index of the enclosing form element, if any.
    #[serde(default)]
    pub form: Option<usize>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub value: String,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            form: None,
            visible: true,
            value: String::new(),
        }
    }

    pub fn form() -> Self {
        Self::new("form")
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input").with_attr("type", input_type)
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn in_form(mut self, form: usize) -> Self {
        self.form = Some(form);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn is_form(&self) -> bool {
        self.tag.eq_ignore_ascii_case("form")
    }

    fn matches(&self, selector: &FieldSelector) -> bool {
        selector.matches(&self.tag, |name| self.attributes.get(name).map(String::as_str))
    }
}

/// A change to replay against the live document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomMutation {
    Focus { node: usize },
    SetValue { node: usize, value: String },
    Dispatch { node: usize, event: DomEvent },
    Blur { node: usize },
}

/// Flat element list plus what the content script read from local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
    /// Raw local-storage values, scanned for a server login token.
    #[serde(default, rename = "localStorage")]
    pub local_storage: Vec<String>,
    #[serde(skip)]
    mutations: Vec<DomMutation>,
}

impl PageSnapshot {
    pub fn new(elements: Vec<ElementSnapshot>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    /// Reject snapshots whose form references do not point at forms.
    pub fn validate(&self) -> AutofillResult<()> {
        if self.elements.len() > MAX_ELEMENTS {
            return Err(AutofillError::TooManyElements {
                count: self.elements.len(),
                limit: MAX_ELEMENTS,
            });
        }
        for (index, element) in self.elements.iter().enumerate() {
            if let Some(form) = element.form {
                let points_at_form = self.elements.get(form).is_some_and(ElementSnapshot::is_form);
                if !points_at_form {
                    return Err(AutofillError::InvalidFormRef {
                        element: index,
                        form,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn value(&self, node: usize) -> Option<&str> {
        self.elements.get(node).map(|e| e.value.as_str())
    }

    pub fn mutations(&self) -> &[DomMutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<DomMutation> {
        self.mutations
    }
}

impl Page for PageSnapshot {
    type Node = usize;

    fn query_all(&self, scope: Scope<usize>, selector: &FieldSelector) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| match scope {
                Scope::Document => true,
                Scope::Form(form) => element.form == Some(form),
            })
            .filter(|(_, element)| element.matches(selector))
            .map(|(index, _)| index)
            .collect()
    }

    fn is_visible(&self, node: usize) -> bool {
        self.elements.get(node).is_some_and(|e| e.visible)
    }

    fn closest_form(&self, node: usize) -> Option<usize> {
        self.elements.get(node).and_then(|e| e.form)
    }

    fn focus(&mut self, node: usize) {
        self.mutations.push(DomMutation::Focus { node });
    }

    fn set_value(&mut self, node: usize, value: &str) {
        if let Some(element) = self.elements.get_mut(node) {
            element.value = value.to_string();
        }
        self.mutations.push(DomMutation::SetValue {
            node,
            value: value.to_string(),
        });
    }

    fn dispatch(&mut self, node: usize, event: DomEvent) {
        self.mutations.push(DomMutation::Dispatch { node, event });
    }

    fn blur(&mut self, node: usize) {
        self.mutations.push(DomMutation::Blur { node });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PASSWORD_SELECTOR;
    use serde_json::json;

    #[test]
    fn decodes_content_script_payload() {
        let snapshot: PageSnapshot = serde_json::from_value(json!({
            "origin": "https://example.com",
            "elements": [
                {"tag": "form"},
                {"tag": "input", "attributes": {"type": "password"}, "form": 0},
                {"tag": "input", "attributes": {"type": "text"}, "visible": false}
            ],
            "localStorage": ["not json"]
        }))
        .unwrap();

        snapshot.validate().unwrap();
        assert_eq!(snapshot.elements.len(), 3);
        assert!(snapshot.elements[1].visible);
        assert!(!snapshot.is_visible(2));
        assert_eq!(snapshot.closest_form(1), Some(0));
        assert_eq!(snapshot.query_all(Scope::Document, &PASSWORD_SELECTOR), vec![1]);
        assert!(snapshot.mutations().is_empty());
    }

    #[test]
    fn form_reference_must_name_a_form() {
        let snapshot = PageSnapshot::new(vec![
            ElementSnapshot::input("text"),
            ElementSnapshot::input("password").in_form(0),
        ]);
        assert!(matches!(
            snapshot.validate(),
            Err(AutofillError::InvalidFormRef { element: 1, form: 0 })
        ));

        let dangling = PageSnapshot::new(vec![ElementSnapshot::input("password").in_form(7)]);
        assert!(dangling.validate().is_err());
    }

    #[test]
    fn mutations_serialize_with_op_tag() {
        let value = serde_json::to_value(DomMutation::Dispatch {
            node: 3,
            event: DomEvent::Change,
        })
        .unwrap();
        assert_eq!(value, json!({"op": "dispatch", "node": 3, "event": "change"}));
    }
}
