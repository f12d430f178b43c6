use crate::FieldSelector;
use serde::{Deserialize, Serialize};

/// Where a query looks for elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<N> {
    Document,
    Form(N),
}

/// Events dispatched after setting a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
}

/// The slice of a document the fill heuristic needs.
pub trait Page {
    type Node: Copy + Eq + std::fmt::Debug;

    /// Elements in `scope` matching `selector`, in document order.
    fn query_all(&self, scope: Scope<Self::Node>, selector: &FieldSelector) -> Vec<Self::Node>;

    fn is_visible(&self, node: Self::Node) -> bool;

    /// Nearest enclosing form element.
    fn closest_form(&self, node: Self::Node) -> Option<Self::Node>;

    fn focus(&mut self, node: Self::Node);

    fn set_value(&mut self, node: Self::Node, value: &str);

    fn dispatch(&mut self, node: Self::Node, event: DomEvent);

    fn blur(&mut self, node: Self::Node);
}
