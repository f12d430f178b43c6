//! The fill heuristic.

use crate::page::{DomEvent, Page, Scope};
use crate::selector::{username_selectors, PASSWORD_SELECTOR};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Values to put into the page.
#[derive(Clone, Serialize, Deserialize)]
pub struct FillRequest {
    pub username: String,
    pub password: String,
    /// The user picked this entry explicitly; widens the username search.
    #[serde(default, rename = "isUserTriggered")]
    pub is_user_triggered: bool,
}

impl std::fmt::Debug for FillRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("is_user_triggered", &self.is_user_triggered)
            .finish()
    }
}

/// What [`fill_page`] managed to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOutcome {
    /// No password input on the page; nothing was touched.
    NoPasswordField,
    PasswordOnly,
    PasswordAndUsername,
}

fn first_password_input<P: Page>(page: &P) -> Option<P::Node> {
    let candidates = page.query_all(Scope::Document, &PASSWORD_SELECTOR);
    candidates
        .iter()
        .copied()
        .find(|node| page.is_visible(*node))
        .or_else(|| candidates.first().copied())
}

fn find_username_input<P: Page>(
    page: &P,
    scope: Scope<P::Node>,
    is_user_triggered: bool,
) -> Option<P::Node> {
    let allow_text_fallback = matches!(scope, Scope::Form(_)) || is_user_triggered;
    username_selectors(allow_text_fallback).find_map(|selector| {
        page.query_all(scope, selector)
            .into_iter()
            .find(|node| page.is_visible(*node))
    })
}

fn fill_in<P: Page>(page: &mut P, node: P::Node, value: &str) {
    page.focus(node);
    page.set_value(node, value);
    page.dispatch(node, DomEvent::Input);
    page.dispatch(node, DomEvent::Change);
    page.blur(node);
}

/// Fill the password field, then the most plausible username field.
///
/// The username is searched inside the password's form when there is one,
/// otherwise across the document. Pages without a password input are left
/// untouched.
pub fn fill_page<P: Page>(page: &mut P, request: &FillRequest) -> FillOutcome {
    let Some(password_node) = first_password_input(page) else {
        debug!("No password input on page, skipping fill");
        return FillOutcome::NoPasswordField;
    };
    fill_in(page, password_node, &request.password);

    let scope = match page.closest_form(password_node) {
        Some(form) => Scope::Form(form),
        None => Scope::Document,
    };
    let Some(username_node) = find_username_input(page, scope, request.is_user_triggered) else {
        debug!(?scope, "No username input found");
        return FillOutcome::PasswordOnly;
    };
    fill_in(page, username_node, &request.username);
    FillOutcome::PasswordAndUsername
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomMutation, ElementSnapshot, PageSnapshot};

    fn request(is_user_triggered: bool) -> FillRequest {
        FillRequest {
            username: "alice".into(),
            password: "s3cret".into(),
            is_user_triggered,
        }
    }

    fn events_for(page: &PageSnapshot, node: usize) -> Vec<DomEvent> {
        page.mutations()
            .iter()
            .filter_map(|m| match m {
                DomMutation::Dispatch { node: n, event } if *n == node => Some(*event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn no_password_field_means_no_mutation() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::form(),
            ElementSnapshot::input("text").in_form(0).with_attr("name", "username"),
        ]);
        assert_eq!(fill_page(&mut page, &request(true)), FillOutcome::NoPasswordField);
        assert!(page.mutations().is_empty());
    }

    #[test]
    fn fills_both_fields_inside_form() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::form(),
            ElementSnapshot::input("text").in_form(0),
            ElementSnapshot::input("password").in_form(0),
        ]);

        let outcome = fill_page(&mut page, &request(false));
        assert_eq!(outcome, FillOutcome::PasswordAndUsername);
        assert_eq!(page.value(1), Some("alice"));
        assert_eq!(page.value(2), Some("s3cret"));
        assert_eq!(events_for(&page, 1), vec![DomEvent::Input, DomEvent::Change]);
        assert_eq!(events_for(&page, 2), vec![DomEvent::Input, DomEvent::Change]);
    }

    #[test]
    fn password_filled_first_with_focus_and_blur() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::form(),
            ElementSnapshot::input("email").in_form(0),
            ElementSnapshot::input("password").in_form(0),
        ]);
        fill_page(&mut page, &request(false));

        let first = &page.mutations()[..5];
        assert_eq!(first[0], DomMutation::Focus { node: 2 });
        assert_eq!(
            first[1],
            DomMutation::SetValue {
                node: 2,
                value: "s3cret".into()
            }
        );
        assert_eq!(first[4], DomMutation::Blur { node: 2 });
        assert_eq!(page.mutations()[5], DomMutation::Focus { node: 1 });
    }

    #[test]
    fn prefers_visible_password_input() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::input("password").hidden(),
            ElementSnapshot::input("password"),
        ]);
        fill_page(&mut page, &request(false));
        assert_eq!(page.value(0), Some(""));
        assert_eq!(page.value(1), Some("s3cret"));
    }

    #[test]
    fn falls_back_to_hidden_password_input() {
        let mut page = PageSnapshot::new(vec![ElementSnapshot::input("password").hidden()]);
        assert_eq!(fill_page(&mut page, &request(false)), FillOutcome::PasswordOnly);
        assert_eq!(page.value(0), Some("s3cret"));
    }

    #[test]
    fn selector_priority_beats_document_order() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::form(),
            ElementSnapshot::input("text").in_form(0).with_attr("name", "login"),
            ElementSnapshot::input("text").in_form(0).with_attr("autocomplete", "username"),
            ElementSnapshot::input("password").in_form(0),
        ]);
        fill_page(&mut page, &request(false));
        assert_eq!(page.value(1), Some(""));
        assert_eq!(page.value(2), Some("alice"));
    }

    #[test]
    fn hidden_username_candidates_are_skipped() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::form(),
            ElementSnapshot::input("email").in_form(0).hidden(),
            ElementSnapshot::input("text").in_form(0),
            ElementSnapshot::input("password").in_form(0),
        ]);
        fill_page(&mut page, &request(false));
        assert_eq!(page.value(1), Some(""));
        assert_eq!(page.value(2), Some("alice"));
    }

    #[test]
    fn plain_text_input_outside_form_needs_user_trigger() {
        let elements = vec![
            ElementSnapshot::input("text"),
            ElementSnapshot::input("password"),
        ];

        let mut automatic = PageSnapshot::new(elements.clone());
        assert_eq!(fill_page(&mut automatic, &request(false)), FillOutcome::PasswordOnly);
        assert_eq!(automatic.value(0), Some(""));

        let mut triggered = PageSnapshot::new(elements);
        assert_eq!(
            fill_page(&mut triggered, &request(true)),
            FillOutcome::PasswordAndUsername
        );
        assert_eq!(triggered.value(0), Some("alice"));
    }

    #[test]
    fn username_search_stays_inside_the_form() {
        let mut page = PageSnapshot::new(vec![
            ElementSnapshot::input("email"),
            ElementSnapshot::form(),
            ElementSnapshot::input("password").in_form(1),
        ]);
        assert_eq!(fill_page(&mut page, &request(true)), FillOutcome::PasswordOnly);
        assert_eq!(page.value(0), Some(""));
    }

    #[test]
    fn request_debug_hides_password() {
        let rendered = format!("{:?}", request(false));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("alice"));
    }
}
