//! Attribute selectors for login fields.

use std::fmt;

/// A CSS-style selector: an optional tag plus exact attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    pub tag: Option<&'static str>,
    pub attributes: &'static [(&'static str, &'static str)],
}

impl FieldSelector {
    pub const fn new(
        tag: Option<&'static str>,
        attributes: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { tag, attributes }
    }

    /// Test an element given its tag name and an attribute lookup.
    pub fn matches<'a>(&self, tag: &str, attribute: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(expected) = self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|(name, value)| attribute(*name) == Some(*value))
    }

    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = self.tag {
            f.write_str(tag)?;
        }
        for (name, value) in self.attributes {
            write!(f, "[{name}=\"{value}\"]")?;
        }
        Ok(())
    }
}

pub const PASSWORD_SELECTOR: FieldSelector =
    FieldSelector::new(Some("input"), &[("type", "password")]);

/// Any text input. Only tried inside a form or when the user asked for the fill.
pub const TEXT_FALLBACK_SELECTOR: FieldSelector = FieldSelector::new(None, &[("type", "text")]);

/// Username candidates in priority order.
pub const USERNAME_SELECTORS: &[FieldSelector] = &[
    FieldSelector::new(None, &[("autocomplete", "email")]),
    FieldSelector::new(None, &[("autocomplete", "username")]),
    FieldSelector::new(None, &[("autocomplete", "nickname")]),
    FieldSelector::new(Some("input"), &[("id", "username")]),
    FieldSelector::new(Some("input"), &[("id", "userid")]),
    FieldSelector::new(Some("input"), &[("id", "login")]),
    FieldSelector::new(Some("input"), &[("id", "email")]),
    FieldSelector::new(Some("textarea"), &[("id", "username")]),
    FieldSelector::new(Some("textarea"), &[("id", "userid")]),
    FieldSelector::new(Some("textarea"), &[("id", "login")]),
    FieldSelector::new(Some("textarea"), &[("id", "email")]),
    FieldSelector::new(None, &[("type", "email")]),
    FieldSelector::new(None, &[("name", "user_name")]),
    FieldSelector::new(None, &[("name", "user")]),
    FieldSelector::new(None, &[("name", "auth[username]")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "username")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "userid")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "login")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "email")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "mail")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "nickname")]),
    FieldSelector::new(None, &[("type", "text"), ("name", "nick")]),
];

/// Selectors to try for a username, with the text fallback appended when allowed.
pub fn username_selectors(allow_text_fallback: bool) -> impl Iterator<Item = &'static FieldSelector> {
    const FALLBACK: &[FieldSelector] = &[TEXT_FALLBACK_SELECTOR];
    let fallback = if allow_text_fallback { FALLBACK } else { &[] };
    USERNAME_SELECTORS.iter().chain(fallback.iter())
}
