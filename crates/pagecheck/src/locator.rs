//! Locator abstraction for element selection.
//!
//! A [`Locator`] is immutable static data: a semantic name, a [`Strategy`]
//! and an ordered list of fallback fragments. The fragments form a union,
//! so a single locator keeps matching across slightly different markup.
//! Which element wins among several matches is decided by the driver
//! (document order), never by fragment order.

use std::fmt;

/// Strategy used to interpret the fragments of a [`Locator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Each fragment is a CSS selector
    Css,
    /// Each fragment is a value of the named attribute
    Attribute(&'static str),
    /// Each fragment is a text snippet contained in the element's text
    Text,
}

impl Strategy {
    /// Short label used in diagnostics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Attribute(_) => "attribute",
            Self::Text => "text",
        }
    }
}

/// Query a driver can execute for a locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// CSS selector list
    Css(String),
    /// XPath expression
    XPath(String),
}

impl Query {
    /// The raw expression
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

/// A named strategy + selector-fragments pair identifying DOM elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    name: &'static str,
    strategy: Strategy,
    fragments: &'static [&'static str],
}

impl Locator {
    /// Locator whose fragments are CSS selectors
    #[must_use]
    pub const fn css(name: &'static str, fragments: &'static [&'static str]) -> Self {
        Self {
            name,
            strategy: Strategy::Css,
            fragments,
        }
    }

    /// Locator matching any of `values` for the attribute `attribute`
    #[must_use]
    pub const fn attribute(
        name: &'static str,
        attribute: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            strategy: Strategy::Attribute(attribute),
            fragments: values,
        }
    }

    /// Locator matching elements whose own text contains any snippet
    #[must_use]
    pub const fn text(name: &'static str, snippets: &'static [&'static str]) -> Self {
        Self {
            name,
            strategy: Strategy::Text,
            fragments: snippets,
        }
    }

    /// Semantic name, e.g. "email input"
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The matching strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Fallback fragments, most specific first
    #[must_use]
    pub const fn fragments(&self) -> &'static [&'static str] {
        self.fragments
    }

    /// CSS selector list for CSS and attribute strategies
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self.strategy {
            Strategy::Css => Some(self.fragments.join(", ")),
            Strategy::Attribute(attr) => Some(
                self.fragments
                    .iter()
                    .map(|value| format!("[{attr}={}]", css_string(value)))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Strategy::Text => None,
        }
    }

    /// XPath union for the text strategy
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        match self.strategy {
            Strategy::Text => Some(
                self.fragments
                    .iter()
                    .map(|snippet| format!("//*[contains(text(), {})]", xpath_string(snippet)))
                    .collect::<Vec<_>>()
                    .join(" | "),
            ),
            Strategy::Css | Strategy::Attribute(_) => None,
        }
    }

    /// The query a driver should run
    #[must_use]
    pub fn query(&self) -> Query {
        match self.to_css() {
            Some(css) => Query::Css(css),
            None => Query::XPath(self.to_xpath().unwrap_or_default()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.name, self.strategy.label(), self.query().expression())
    }
}

fn css_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

// XPath 1.0 has no escape sequences, so a literal containing both quote
// kinds has to be spliced with concat().
fn xpath_string(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
