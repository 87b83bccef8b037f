//! Declarative element selectors
//!
//! A [`Locator`] names a query strategy and a query string. Locators are
//! `const` so each page can keep its table in a plain module of constants.

use std::fmt;

use chromiumoxide::element::Element;

/// Query strategy understood by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum By {
    /// XPath 1.0 expression, evaluated through `DOM.performSearch`
    XPath,
    /// CSS selector, evaluated through `querySelectorAll`
    Css,
}

/// A (strategy, query) pair identifying zero or more elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    pub by: By,
    pub query: &'static str,
}

impl Locator {
    pub const fn new(by: By, query: &'static str) -> Self {
        Self { by, query }
    }

    pub const fn xpath(query: &'static str) -> Self {
        Self::new(By::XPath, query)
    }

    pub const fn css(query: &'static str) -> Self {
        Self::new(By::Css, query)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.by {
            By::XPath => write!(f, "xpath={}", self.query),
            By::Css => write!(f, "css={}", self.query),
        }
    }
}

/// Either a locator still to be resolved or an element already in hand.
///
/// Primitives that accept a `Target` resolve locators with a visibility
/// wait and use handles as-is.
#[derive(Clone, Copy)]
pub enum Target<'a> {
    Locator(&'a Locator),
    Handle(&'a Element),
}

impl Target<'_> {
    /// Human-readable description for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Target::Locator(locator) => locator.to_string(),
            Target::Handle(_) => "<element handle>".to_string(),
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<'a> From<&'a Locator> for Target<'a> {
    fn from(locator: &'a Locator) -> Self {
        Target::Locator(locator)
    }
}

impl<'a> From<&'a Element> for Target<'a> {
    fn from(element: &'a Element) -> Self {
        Target::Handle(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_strategy() {
        assert_eq!(
            Locator::xpath("//article").to_string(),
            "xpath=//article"
        );
        assert_eq!(
            Locator::css("input[type=search]").to_string(),
            "css=input[type=search]"
        );
    }

    #[test]
    fn locator_target_describes_its_query() {
        const ICON: Locator = Locator::xpath("//a[@aria-label='Search']");
        let target: Target<'_> = (&ICON).into();
        assert_eq!(target.describe(), "xpath=//a[@aria-label='Search']");
    }
}
