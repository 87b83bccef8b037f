use std::time::Duration;

use thiserror::Error;

use crate::locator::Locator;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to connect to Chrome: {0}")]
    ConnectionFailed(String),

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// A wait-based lookup gave up. `cause` is the condition that was
    /// observed when the wait ended.
    #[error("Element not found: {locator}")]
    NotFound {
        locator: Locator,
        #[source]
        cause: LookupError,
    },

    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    #[error("Index {index} out of range for {len} element(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("No page available")]
    NoPage,

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl BrowserError {
    /// The lookup condition behind a `NotFound`, looking through a timeout
    /// to the last condition it recorded.
    pub fn lookup_cause(&self) -> Option<&LookupError> {
        match self {
            BrowserError::NotFound { cause, .. } => Some(cause.innermost()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BrowserError::NotFound {
                cause: LookupError::Timeout { .. },
                ..
            }
        )
    }

    /// Errors the click fallback is allowed to recover from.
    pub fn is_click_obstruction(&self) -> bool {
        matches!(
            self,
            BrowserError::ClickIntercepted(_) | BrowserError::NotInteractable(_)
        )
    }
}

/// Why a single lookup attempt did not yield a usable element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("timed out after {timeout:?}")]
    Timeout {
        timeout: Duration,
        #[source]
        last: Box<LookupError>,
    },

    #[error("no element matched")]
    NoSuchElement,

    #[error("element is not visible")]
    NotVisible,

    #[error("element is no longer attached to the document")]
    Stale,

    #[error("query failed: {0}")]
    Query(String),
}

impl LookupError {
    pub fn innermost(&self) -> &LookupError {
        match self {
            LookupError::Timeout { last, .. } => last.innermost(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
