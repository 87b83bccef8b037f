use std::time::Duration;

use chromiumoxide::element::Element;

use crate::browser::ChromeDriver;
use crate::error::{BrowserError, Result};
use crate::locators::streamer as locs;
use crate::pages::base::BasePage;
use crate::wait::{DEFAULT_ACTION_TIMEOUT, DEFAULT_WAIT_TIMEOUT};

/// How long `has_mature_content_gate` looks for the gate by default
pub const MATURE_GATE_PROBE: Duration = Duration::from_secs(1);

/// Channel page reached from a search result
pub struct StreamerPage<'a> {
    base: BasePage<'a>,
}

impl<'a> StreamerPage<'a> {
    /// Channel page for whatever the session is currently showing
    pub fn new(driver: &'a ChromeDriver) -> Self {
        Self {
            base: BasePage::new(driver).with_title("Twitch"),
        }
    }

    /// Channel page at a known address, e.g. `https://m.twitch.tv/velocitish`
    pub fn with_url(driver: &'a ChromeDriver, url: impl Into<String>) -> Self {
        Self {
            base: BasePage::new(driver).with_url(url).with_title("Twitch"),
        }
    }

    pub fn base(&self) -> &BasePage<'a> {
        &self.base
    }

    pub fn url(&self) -> Option<&str> {
        self.base.url.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.base.title.as_deref()
    }

    pub async fn open(&self) -> Result<()> {
        self.base.open().await
    }

    /// Channel name and category elements, in that order
    pub async fn username_and_game(&self) -> Result<(Element, Element)> {
        let found = self
            .base
            .wait_and_get_all(&locs::USERNAME_AND_GAME, DEFAULT_WAIT_TIMEOUT)
            .await?;
        let len = found.len();
        let mut found = found.into_iter();
        match (found.next(), found.next()) {
            (Some(username), Some(game)) => Ok((username, game)),
            _ => Err(BrowserError::IndexOutOfRange { index: 1, len }),
        }
    }

    /// Whether the "start watching" interstitial is showing.
    ///
    /// A short wait is used as an existence probe: if the button does not
    /// become visible within `timeout` the gate is taken to be absent.
    pub async fn has_mature_content_gate(&self, timeout: Duration) -> Result<bool> {
        match self
            .base
            .wait_and_get(&locs::START_WATCHING_BTN, timeout)
            .await
        {
            Ok(button) => self.base.is_displayed(&button).await,
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn dismiss_mature_content_gate(&self) -> Result<()> {
        log::info!("Dismissing mature content gate");
        self.base
            .click(&locs::START_WATCHING_BTN, DEFAULT_ACTION_TIMEOUT)
            .await?;
        Ok(())
    }
}
