use chromiumoxide::element::Element;

use crate::browser::ChromeDriver;
use crate::error::{BrowserError, Result};
use crate::locators::home as locs;
use crate::pages::base::BasePage;
use crate::pages::streamer::StreamerPage;
use crate::wait::{DEFAULT_ACTION_TIMEOUT, DEFAULT_WAIT_TIMEOUT};

pub const MOBILE_URL: &str = "https://m.twitch.tv/";
pub const DESKTOP_URL: &str = "https://twitch.tv/";

/// Landing screen with the search entry point
pub struct HomePage<'a> {
    base: BasePage<'a>,
}

impl<'a> HomePage<'a> {
    pub fn new(driver: &'a ChromeDriver, mobile: bool) -> Self {
        let url = if mobile { MOBILE_URL } else { DESKTOP_URL };
        Self::with_base_url(driver, url)
    }

    /// Home page served from somewhere other than the public site
    pub fn with_base_url(driver: &'a ChromeDriver, url: impl Into<String>) -> Self {
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

    pub async fn open(&self) -> Result<()> {
        self.base.open().await
    }

    /// Click the search magnifying glass icon
    pub async fn open_search(&self) -> Result<()> {
        self.base
            .click(&locs::SEARCH_ICON, DEFAULT_ACTION_TIMEOUT)
            .await?;
        Ok(())
    }

    pub async fn enter_query(&self, text: &str) -> Result<()> {
        log::info!("Searching for {:?}", text);
        self.base
            .clear_and_set(&locs::SEARCH_INPUT, text, DEFAULT_ACTION_TIMEOUT)
            .await
    }

    /// All visible autocomplete suggestions, in document order
    pub async fn list_suggestions(&self) -> Result<Vec<Element>> {
        self.base
            .wait_and_get_all(&locs::SEARCH_SUGGESTIONS, DEFAULT_WAIT_TIMEOUT)
            .await
    }

    pub async fn choose_suggestion(&self, index: usize) -> Result<()> {
        let suggestions = self.list_suggestions().await?;
        let suggestion = suggestions.get(index).ok_or(BrowserError::IndexOutOfRange {
            index,
            len: suggestions.len(),
        })?;
        self.base.click(suggestion, DEFAULT_ACTION_TIMEOUT).await?;
        Ok(())
    }

    /// One card per live channel, in document order
    pub async fn list_results(&self) -> Result<Vec<Element>> {
        self.base
            .wait_and_get_all(&locs::SEARCH_RESULTS_ARTICLES, DEFAULT_WAIT_TIMEOUT)
            .await
    }

    /// Thumbnail images inside the result cards
    pub async fn list_result_images(&self) -> Result<Vec<Element>> {
        self.base
            .wait_and_get_all(&locs::SEARCH_RESULTS_IMGS, DEFAULT_WAIT_TIMEOUT)
            .await
    }

    /// Click a result card. The returned page shares this session; no
    /// readiness check is made beyond what the caller waits for next.
    pub async fn open_result(&self, result: &Element) -> Result<StreamerPage<'a>> {
        self.base.click(result, DEFAULT_ACTION_TIMEOUT).await?;
        Ok(StreamerPage::new(self.base.driver()))
    }
}
