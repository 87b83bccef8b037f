//! Shared interaction primitives for page objects
//!
//! Every primitive that takes a locator waits for the element to be present
//! and visible before touching it. Lookup failures come back as
//! [`BrowserError::NotFound`] carrying the condition observed when the wait
//! ended, so callers can tell a slow page from a wrong selector. A session
//! that stops answering ends the wait at once with [`BrowserError::CdpError`].

use chromiumoxide::cdp::browser_protocol::dom::{DiscardSearchResultsParams, PerformSearchParams};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;

use crate::browser::ChromeDriver;
use crate::error::{BrowserError, LookupError, Result};
use crate::locator::{By, Locator, Target};
use crate::wait::{poll_until, ProbeError, DEFAULT_POLL_INTERVAL};

type Probe = ProbeError<CdpError>;

const IS_DISPLAYED_JS: &str = r#"function() {
    if (!this.isConnected) return false;
    const style = window.getComputedStyle(this);
    if (style.display === 'none') return false;
    if (style.visibility === 'hidden' || style.visibility === 'collapse') return false;
    if (parseFloat(style.opacity) === 0) return false;
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

// Returns "ok" when a click at the element's centre would land on the
// element itself or one of its descendants.
const HIT_TEST_JS: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return 'no-box';
    if (this.disabled === true) return 'disabled';
    const x = rect.left + rect.width / 2;
    const y = rect.top + rect.height / 2;
    if (x < 0 || y < 0 || x > window.innerWidth || y > window.innerHeight) return 'off-screen';
    const hit = document.elementFromPoint(x, y);
    if (hit === null) return 'off-screen';
    if (hit === this || this.contains(hit)) return 'ok';
    let name = hit.tagName.toLowerCase();
    if (hit.id) name += '#' + hit.id;
    return 'covered:' + name;
}"#;

const CLEAR_JS: &str = r#"function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    } else if (this.isContentEditable) {
        this.textContent = '';
    }
}"#;

const SCROLL_INTO_VIEW_JS: &str = "function() { this.scrollIntoView(); }";

/// How a [`BasePage::click`] ended up being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The element received a direct click.
    Direct,
    /// The direct click was obstructed and the single pointer-action retry
    /// was used instead.
    PointerFallback,
}

/// Base for all page objects: a borrowed session plus the page's URL and
/// title.
pub struct BasePage<'a> {
    driver: &'a ChromeDriver,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl<'a> BasePage<'a> {
    pub fn new(driver: &'a ChromeDriver) -> Self {
        Self {
            driver,
            url: None,
            title: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn driver(&self) -> &'a ChromeDriver {
        self.driver
    }

    pub async fn go_to(&self, url: &str) -> Result<()> {
        self.driver.navigate(url).await
    }

    /// Navigate to this page's own URL.
    pub async fn open(&self) -> Result<()> {
        match &self.url {
            Some(url) => self.go_to(url).await,
            None => Err(BrowserError::NavigationFailed(
                "page object has no URL".to_string(),
            )),
        }
    }

    /// Set the implicit-wait horizon used by [`find_now`](Self::find_now)
    /// for the rest of the session.
    pub fn wait_for_load(&self, timeout: std::time::Duration) {
        log::debug!("implicit wait set to {:?}", timeout);
        self.driver.set_implicit_wait(timeout);
    }

    /// Wait until the first element matching `locator` is present and
    /// visible.
    ///
    /// When several elements match, the first in document order is used;
    /// both query strategies return matches in document order.
    pub async fn wait_and_get(
        &self,
        locator: &Locator,
        timeout: std::time::Duration,
    ) -> Result<Element> {
        poll_until(timeout, DEFAULT_POLL_INTERVAL, || self.first_visible(locator))
            .await
            .map_err(|e| wait_failed(locator, e))
    }

    /// Wait until at least one element matches `locator` and every match is
    /// visible in the same poll. Never returns a partial set.
    pub async fn wait_and_get_all(
        &self,
        locator: &Locator,
        timeout: std::time::Duration,
    ) -> Result<Vec<Element>> {
        poll_until(timeout, DEFAULT_POLL_INTERVAL, || self.all_visible(locator))
            .await
            .map_err(|e| wait_failed(locator, e))
    }

    /// Single presence lookup that only honours the session's implicit wait.
    pub async fn find_now(&self, locator: &Locator) -> Result<Element> {
        poll_until(self.driver.implicit_wait(), DEFAULT_POLL_INTERVAL, || {
            self.first_present(locator)
        })
        .await
        .map_err(|e| match e {
            ProbeError::Lookup(cause) => not_found(locator, cause.innermost().clone()),
            ProbeError::Fatal(e) => BrowserError::CdpError(e),
        })
    }

    pub async fn is_displayed(&self, element: &Element) -> Result<bool> {
        Ok(self.visibility(element).await?)
    }

    /// Click an element, falling back once to a pointer action sequence when
    /// the direct click is intercepted or the element is not interactable.
    pub async fn click<'t>(
        &self,
        target: impl Into<Target<'t>>,
        timeout: std::time::Duration,
    ) -> Result<ClickOutcome> {
        let target = target.into();

        let direct = match target {
            Target::Handle(element) => self.direct_click(element).await,
            Target::Locator(locator) => {
                let element = self.wait_and_get(locator, timeout).await?;
                self.direct_click(&element).await
            }
        };

        match direct {
            Ok(()) => Ok(ClickOutcome::Direct),
            Err(e) if e.is_click_obstruction() => {
                log::debug!("direct click on {} failed ({}), retrying with pointer", target.describe(), e);
                match target {
                    Target::Handle(element) => self.pointer_click(element).await?,
                    Target::Locator(locator) => {
                        let element = self.wait_and_get(locator, timeout).await?;
                        self.pointer_click(&element).await?
                    }
                }
                Ok(ClickOutcome::PointerFallback)
            }
            Err(e) => Err(e),
        }
    }

    /// Clear a text field, then look it up again and type `text`.
    ///
    /// The second lookup is a plain `find_now`; if the field is replaced in
    /// between, typing goes to whatever matches at that moment.
    pub async fn clear_and_set(
        &self,
        locator: &Locator,
        text: &str,
        timeout: std::time::Duration,
    ) -> Result<()> {
        let field = self.wait_and_get(locator, timeout).await?;
        field.call_js_fn(CLEAR_JS, false).await?;

        let field = self.find_now(locator).await?;
        field.focus().await?;
        field.type_str(text).await?;
        Ok(())
    }

    /// Rendered text (`innerText`) of the target
    pub async fn read_text<'t>(
        &self,
        target: impl Into<Target<'t>>,
        timeout: std::time::Duration,
    ) -> Result<String> {
        let resolved;
        let element = match target.into() {
            Target::Handle(element) => element,
            Target::Locator(locator) => {
                resolved = self.wait_and_get(locator, timeout).await?;
                &resolved
            }
        };
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    /// Value of attribute `name`, `None` when the element does not carry it
    pub async fn read_attribute(
        &self,
        locator: &Locator,
        name: &str,
        timeout: std::time::Duration,
    ) -> Result<Option<String>> {
        let element = self.wait_and_get(locator, timeout).await?;
        Ok(element.attribute(name).await?)
    }

    /// Bring the target into the viewport with `Element.scrollIntoView()`.
    pub async fn scroll_into_view<'t>(
        &self,
        target: impl Into<Target<'t>>,
        timeout: std::time::Duration,
    ) -> Result<()> {
        let resolved;
        let element = match target.into() {
            Target::Handle(element) => element,
            Target::Locator(locator) => {
                resolved = self.wait_and_get(locator, timeout).await?;
                &resolved
            }
        };
        element.call_js_fn(SCROLL_INTO_VIEW_JS, false).await?;
        Ok(())
    }

    async fn first_present(&self, locator: &Locator) -> std::result::Result<Element, Probe> {
        self.query(locator)
            .await?
            .into_iter()
            .next()
            .ok_or(ProbeError::Lookup(LookupError::NoSuchElement))
    }

    async fn first_visible(&self, locator: &Locator) -> std::result::Result<Element, Probe> {
        let first = self.first_present(locator).await?;
        if self.visibility(&first).await.map_err(classify)? {
            Ok(first)
        } else {
            Err(LookupError::NotVisible.into())
        }
    }

    async fn all_visible(&self, locator: &Locator) -> std::result::Result<Vec<Element>, Probe> {
        let elements = self.query(locator).await?;
        if elements.is_empty() {
            return Err(LookupError::NoSuchElement.into());
        }
        for element in &elements {
            if !self.visibility(element).await.map_err(classify)? {
                return Err(LookupError::NotVisible.into());
            }
        }
        Ok(elements)
    }

    async fn query(&self, locator: &Locator) -> std::result::Result<Vec<Element>, Probe> {
        let page = self.driver.page();
        let found = match locator.by {
            By::XPath => {
                if self.xpath_match_count(locator.query).await.map_err(classify)? == 0 {
                    return Ok(Vec::new());
                }
                page.find_xpaths(locator.query).await
            }
            By::Css => page.find_elements(locator.query).await,
        };
        found.map_err(classify)
    }

    /// Number of nodes an XPath expression matches right now. Chrome rejects
    /// fetching an empty result range, so the count is checked before
    /// asking for the nodes. The search is discarded either way.
    async fn xpath_match_count(&self, xpath: &str) -> std::result::Result<i64, CdpError> {
        let page = self.driver.page();
        page.get_document().await?;
        let search = page.execute(PerformSearchParams::new(xpath)).await?.result;
        if let Err(e) = page
            .execute(DiscardSearchResultsParams::new(search.search_id.clone()))
            .await
        {
            log::debug!("failed to discard search {}: {}", search.search_id, e);
        }
        Ok(search.result_count)
    }

    async fn visibility(&self, element: &Element) -> std::result::Result<bool, CdpError> {
        Ok(element
            .call_js_fn(IS_DISPLAYED_JS, false)
            .await?
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn direct_click(&self, element: &Element) -> Result<()> {
        element
            .scroll_into_view()
            .await
            .map_err(|e| BrowserError::NotInteractable(e.to_string()))?;

        let verdict = element
            .call_js_fn(HIT_TEST_JS, false)
            .await?
            .result
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        match verdict.as_str() {
            "ok" => {
                element.click().await?;
                Ok(())
            }
            covered if covered.starts_with("covered:") => Err(BrowserError::ClickIntercepted(
                format!("click would land on {}", &covered["covered:".len()..]),
            )),
            other => Err(BrowserError::NotInteractable(other.to_string())),
        }
    }

    async fn pointer_click(&self, element: &Element) -> Result<()> {
        let point = element
            .scroll_into_view()
            .await
            .map_err(|e| BrowserError::NotInteractable(e.to_string()))?
            .clickable_point()
            .await
            .map_err(|e| BrowserError::NotInteractable(e.to_string()))?;

        let page = self.driver.page();
        page.move_mouse(point).await?;
        page.click(point).await?;
        Ok(())
    }
}

fn not_found(locator: &Locator, cause: LookupError) -> BrowserError {
    BrowserError::NotFound {
        locator: *locator,
        cause,
    }
}

fn wait_failed(locator: &Locator, e: Probe) -> BrowserError {
    match e {
        ProbeError::Lookup(cause) => not_found(locator, cause),
        ProbeError::Fatal(e) => BrowserError::CdpError(e),
    }
}

/// Sort a CDP failure raised while querying or probing an element.
///
/// Node and selector problems are lookup conditions worth polling again.
/// Anything else (closed connection, crashed target) is fatal.
fn classify(e: CdpError) -> Probe {
    let lower = e.to_string().to_ascii_lowercase();
    if lower.contains("detached")
        || lower.contains("no node with given id")
        || lower.contains("could not find node")
        || lower.contains("cannot find context")
        || lower.contains("object reference chain is too long")
    {
        LookupError::Stale.into()
    } else if lower.contains("invalid search result range")
        || lower.contains("no node found")
        || lower.contains("node not found")
    {
        LookupError::NoSuchElement.into()
    } else if lower.contains("dom error while querying")
        || lower.contains("is not a valid")
        || lower.contains("syntaxerror")
    {
        LookupError::Query(e.to_string()).into()
    } else {
        ProbeError::Fatal(e)
    }
}
