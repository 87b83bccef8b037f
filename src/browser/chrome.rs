// spider_chrome re-exports chromiumoxide API
use crate::browser::device::DeviceProfile;
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use chromiumoxide_fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A single Chrome session driving one tab.
///
/// Page objects borrow the driver; every page object created during a run
/// shares the same tab and the same implicit-wait setting.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    temp_dir: Option<PathBuf>,
    device: Option<DeviceProfile>,
    implicit_wait_ms: AtomicU64,
}

/// Connection mode for Chrome browser
pub enum ConnectionMode {
    /// Sandboxed mode - launches Chrome using system installation
    Sandboxed {
        chrome_path: Option<String>,
        no_sandbox: bool,
        headless: bool,
    },
    /// Advanced mode - connects to existing Chrome on debug port
    DebugPort(u16),
}

impl ConnectionMode {
    /// Headless, no-sandbox launch used by tests and CI
    pub fn headless() -> Self {
        ConnectionMode::Sandboxed {
            chrome_path: None,
            no_sandbox: true,
            headless: true,
        }
    }
}

impl ChromeDriver {
    /// Pick the first real page, excluding Chrome's new-tab-page, or open one
    async fn get_active_page(browser: &Browser) -> Result<Page> {
        let pages = browser.pages().await?;

        for page in pages.iter() {
            if let Ok(Some(url)) = page.url().await {
                if !url.starts_with("chrome://") {
                    return Ok(page.clone());
                }
            }
        }

        if let Some(page) = pages.last() {
            return Ok(page.clone());
        }

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Other(format!("Failed to create page: {}", e)))
    }

    /// Launch Chrome with auto-detection for CI environments, emulating the
    /// default mobile device
    pub async fn launch_auto() -> Result<Self> {
        let is_ci = std::env::var("CI").is_ok()
            || std::env::var("GITHUB_ACTIONS").is_ok()
            || std::env::var("GITLAB_CI").is_ok()
            || std::env::var("JENKINS_HOME").is_ok()
            || std::env::var("CIRCLECI").is_ok();

        Self::with_device(
            ConnectionMode::Sandboxed {
                chrome_path: None,
                no_sandbox: is_ci, // CI environments typically need --no-sandbox
                headless: is_ci,   // CI environments should run headless
            },
            Some(DeviceProfile::default()),
        )
        .await
    }

    /// Connect to existing Chrome on debug port (advanced mode)
    pub async fn connect_debug_port(port: u16, device: Option<DeviceProfile>) -> Result<Self> {
        Self::with_device(ConnectionMode::DebugPort(port), device).await
    }

    /// Create a desktop session with the specified connection mode
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        Self::with_device(mode, None).await
    }

    /// Create a session emulating the default mobile device
    pub async fn new_mobile(mode: ConnectionMode) -> Result<Self> {
        Self::with_device(mode, Some(DeviceProfile::default())).await
    }

    /// Create a session, optionally emulating `device` on its tab
    pub async fn with_device(mode: ConnectionMode, device: Option<DeviceProfile>) -> Result<Self> {
        let (browser, temp_dir) = match mode {
            ConnectionMode::Sandboxed {
                chrome_path,
                no_sandbox,
                headless,
            } => {
                // Unique profile dir per session so parallel tests stay isolated
                let unique_id = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or_default();
                let temp_dir = std::env::temp_dir().join(format!(
                    "stream-search-{}-{}",
                    std::process::id(),
                    unique_id
                ));
                std::fs::create_dir_all(&temp_dir).map_err(|e| {
                    BrowserError::LaunchFailed(format!("Failed to create temp directory: {}", e))
                })?;

                let mut config = if headless {
                    BrowserConfig::builder()
                } else {
                    BrowserConfig::builder().with_head()
                };

                config = config.user_data_dir(&temp_dir);

                // Linux AppArmor workaround
                if no_sandbox {
                    config = config.arg("--no-sandbox");
                }

                if let Some(path) = chrome_path {
                    config = config.chrome_executable(path);
                } else {
                    match Self::ensure_chrome_installed().await {
                        Ok(path) => {
                            config = config.chrome_executable(path);
                        }
                        Err(e) => {
                            log::warn!("Auto-download failed ({}), trying system Chrome...", e);
                        }
                    }
                }

                let config = config
                    .build()
                    .map_err(|e| BrowserError::LaunchFailed(launch_hint(&e)))?;
                let (browser, mut handler) = Browser::launch(config)
                    .await
                    .map_err(|e| BrowserError::LaunchFailed(launch_hint(&e)))?;

                tokio::spawn(async move {
                    while (handler.next().await).is_some() {
                        // Handle browser events
                    }
                });

                (browser, Some(temp_dir))
            }
            ConnectionMode::DebugPort(port) => {
                let url = format!("http://localhost:{}", port);
                let (browser, mut handler) = Browser::connect(&url).await.map_err(|e| {
                    BrowserError::ConnectionFailed(format!(
                        "Failed to connect to Chrome on port {}. \
                             Make sure Chrome is running with --remote-debugging-port={}: {}",
                        port, port, e
                    ))
                })?;

                tokio::spawn(async move {
                    while (handler.next().await).is_some() {
                        // Handle browser events
                    }
                });

                (browser, None)
            }
        };

        let page = Self::get_active_page(&browser).await?;
        if let Some(profile) = &device {
            profile.apply(&page).await?;
        }

        Ok(Self {
            browser,
            page,
            temp_dir,
            device,
            implicit_wait_ms: AtomicU64::new(0),
        })
    }

    /// The tab this session drives
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Emulated device, if any
    pub fn device(&self) -> Option<&DeviceProfile> {
        self.device.as_ref()
    }

    /// Horizon honoured by direct (non-visibility) lookups
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms.load(Ordering::Relaxed))
    }

    pub fn set_implicit_wait(&self, timeout: Duration) {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.implicit_wait_ms.store(ms, Ordering::Relaxed);
    }

    /// Navigate to a URL and wait for its load event
    pub async fn navigate(&self, url: &str) -> Result<()> {
        use chromiumoxide::cdp::browser_protocol::page::{EventLoadEventFired, NavigateParams};

        // Add https:// if no protocol specified
        let normalized_url = if !url.starts_with("http://")
            && !url.starts_with("https://")
            && !url.starts_with("file://")
            && !url.starts_with("about:")
            && !url.starts_with("data:")
        {
            log::debug!("Normalizing URL: {} -> https://{}", url, url);
            format!("https://{}", url)
        } else {
            url.to_string()
        };

        log::info!("Navigating to {}", normalized_url);

        // Subscribe before navigating so the load event cannot be missed
        let mut loads = self.page.event_listener::<EventLoadEventFired>().await?;

        let params = NavigateParams::builder()
            .url(&normalized_url)
            .build()
            .map_err(|e| {
                BrowserError::NavigationFailed(format!("Invalid URL {}: {}", normalized_url, e))
            })?;

        let response = self.page.execute(params).await.map_err(|e| {
            // "oneshot canceled" means the browser connection is gone
            if e.to_string().contains("oneshot canceled") {
                BrowserError::NavigationFailed(
                    "Browser connection lost. The browser may have been closed or crashed."
                        .to_string(),
                )
            } else {
                BrowserError::NavigationFailed(format!(
                    "Failed to navigate to {}: {}",
                    normalized_url, e
                ))
            }
        })?;

        if let Some(error_text) = response.result.error_text {
            return Err(BrowserError::NavigationFailed(format!(
                "Navigation error: {}",
                error_text
            )));
        }

        match tokio::time::timeout(Duration::from_secs(30), loads.next()).await {
            Ok(Some(_)) => log::debug!("Load event fired for {}", normalized_url),
            Ok(None) => log::warn!("Load event stream closed before {} loaded", normalized_url),
            Err(_) => {
                return Err(BrowserError::NavigationFailed(format!(
                    "Request timed out after 30s waiting for {} to load",
                    normalized_url
                )));
            }
        }

        Ok(())
    }

    /// Get current URL
    pub async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| BrowserError::Other(e.to_string()))?
            .ok_or(BrowserError::NoPage)
    }

    /// Get page title
    pub async fn title(&self) -> Result<String> {
        self.page
            .get_title()
            .await
            .map_err(|e| BrowserError::Other(e.to_string()))?
            .ok_or(BrowserError::NoPage)
    }

    /// Take a PNG screenshot of the current viewport
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(chromiumoxide::page::ScreenshotParams::default())
            .await
            .map_err(|e| BrowserError::Other(format!("Failed to take screenshot: {}", e)))
    }

    /// Take a screenshot and save to file, replacing any existing file.
    /// Missing parent directories are created. Returns the bytes written.
    pub async fn screenshot_to_file(&self, path: &Path) -> Result<Vec<u8>> {
        let screenshot_data = self.screenshot().await?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, &screenshot_data)
            .await
            .map_err(|e| BrowserError::Other(format!("Failed to write screenshot: {}", e)))?;

        Ok(screenshot_data)
    }

    /// Execute arbitrary JavaScript in the page context
    pub async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Other(format!("Script execution failed: {}", e)))?;

        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    /// Check if the browser is still alive and responsive
    pub async fn is_alive(&self) -> bool {
        matches!(
            tokio::time::timeout(Duration::from_secs(2), self.page.url()).await,
            Ok(Ok(_))
        )
    }

    /// Close the browser connection
    pub async fn close(self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::Other(e.to_string()))?;
        Ok(())
    }

    /// Ensure Chrome is installed, downloading if necessary
    async fn ensure_chrome_installed() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| BrowserError::Other("Cannot determine cache directory".to_string()))?
            .join("stream-search-pom")
            .join("chrome");

        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| BrowserError::Other(format!("Failed to create cache dir: {}", e)))?;

        let revision_info_path = cache_dir.join(".downloaded");
        if revision_info_path.exists() {
            if let Some(executable) = Self::find_chrome_in_cache(&cache_dir) {
                return Ok(executable);
            }
        }

        log::info!("Downloading Chrome for Testing (first time only, ~150MB)...");
        let fetcher = BrowserFetcher::new(
            BrowserFetcherOptions::builder()
                .with_path(&cache_dir)
                .build()
                .map_err(|e| BrowserError::Other(format!("Fetcher config failed: {}", e)))?,
        );

        let info = fetcher
            .fetch()
            .await
            .map_err(|e| BrowserError::Other(format!("Chrome download failed: {}", e)))?;

        tokio::fs::write(&revision_info_path, "downloaded")
            .await
            .map_err(|e| BrowserError::Other(format!("Failed to write marker: {}", e)))?;

        log::info!("Chrome downloaded to {}", info.executable_path.display());

        Ok(info.executable_path)
    }

    fn find_chrome_in_cache(cache_dir: &Path) -> Option<PathBuf> {
        [
            "chrome",
            "chrome.exe",
            "Google Chrome.app/Contents/MacOS/Google Chrome",
            "chrome-linux/chrome",
            "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
            "chrome-win/chrome.exe",
        ]
        .iter()
        .map(|p| cache_dir.join(p))
        .find(|p| p.exists())
    }
}

fn launch_hint(e: &dyn std::fmt::Display) -> String {
    format!(
        "{}. \n\n\
         Chrome not found. You can:\n\
         - Install Chrome: https://www.google.com/chrome/\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Or specify path: --chrome-path /path/to/chrome\n\
         - Linux sandbox issue? Try: --no-sandbox",
        e
    )
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        if let Some(temp_dir) = &self.temp_dir {
            if temp_dir.exists() {
                let _ = std::fs::remove_dir_all(temp_dir);
            }
        }
    }
}
