//! Mobile search flow: query → suggestion → result → channel page
//!
//! The scenario searches for a game, checks the first suggestion, opens the
//! last live channel in the results and verifies that the channel page
//! shows the streamer and category read off the result card.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::artifact::{self, ScreenshotInfo, END_RESULT_SCREENSHOT};
use crate::browser::ChromeDriver;
use crate::error::{BrowserError, Result};
use crate::pages::home::MOBILE_URL;
use crate::pages::HomePage;
use crate::wait::DEFAULT_ACTION_TIMEOUT;

/// Inputs for a [`SearchScenario`] run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Home page to start from
    pub base_url: String,

    pub query: String,

    /// Text the chosen suggestion must carry
    pub expected_suggestion: String,

    pub suggestion_index: usize,

    /// Pause after typing so suggestions can render
    pub suggestion_settle_ms: u64,

    /// Pause after opening a channel for its dynamic content
    pub destination_settle_ms: u64,

    /// Pause before the final screenshot
    pub screenshot_settle_ms: u64,

    /// How long to look for the mature content gate
    pub mature_gate_probe_ms: u64,

    pub screenshot_path: PathBuf,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            base_url: MOBILE_URL.to_string(),
            query: "StarCraft II".to_string(),
            expected_suggestion: "StarCraft II".to_string(),
            suggestion_index: 0,
            suggestion_settle_ms: 1_000,
            destination_settle_ms: 2_000,
            screenshot_settle_ms: 4_000,
            mature_gate_probe_ms: 1_000,
            screenshot_path: PathBuf::from(END_RESULT_SCREENSHOT),
        }
    }
}

impl ScenarioConfig {
    /// Load a config from a JSON file; missing fields keep their defaults
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: ScenarioConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }
        if self.query.trim().is_empty() {
            anyhow::bail!("query cannot be empty");
        }
        if self.screenshot_path.as_os_str().is_empty() {
            anyhow::bail!("screenshot_path cannot be empty");
        }
        Ok(())
    }
}

/// What a successful run observed
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// ISO 8601 timestamp of the start of the run
    pub started_at: String,
    pub elapsed_ms: u64,
    pub base_url: String,
    pub query: String,
    pub suggestion: String,
    pub result_count: usize,

    /// Streamer name read from the chosen result card
    pub streamer: String,

    /// Category read from the chosen result card
    pub category: String,

    pub destination_username: String,
    pub destination_game: String,
    pub mature_gate_dismissed: bool,
    pub screenshot: ScreenshotInfo,
}

pub struct SearchScenario {
    config: ScenarioConfig,
}

impl SearchScenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub async fn run(&self, driver: &ChromeDriver) -> Result<ScenarioReport> {
        let config = &self.config;
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();

        let home = HomePage::with_base_url(driver, config.base_url.as_str());
        home.open().await?;
        home.open_search().await?;
        home.enter_query(&config.query).await?;
        tokio::time::sleep(Duration::from_millis(config.suggestion_settle_ms)).await;

        let suggestions = home.list_suggestions().await?;
        let first = suggestions
            .first()
            .ok_or(BrowserError::IndexOutOfRange { index: 0, len: 0 })?;
        let suggestion = home.base().read_text(first, DEFAULT_ACTION_TIMEOUT).await?;
        if suggestion.trim() != config.expected_suggestion {
            return Err(BrowserError::AssertionFailed(format!(
                "first suggestion was {:?}, expected {:?}",
                suggestion.trim(),
                config.expected_suggestion
            )));
        }

        home.choose_suggestion(config.suggestion_index).await?;
        let results = home.list_results().await?;
        log::info!("{} result(s) for {:?}", results.len(), config.query);

        let second = results.get(1).ok_or(BrowserError::IndexOutOfRange {
            index: 1,
            len: results.len(),
        })?;
        home.base()
            .scroll_into_view(second, DEFAULT_ACTION_TIMEOUT)
            .await?;
        let chosen = results.last().ok_or(BrowserError::IndexOutOfRange {
            index: 0,
            len: 0,
        })?;
        home.base()
            .scroll_into_view(chosen, DEFAULT_ACTION_TIMEOUT)
            .await?;

        // Card lines: title, streamer, category, LIVE, viewer count
        let card = home.base().read_text(chosen, DEFAULT_ACTION_TIMEOUT).await?;
        let lines = card_lines(&card);
        let (streamer, category) = match (lines.get(1), lines.get(2)) {
            (Some(streamer), Some(category)) => (streamer.to_string(), category.to_string()),
            _ => {
                return Err(BrowserError::IndexOutOfRange {
                    index: 2,
                    len: lines.len(),
                })
            }
        };
        log::info!("Opening {} ({})", streamer, category);

        let channel = home.open_result(chosen).await?;
        tokio::time::sleep(Duration::from_millis(config.destination_settle_ms)).await;

        let mature_gate_dismissed = if channel
            .has_mature_content_gate(Duration::from_millis(config.mature_gate_probe_ms))
            .await?
        {
            channel.dismiss_mature_content_gate().await?;
            true
        } else {
            false
        };

        let (username, game) = channel.username_and_game().await?;
        let destination_username = channel
            .base()
            .read_text(&username, DEFAULT_ACTION_TIMEOUT)
            .await?;
        let destination_game = channel
            .base()
            .read_text(&game, DEFAULT_ACTION_TIMEOUT)
            .await?;

        if !destination_matches(&destination_username, &destination_game, &streamer, &category) {
            return Err(BrowserError::AssertionFailed(format!(
                "channel page shows {:?} / {:?}, result card showed {:?} / {:?}",
                destination_username, destination_game, streamer, category
            )));
        }

        tokio::time::sleep(Duration::from_millis(config.screenshot_settle_ms)).await;
        let screenshot = artifact::capture_screenshot(driver, &config.screenshot_path).await?;

        Ok(ScenarioReport {
            started_at,
            elapsed_ms: elapsed_ms(start.elapsed()),
            base_url: config.base_url.clone(),
            query: config.query.clone(),
            suggestion: suggestion.trim().to_string(),
            result_count: results.len(),
            streamer,
            category,
            destination_username,
            destination_game,
            mature_gate_dismissed,
            screenshot,
        })
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Non-empty, trimmed lines of a rendered card.
pub fn card_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// The channel page's username must appear within the card's streamer line
/// and the card's category within the page's game, ignoring case.
pub fn destination_matches(username: &str, game: &str, streamer: &str, category: &str) -> bool {
    let username = username.trim().to_lowercase();
    let game = game.trim().to_lowercase();
    !username.is_empty()
        && streamer.to_lowercase().contains(&username)
        && game.contains(&category.trim().to_lowercase())
}
