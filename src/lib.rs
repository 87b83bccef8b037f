pub mod artifact;
pub mod browser;
pub mod error;
pub mod locator;
pub mod locators;
pub mod pages;
pub mod scenario;
pub mod wait;

//  Re-export commonly used items
pub use artifact::{capture_screenshot, ScreenshotInfo, END_RESULT_SCREENSHOT};
pub use browser::chrome::{ChromeDriver, ConnectionMode};
pub use browser::device::DeviceProfile;
pub use error::{BrowserError, LookupError};
pub use locator::{By, Locator, Target};
pub use pages::{BasePage, ClickOutcome, HomePage, StreamerPage};
pub use scenario::{ScenarioConfig, ScenarioReport, SearchScenario};
