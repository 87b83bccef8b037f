use crate::locator::Locator;

/// Channel name followed by the category it is streaming, in document order
pub const USERNAME_AND_GAME: Locator =
    Locator::xpath("//p[@title][ancestor::div[@class='Layout-sc-1xcs6mc-0 kFwQBd']]");

/// "Start watching" button on the mature content interstitial
pub const START_WATCHING_BTN: Locator = Locator::xpath(
    "//button[@data-a-target='content-classification-gate-overlay-start-watching-button']",
);
