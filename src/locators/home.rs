use crate::locator::Locator;

/// Magnifying-glass link that opens the search overlay
pub const SEARCH_ICON: Locator = Locator::xpath("//a[@aria-label='Search']");
pub const SEARCH_INPUT: Locator = Locator::xpath("//input[@type='search']");
/// Autocomplete entries shown while typing
pub const SEARCH_SUGGESTIONS: Locator = Locator::xpath("//a[contains(@class,'tw-link')]");
/// One card per live channel on the results screen
pub const SEARCH_RESULTS_ARTICLES: Locator = Locator::xpath("//article");
pub const SEARCH_RESULTS_IMGS: Locator =
    Locator::xpath("//img[@class='tw-image'][ancestor::article]");
