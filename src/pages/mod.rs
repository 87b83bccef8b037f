//! Page objects

pub mod base;
pub mod home;
pub mod streamer;

pub use base::{BasePage, ClickOutcome};
pub use home::HomePage;
pub use streamer::StreamerPage;
