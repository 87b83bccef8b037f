//! Locator tables, one module per page

pub mod home;
pub mod streamer;
