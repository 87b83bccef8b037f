//! Mobile device emulation profiles

use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::page::Page;

use crate::error::Result;

/// Viewport metrics and user agent applied to a page through the
/// `Emulation` domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub width: i64,
    pub height: i64,
    pub device_scale_factor: f64,
    pub mobile: bool,
    pub user_agent: &'static str,
}

impl DeviceProfile {
    pub const IPHONE_14_PRO_MAX: DeviceProfile = DeviceProfile {
        name: "iPhone 14 Pro Max",
        width: 430,
        height: 932,
        device_scale_factor: 3.0,
        mobile: true,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
                     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 \
                     Mobile/15E148 Safari/604.1",
    };

    /// Look up a built-in profile by its device name (case-insensitive).
    pub fn by_name(name: &str) -> Option<DeviceProfile> {
        [Self::IPHONE_14_PRO_MAX]
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Override metrics and user agent on `page`. Must run before the first
    /// navigation for the site to serve its mobile layout.
    pub async fn apply(&self, page: &Page) -> Result<()> {
        log::info!(
            "Emulating {} ({}x{} @{}x)",
            self.name,
            self.width,
            self.height,
            self.device_scale_factor
        );

        page.execute(SetDeviceMetricsOverrideParams::new(
            self.width,
            self.height,
            self.device_scale_factor,
            self.mobile,
        ))
        .await?;

        page.execute(SetUserAgentOverrideParams::new(self.user_agent))
            .await?;

        Ok(())
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::IPHONE_14_PRO_MAX
    }
}
