pub mod chrome;
pub mod device;

pub use chrome::{ChromeDriver, ConnectionMode};
pub use device::DeviceProfile;
