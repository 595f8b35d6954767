//! MP3 player detection

mod detection;

pub use detection::{free_space, Device, DeviceDetector};
