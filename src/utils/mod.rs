//! Utility modules for common functionality

pub mod fs;
pub mod net;

pub use fs::FileSystemUtils;
pub use net::network_address;
