pub mod clock;
pub mod config;
pub mod daemon;
pub mod device;
pub mod lap;
pub mod reader;
pub mod serial;
pub mod testing;

pub use config::DaemonConfig;
pub use device::ConnectionState;
pub use reader::LapReader;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
