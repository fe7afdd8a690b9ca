mod contact;
mod device;
mod endpoint;
mod telemetry;

pub use contact::*;
pub use device::*;
pub use endpoint::*;
pub use telemetry::*;
