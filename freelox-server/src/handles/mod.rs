mod artifact_handle;
mod command_handle;
mod device_handle;
mod discovery_handle;
mod endpoint_handle;
mod ingress_handle;

pub use artifact_handle::*;
pub use command_handle::*;
pub use device_handle::*;
pub use discovery_handle::*;
pub use endpoint_handle::*;
pub use ingress_handle::*;
