pub mod artifact;
mod discovery;
mod dispatcher;
mod publisher;
mod registry;
mod transport;

pub use discovery::*;
pub use dispatcher::*;
pub use publisher::*;
pub use registry::*;
pub use transport::*;
