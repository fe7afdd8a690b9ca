pub mod settings;
pub mod storage;

pub use settings::{Auth, Bridge, Settings, Store};
pub use storage::Storage;
