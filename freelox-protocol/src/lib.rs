//! Wire protocol of the FreeAir 100 ventilation appliance.
//!
//! Everything in this crate is pure computation over byte strings: the
//! AES payload cipher, the 48-byte telemetry frame decoder, the command
//! heartbeat encoding and the fixed field table. No I/O happens here,
//! which keeps the decode path safe to run against arbitrary input.

pub mod bits;
pub mod cipher;
pub mod command;
pub mod fields;
pub mod frame;

pub use cipher::{DecryptError, decrypt, encrypt};
pub use command::{CommandEncodeError, DeviceCommand};
pub use fields::{FIELD_TABLE, FieldKind, FieldSpec, field_spec, is_known_field};
pub use frame::{DecodeError, FieldMap, FieldValue, decode};
