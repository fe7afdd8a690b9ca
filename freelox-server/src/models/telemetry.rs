use freelox_protocol::FieldMap;
use serde::Serialize;
use time::OffsetDateTime;

/// Latest decoded state of one device. Replaced wholesale on each
/// successful decode, never merged.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub fields: FieldMap,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}
