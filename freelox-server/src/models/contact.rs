use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Discovery record for a serial that pushed data but is not paired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnknownContact {
    pub serial_no: String,
    #[serde(with = "time::serde::rfc3339")]
    pub first_seen: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    pub contact_count: u64,
}
