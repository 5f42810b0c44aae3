//! Conversion of API server timestamps.

use jiff::Timestamp;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

/// Converts an object metadata timestamp, `None` when jiff cannot represent it.
pub fn to_timestamp(time: &Time) -> Option<Timestamp> {
    let nanos = i32::try_from(time.0.timestamp_subsec_nanos()).ok()?;
    Timestamp::new(time.0.timestamp(), nanos).ok()
}
