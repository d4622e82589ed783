//! ISO-8601 timestamps with millisecond precision.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;
use std::time::SystemTime;

/// Converts a context wall-clock reading into a UTC timestamp.
pub fn from_system_time(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Renders `2024-01-01T00:00:00.000Z`.
pub fn to_iso(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` helper so exported timestamps always use [`to_iso`].
pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_iso(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_iso_millis() {
        let t = from_system_time(UNIX_EPOCH + Duration::from_millis(1_704_067_200_250));
        assert_eq!(to_iso(&t), "2024-01-01T00:00:00.250Z");
    }
}
