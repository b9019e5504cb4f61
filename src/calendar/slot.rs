//! Meeting slot proposal. A slot always starts one hour after the
//! current instant, read as wall clock time in the slot's timezone.
//! Existing calendar events are not consulted so the slot may overlap
//! something already booked.

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Format used for slot timestamps on the wire. There is no offset,
/// the timezone label travels alongside.
pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_TIMEZONE: &str = "UTC";

const LEAD_TIME_HOURS: i64 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(rename = "start_time", with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(rename = "end_time", with = "wall_clock")]
    pub end: NaiveDateTime,
    pub timezone: String,
}

/// Propose a slot of `duration_minutes` starting one hour from now.
pub fn find_slot(duration_minutes: u32, timezone: &str) -> TimeSlot {
    find_slot_from(Utc::now(), duration_minutes, timezone)
}

/// Same as `find_slot` but relative to the instant `now`.
pub fn find_slot_from(now: DateTime<Utc>, duration_minutes: u32, timezone: &str) -> TimeSlot {
    // Offset the instant, not the local reading, so DST changes in
    // between don't shift the start
    let start_instant = now.trunc_subsecs(0) + Duration::hours(LEAD_TIME_HOURS);
    let start = wall_clock_reading(start_instant, timezone);
    let end = start + Duration::minutes(i64::from(duration_minutes));

    TimeSlot {
        start,
        end,
        timezone: timezone.to_string(),
    }
}

fn wall_clock_reading(now: DateTime<Utc>, timezone: &str) -> NaiveDateTime {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).naive_local(),
        Err(_) => {
            tracing::warn!("Unknown timezone '{}', reading the clock in UTC", timezone);
            now.naive_utc()
        }
    }
}

/// Parse a wall clock timestamp as produced by `find_slot`. Fractional
/// seconds and an RFC 3339 offset are tolerated, the offset is
/// dropped and the local reading kept.
pub fn parse_wall_clock(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|e| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.naive_local())
                .map_err(|_| e)
        })
}

pub(crate) mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(super::WALL_CLOCK_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let value = String::deserialize(d)?;
        super::parse_wall_clock(&value).map_err(serde::de::Error::custom)
    }
}
