use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, Month, OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    let utc = time.to_offset(UtcOffset::UTC);
    let datetime_utc = DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), utc.nanosecond())?;
    Some(tz.from_utc_datetime(&datetime_utc.naive_utc()))
}

/// Calendar date of `time` as seen in `tz`; falls back to the UTC date when
/// the instant is outside chrono's range.
pub fn localized_date(time: OffsetDateTime, tz: Tz) -> Date {
    let utc_date = time.to_offset(UtcOffset::UTC).date();
    let Some(localized) = localized_datetime(time, tz) else {
        return utc_date;
    };

    let month = u8::try_from(localized.month())
        .ok()
        .and_then(|month| Month::try_from(month).ok());
    let day = u8::try_from(localized.day()).ok();

    match (month, day) {
        (Some(month), Some(day)) => {
            Date::from_calendar_date(localized.year(), month, day).unwrap_or(utc_date)
        }
        _ => utc_date,
    }
}
