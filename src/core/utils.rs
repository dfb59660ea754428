use chrono::{DateTime, FixedOffset, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn datetime_to_string(datetime: DateTime<FixedOffset>) -> String {
    let offset = FixedOffset::east_opt(7 * 60 * 60).unwrap_or(*datetime.offset()); // +0700
    datetime
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn datetime_to_string_opt(datetime: Option<DateTime<FixedOffset>>) -> Option<String> {
    datetime.map(datetime_to_string)
}

pub fn date_to_string_opt(date: Option<NaiveDate>) -> Option<String> {
    date.map(|x| x.format(DATE_FORMAT).to_string())
}

/// Parse an optional `YYYY-MM-DD` string. Blank strings count as absent.
pub fn parse_date_opt(value: &Option<String>) -> Result<Option<NaiveDate>, chrono::ParseError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(val) => NaiveDate::parse_from_str(val, DATE_FORMAT).map(Some),
    }
}
