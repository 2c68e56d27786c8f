use calamine::Data;
use calamine::ExcelDateTime;
use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use duckdb::types::TimeUnit;
use duckdb::types::Value;
use std::fmt::Display;

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A scalar read from a source file, keeping the native spreadsheet type.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(Duration),
}

impl CellValue {
    /// Returns true for empty cells.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Converts the value to a DuckDB parameter value.
    pub fn to_sql_value(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(value) => Value::Boolean(*value),
            CellValue::Int(value) => Value::BigInt(*value),
            CellValue::Float(value) => Value::Double(*value),
            CellValue::Text(value) => Value::Text(value.to_owned()),
            CellValue::DateTime(value) => {
                Value::Timestamp(TimeUnit::Microsecond, value.and_utc().timestamp_micros())
            }
            CellValue::Date(value) => Value::Date32(value.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
            CellValue::Time(value) => Value::Time64(TimeUnit::Microsecond, micros_since_midnight(value)),
            CellValue::Duration(value) => Value::Interval {
                months: 0,
                days: value.num_days() as i32,
                nanos: (*value - Duration::days(value.num_days()))
                    .num_nanoseconds()
                    .unwrap_or_default(),
            },
        }
    }

    /// Classifies an Excel serial date the way the sheet displays it:
    /// serials within the first day are times, whole serials are dates.
    fn from_excel_datetime(value: &ExcelDateTime) -> Self {
        if value.is_duration() {
            return value
                .as_duration()
                .map(CellValue::Duration)
                .unwrap_or(CellValue::Float(value.as_f64()));
        }
        let serial = value.as_f64();
        match value.as_datetime() {
            Some(datetime) if serial < 1.0 => CellValue::Time(datetime.time()),
            Some(datetime) if serial.fract() == 0.0 => CellValue::Date(datetime.date()),
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(serial),
        }
    }

    /// Parses ISO 8601 date/time text as found in OpenDocument files.
    fn from_iso_datetime(value: &str) -> Self {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(CellValue::DateTime)
            .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d").map(CellValue::Date))
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S%.f").map(CellValue::Time))
            .unwrap_or_else(|_| CellValue::Text(value.to_owned()))
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(value) => CellValue::Int(*value),
            Data::Float(value) => CellValue::Float(*value),
            Data::String(value) => CellValue::Text(value.to_owned()),
            Data::Bool(value) => CellValue::Bool(*value),
            Data::DateTime(value) => CellValue::from_excel_datetime(value),
            Data::DateTimeIso(value) => CellValue::from_iso_datetime(value),
            Data::DurationIso(value) => CellValue::Text(value.to_owned()),
            // Error cells (#DIV/0!, #N/A, ...) carry no loadable value
            Data::Error(_) | Data::Empty => CellValue::Null,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Text(value) => write!(f, "{value}"),
            CellValue::DateTime(value) => write!(f, "{value}"),
            CellValue::Date(value) => write!(f, "{value}"),
            CellValue::Time(value) => write!(f, "{value}"),
            CellValue::Duration(value) => write!(f, "{value}"),
        }
    }
}

fn micros_since_midnight(time: &NaiveTime) -> i64 {
    let seconds = time.num_seconds_from_midnight() as i64;
    let nanoseconds = time.nanosecond() as i64;
    (seconds * 1_000_000) + (nanoseconds / 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversion() {
        assert_eq!(CellValue::from(&Data::Int(3)), CellValue::Int(3));
        assert_eq!(CellValue::from(&Data::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(CellValue::from(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(CellValue::from(&Data::String("x".to_owned())), CellValue::Text("x".to_owned()));
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Null);
    }

    #[test]
    fn iso_datetime_conversion() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        assert_eq!(CellValue::from_iso_datetime("2021-03-04"), CellValue::Date(date));
        assert_eq!(
            CellValue::from_iso_datetime("2021-03-04T05:06:07"),
            CellValue::DateTime(date.and_hms_opt(5, 6, 7).unwrap())
        );
        assert_eq!(
            CellValue::from_iso_datetime("05:06:07"),
            CellValue::Time(NaiveTime::from_hms_opt(5, 6, 7).unwrap())
        );
        assert_eq!(CellValue::from_iso_datetime("soon"), CellValue::Text("soon".to_owned()));
    }

    #[test]
    fn display_for_headers() {
        assert_eq!(CellValue::Float(2021.0).to_string(), "2021");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Text("Name".to_owned()).to_string(), "Name");
    }

    #[test]
    fn sql_values() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(CellValue::Date(date).to_sql_value(), Value::Date32(1));
        assert_eq!(
            CellValue::Time(NaiveTime::from_hms_opt(0, 0, 1).unwrap()).to_sql_value(),
            Value::Time64(TimeUnit::Microsecond, 1_000_000)
        );
        assert_eq!(
            CellValue::DateTime(date.and_hms_opt(0, 0, 0).unwrap()).to_sql_value(),
            Value::Timestamp(TimeUnit::Microsecond, 86_400_000_000)
        );
        assert_eq!(CellValue::Null.to_sql_value(), Value::Null);
    }
}
