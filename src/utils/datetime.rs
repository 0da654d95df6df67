use jiff::Zoned;
use jiff::civil::Date;

/// Layout of the timestamp prefix in the activity log.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time rendered for an activity log line.
pub fn log_timestamp(now: &Zoned) -> String {
    now.strftime(LOG_TIMESTAMP_FORMAT).to_string()
}

/// Local calendar date of today.
pub fn today() -> Date {
    Zoned::now().date()
}

/// `YYYY-MM-DD`, the prefix every log line of that day starts with (after `[`).
pub fn date_prefix(date: Date) -> String {
    date.strftime("%Y-%m-%d").to_string()
}
