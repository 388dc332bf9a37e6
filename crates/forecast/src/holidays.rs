//! Country-holiday calendars folded into the forecaster's seasonal terms.

use chrono::{Datelike, NaiveDate, Weekday};

use harbinger_core::config::HolidayCalendar;

/// Returns true if `date` is a holiday in the given calendar.
#[must_use]
pub fn is_holiday(calendar: HolidayCalendar, date: NaiveDate) -> bool {
    match calendar {
        HolidayCalendar::Us => is_us_holiday(date),
    }
}

/// US market holidays with deterministic rules. Good Friday is omitted
/// because it requires an Easter computation and moves the needle little for
/// a residual-mean adjustment.
fn is_us_holiday(date: NaiveDate) -> bool {
    let (month, day) = (date.month(), date.day());
    match month {
        1 => day == 1 || nth_weekday_of_month(date, Weekday::Mon, 3),
        2 => nth_weekday_of_month(date, Weekday::Mon, 3),
        5 => last_weekday_of_month(date, Weekday::Mon),
        6 => day == 19,
        7 => day == 4,
        9 => nth_weekday_of_month(date, Weekday::Mon, 1),
        11 => nth_weekday_of_month(date, Weekday::Thu, 4),
        12 => day == 25,
        _ => false,
    }
}

fn nth_weekday_of_month(date: NaiveDate, weekday: Weekday, n: u32) -> bool {
    date.weekday() == weekday && (date.day() - 1) / 7 + 1 == n
}

fn last_weekday_of_month(date: NaiveDate, weekday: Weekday) -> bool {
    let next_week = date.checked_add_days(chrono::Days::new(7));
    date.weekday() == weekday && next_week.map(|d| d.month()) != Some(date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fixed_date_holidays_are_detected() {
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 1, 1)));
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 7, 4)));
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 6, 19)));
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 12, 25)));
    }

    #[test]
    fn floating_holidays_are_detected() {
        // MLK: third Monday of January 2024.
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 1, 15)));
        // Presidents: third Monday of February 2024.
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 2, 19)));
        // Memorial: last Monday of May 2024.
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 5, 27)));
        // Labor: first Monday of September 2024.
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 9, 2)));
        // Thanksgiving: fourth Thursday of November 2024.
        assert!(is_holiday(HolidayCalendar::Us, date(2024, 11, 28)));
    }

    #[test]
    fn ordinary_trading_days_are_not_holidays() {
        assert!(!is_holiday(HolidayCalendar::Us, date(2024, 3, 14)));
        assert!(!is_holiday(HolidayCalendar::Us, date(2024, 1, 8))); // second Monday
        assert!(!is_holiday(HolidayCalendar::Us, date(2024, 5, 20))); // not last Monday
        assert!(!is_holiday(HolidayCalendar::Us, date(2024, 11, 21))); // third Thursday
    }
}
