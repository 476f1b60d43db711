use chrono::{Datelike, NaiveDate};

/// Storage form of a calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO week label such as `2026-W09`. Weeks start on Monday.
pub fn iso_week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_week_uses_iso_year() {
        // 2026-01-01 is a Thursday, so it belongs to 2026-W01
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(iso_week_key(d), "2026-W01");
        // 2027-01-01 is a Friday, still in 2026-W53
        let d = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(iso_week_key(d), "2026-W53");
    }

    #[test]
    fn sunday_closes_the_week() {
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(iso_week_key(sunday), "2026-W10");
        assert_eq!(iso_week_key(monday), "2026-W11");
        assert_eq!(date_key(sunday), "2026-03-08");
    }
}
