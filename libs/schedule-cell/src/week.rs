use chrono::{Datelike, Duration, NaiveDate};

/// Position of `date` in its week, Monday = 0, Sunday = 6.
pub fn day_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// The Monday-to-Sunday week containing `reference`.
pub fn week_window(reference: NaiveDate) -> [NaiveDate; 7] {
    let monday = reference - Duration::days(day_index(reference) as i64);
    std::array::from_fn(|offset| monday + Duration::days(offset as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wednesday_expands_to_its_week() {
        let week = week_window(date(2025, 5, 14));

        assert_eq!(week[0], date(2025, 5, 12));
        assert_eq!(week[0].weekday(), Weekday::Mon);
        assert_eq!(week[2], date(2025, 5, 14));
        assert_eq!(week[6], date(2025, 5, 18));
    }

    #[test]
    fn sunday_is_the_last_day() {
        let sunday = date(2025, 5, 18);
        let week = week_window(sunday);

        assert_eq!(day_index(sunday), 6);
        assert_eq!(week[6], sunday);
        assert_eq!(week[0], date(2025, 5, 12));
    }

    #[test]
    fn crosses_month_boundary() {
        let week = week_window(date(2025, 6, 1));

        assert_eq!(week[0], date(2025, 5, 26));
        assert_eq!(week[6], date(2025, 6, 1));
    }
}
