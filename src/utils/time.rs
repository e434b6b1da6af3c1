use chrono::{Datelike, NaiveDate};

/// Whole years between `date_of_birth` and `today`, birthday not yet reached
/// counting one less.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}
