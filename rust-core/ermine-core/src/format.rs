//! Display helpers for views: plurals, French number and price formatting,
//! dates, and random passwords.

use chrono::NaiveDate;
use rand::Rng;

const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890&#@$%*!?";

/// `plural` when `count > 1`, `singular` otherwise
#[must_use]
pub fn plural<'a>(count: i64, singular: &'a str, plural: &'a str) -> &'a str {
    if count > 1 {
        plural
    } else {
        singular
    }
}

/// `1234.567` → `"1 234,57"` with two decimals
///
/// Thousands are grouped with a space, decimals separated by a comma.
#[must_use]
pub fn number_formatted(number: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, number.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    let negative = number < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}

/// [`number_formatted`] with two decimals and a `€` suffix
#[must_use]
pub fn price_formatted(price: f64) -> String {
    format!("{}€", number_formatted(price, 2))
}

/// `YYYY-MM-DD[ ...]` → `DD/MM/YYYY`; `None` when it is not a date
#[must_use]
pub fn date_formatted(date: &str) -> Option<String> {
    let day = date.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}

/// Random password of `length` characters from letters, digits and `&#@$%*!?`
#[must_use]
pub fn random_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())]))
        .collect()
}
