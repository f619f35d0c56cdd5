//! Human-readable rendering of large numbers, percentages and durations.

use crate::curve::Amount;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use rust_decimal::Decimal;

/// Values below this render as plain grouped digits.
pub const BIGNUM_THRESHOLD: u64 = 10_000_000;

const NUM_NAMES: [&str; 20] = [
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
    "sextillion",
    "septillion",
    "octillion",
    "nonillion",
    "decillion",
    "undecillion",
    "duodecillion",
    "tredecillion",
    "quattuordecillion",
    "quindecillion",
    "sexdecillion",
    "septendecillion",
    "octodecillion",
    "novemdecillion",
    "vigintillion",
];

/// Format an integer with `,` thousands separators.
pub fn grouped(n: &BigInt) -> String {
    let digits = n.magnitude().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n.is_negative() {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Scaled short form of a big integer.
///
/// Below [`BIGNUM_THRESHOLD`] the digits are grouped (`9,999,999`). Up to
/// vigintillion the value is scaled to a named power of a thousand with
/// exactly `places` truncated fractional digits (`10.000 million`). Past that
/// it falls back to scientific notation (`1.000e+120`).
pub fn bignum(n: &BigInt, places: u32) -> String {
    let neg = if n.is_negative() { "-" } else { "" };
    let abs = n.abs();
    if abs < BigInt::from(BIGNUM_THRESHOLD) {
        return grouped(n);
    }
    let exp = abs.to_string().len() as u32 - 1;
    let mag = exp / 3;
    let index = (mag - 2) as usize;
    if index < NUM_NAMES.len() {
        let scaled = scaled_digits(&abs, 3 * mag, places);
        format!("{neg}{scaled} {}", NUM_NAMES[index])
    } else {
        let scaled = scaled_digits(&abs, exp, places);
        format!("{neg}{scaled}e+{exp}")
    }
}

/// Render an [`Amount`], using `Infinity` for the unbounded sentinel.
pub fn amount(a: &Amount, places: u32) -> String {
    match a {
        Amount::Finite(n) => bignum(n, places),
        Amount::Unbounded => "Infinity".to_string(),
    }
}

/// `n / 10^shift`, truncated to `places` fractional digits.
fn scaled_digits(n: &BigInt, shift: u32, places: u32) -> String {
    let ten = BigInt::from(10u32);
    let truncated = if shift >= places {
        n / ten.pow(shift - places)
    } else {
        n * ten.pow(places - shift)
    };
    if places == 0 {
        return truncated.to_string();
    }
    let (int_part, frac) = truncated.div_rem(&ten.pow(places));
    format!(
        "{int_part}.{:0>width$}",
        frac.to_string(),
        width = places as usize
    )
}

/// Probability as a percentage with one decimal, dropping a trailing `.0`.
pub fn percent(p: Decimal) -> String {
    let pct = (p * Decimal::ONE_HUNDRED).round_dp(1);
    format!("{}%", pct.normalize())
}

/// Compact duration such as `2d 3h 0m 5s`, largest unit first.
///
/// Zero-valued units above seconds are omitted unless a larger unit is
/// present; years are rendered through [`bignum`].
pub fn time_str(seconds: &BigInt, places: u32) -> String {
    let secs = if seconds.is_negative() {
        BigInt::zero()
    } else {
        seconds.clone()
    };
    let minute = BigInt::from(60u32);
    let hour = BigInt::from(3_600u32);
    let day = BigInt::from(86_400u32);
    let year = BigInt::from(31_536_000u32);

    let y = &secs / &year;
    let d = (&secs / &day) % 365u32;
    let h = (&secs / &hour) % 24u32;
    let m = (&secs / &minute) % 60u32;
    let s = &secs % 60u32;

    let mut parts = vec![format!("{s}s")];
    if m > BigInt::zero() {
        parts.push(format!("{m}m"));
    }
    if h > BigInt::zero() {
        parts.push(format!("{h}h"));
    }
    if d > BigInt::zero() {
        parts.push(format!("{d}d"));
    }
    if y > BigInt::zero() {
        let mut label = bignum(&y, places);
        if !label.ends_with(|c: char| c.is_ascii_digit()) {
            label.push(' ');
        } else if y >= BigInt::from(BIGNUM_THRESHOLD) {
            // scientific labels end in a digit but still need separation
            label.push(' ');
        }
        parts.push(format!("{label}yr"));
    }
    parts.reverse();
    parts.join(" ")
}

/// Seconds rounded up, for cooldown messages.
pub fn ceil_secs(d: std::time::Duration) -> BigInt {
    let whole = d.as_secs();
    let ceil = if d.subsec_nanos() > 0 { whole + 1 } else { whole };
    BigInt::from(ceil)
}

const ROMAN_C: [&str; 10] = ["", "C", "CC", "CCC", "CD", "D", "DC", "DCC", "DCCC", "CM"];
const ROMAN_X: [&str; 10] = ["", "X", "XX", "XXX", "XL", "L", "LX", "LXX", "LXXX", "XC"];
const ROMAN_I: [&str; 10] = ["", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"];

/// Roman numeral tier label. Zero is empty, 1000 and above stay decimal.
pub fn roman(n: u64) -> String {
    match n {
        0 => String::new(),
        1..=999 => {
            let h = ROMAN_C[(n / 100) as usize];
            let t = ROMAN_X[((n % 100) / 10) as usize];
            let o = ROMAN_I[(n % 10) as usize];
            format!("{h}{t}{o}")
        }
        _ => n.to_string(),
    }
}

/// Ordinal suffix for ranks (`1st`, `12th`, `23rd`).
pub fn num_suffix(n: u64) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
