//! Duration strings such as `5s`, `1m30s`, `250ms` or `-2h`.
//!
//! The format is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix, optionally preceded by a sign.
//! Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. The bare
//! literal `0` is also accepted. Values are signed: a negative interval
//! parses fine and is rejected later by whoever needs a positive one.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SEC: i128 = 1_000_000_000;

const MAX_NANOS: i128 = i64::MAX as i128;

/// Longest fraction we keep; further digits are below nanosecond precision.
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// A signed duration with nanosecond resolution, bounded to ±(2^63 - 1) ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigDuration {
    nanos: i128,
}

impl ConfigDuration {
    pub const ZERO: Self = Self { nanos: 0 };

    pub fn parse(input: &str) -> Result<Self, String> {
        let invalid = || format!("invalid duration '{input}'");
        let overflow = || format!("duration '{input}' is out of range");

        let mut s = input;
        let mut negative = false;
        if let Some(rest) = s.strip_prefix('-') {
            negative = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('+') {
            s = rest;
        }

        if s == "0" {
            return Ok(Self::ZERO);
        }
        if s.is_empty() {
            return Err(invalid());
        }

        let mut total: i128 = 0;
        while !s.is_empty() {
            let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
            let (int_part, rest) = s.split_at(int_len);

            let (frac_part, rest) = match rest.strip_prefix('.') {
                Some(after) => {
                    let frac_len = after.bytes().take_while(u8::is_ascii_digit).count();
                    after.split_at(frac_len)
                }
                None => ("", rest),
            };
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(invalid());
            }

            let unit_len = rest
                .find(|c: char| c == '.' || c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (unit, rest) = rest.split_at(unit_len);
            if unit.is_empty() {
                return Err(format!("missing unit in duration '{input}'"));
            }
            let scale = unit_nanos(unit)
                .ok_or_else(|| format!("unknown unit '{unit}' in duration '{input}'"))?;

            let whole: i128 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| overflow())?
            };
            let mut value = whole
                .checked_mul(scale)
                .filter(|v| *v <= MAX_NANOS)
                .ok_or_else(overflow)?;

            if !frac_part.is_empty() {
                let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
                let fraction: i128 = digits.parse().map_err(|_| invalid())?;
                let divisor = digits.bytes().fold(1_i128, |acc, _| acc * 10);
                let nanos = fraction.checked_mul(scale).ok_or_else(overflow)? / divisor;
                value = value.checked_add(nanos).ok_or_else(overflow)?;
            }

            total = total.checked_add(value).ok_or_else(overflow)?;
            if total > MAX_NANOS {
                return Err(overflow());
            }
            s = rest;
        }

        Ok(Self {
            nanos: if negative { -total } else { total },
        })
    }

    #[must_use]
    pub const fn as_nanos(self) -> i128 {
        self.nanos
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.nanos > 0
    }

    /// The equivalent [`Duration`], or `None` when zero or negative.
    #[must_use]
    pub fn to_std(self) -> Option<Duration> {
        if !self.is_positive() {
            return None;
        }
        u64::try_from(self.nanos).ok().map(Duration::from_nanos)
    }
}

impl FromStr for ConfigDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConfigDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos < 0 {
            write!(f, "-")?;
        }
        let abs = self.nanos.unsigned_abs();
        let nanos_per_sec = NANOS_PER_SEC.unsigned_abs();
        if abs % nanos_per_sec == 0 {
            write!(f, "{}s", abs / nanos_per_sec)
        } else if abs % NANOS_PER_MILLI.unsigned_abs() == 0 {
            write!(f, "{}ms", abs / NANOS_PER_MILLI.unsigned_abs())
        } else {
            write!(f, "{abs}ns")
        }
    }
}
