use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Field, FieldError};

/// Wire format for `from`/`to` query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Named windows offered by the dashboard date picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    Today,
    Yesterday,
    Last7,
    Last30,
    ThisMonth,
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangePreset::Today => write!(f, "today"),
            RangePreset::Yesterday => write!(f, "yesterday"),
            RangePreset::Last7 => write!(f, "last7"),
            RangePreset::Last30 => write!(f, "last30"),
            RangePreset::ThisMonth => write!(f, "this-month"),
        }
    }
}

impl FromStr for RangePreset {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(RangePreset::Today),
            "yesterday" => Ok(RangePreset::Yesterday),
            "last7" => Ok(RangePreset::Last7),
            "last30" => Ok(RangePreset::Last30),
            "this-month" => Ok(RangePreset::ThisMonth),
            other => Err(FieldError::new(
                Field::DateRange,
                format!("unknown range '{other}'"),
            )),
        }
    }
}

/// An inclusive window of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Window for `preset`, relative to `today`.
    pub fn preset(preset: RangePreset, today: NaiveDate) -> Self {
        let days_back = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);
        match preset {
            RangePreset::Today => Self {
                from: today,
                to: today,
            },
            RangePreset::Yesterday => {
                let day = days_back(1);
                Self { from: day, to: day }
            }
            RangePreset::Last7 => Self {
                from: days_back(6),
                to: today,
            },
            RangePreset::Last30 => Self {
                from: days_back(29),
                to: today,
            },
            RangePreset::ThisMonth => Self {
                from: today.with_day(1).unwrap_or(today),
                to: today,
            },
        }
    }

    /// A user-picked window. `from` must not be after `to`.
    pub fn custom(from: NaiveDate, to: NaiveDate) -> Result<Self, FieldError> {
        if from > to {
            return Err(FieldError::new(
                Field::DateRange,
                format!("start date {from} is after end date {to}"),
            ));
        }
        Ok(Self { from, to })
    }

    /// Parse a custom window from `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self, FieldError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
                FieldError::new(Field::DateRange, format!("'{s}' is not a YYYY-MM-DD date"))
            })
        };
        Self::custom(parse(from)?, parse(to)?)
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.from..=self.to).contains(&date)
    }

    /// `(from, to)` formatted for the usage query string.
    pub fn query_bounds(&self) -> (String, String) {
        (
            self.from.format(DATE_FORMAT).to_string(),
            self.to.format(DATE_FORMAT).to_string(),
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from.format(DATE_FORMAT))
        } else {
            write!(
                f,
                "{} .. {}",
                self.from.format(DATE_FORMAT),
                self.to.format(DATE_FORMAT)
            )
        }
    }
}
