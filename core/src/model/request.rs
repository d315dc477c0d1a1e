use crate::prelude::SelectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Calendar month as offered by the month selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn from_number(number: u32) -> Result<Self, SelectionError> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index as usize).copied())
            .ok_or(SelectionError::MonthOutOfRange(number))
    }

    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Three-letter form used in forecast month titles ("Jan 2024").
    pub fn abbreviation(self) -> &'static str {
        &self.name()[..3]
    }

    pub fn from_abbreviation(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|month| month.abbreviation().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Years the year selector offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange {
    pub years: RangeInclusive<i32>,
}

impl SelectionRange {
    pub fn new(first_year: i32, last_year: i32) -> Self {
        Self {
            years: first_year..=last_year,
        }
    }

    pub fn years(&self) -> Vec<i32> {
        self.years.clone().collect()
    }

    pub fn check_year(&self, year: i32) -> Result<i32, SelectionError> {
        if self.years.contains(&year) {
            Ok(year)
        } else {
            Err(SelectionError::YearOutOfRange {
                year,
                min: *self.years.start(),
                max: *self.years.end(),
            })
        }
    }
}

impl Default for SelectionRange {
    fn default() -> Self {
        Self::new(2024, 2025)
    }
}

/// Current selector values; becomes a [`PredictionRequest`] on confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub year: i32,
    pub month: Month,
}

impl Selection {
    pub fn to_request(self) -> PredictionRequest {
        PredictionRequest {
            year: self.year,
            month: self.month.number(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            year: 2024,
            month: Month::January,
        }
    }
}

/// Body of `POST /predict`. Fields are fixed once the request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    year: i32,
    month: u32,
}

impl PredictionRequest {
    pub fn new(year: i32, month: u32) -> Result<Self, SelectionError> {
        Month::from_number(month)?;
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Full month name; the constructor guarantees the range.
    pub fn month_name(&self) -> &'static str {
        Month::from_number(self.month)
            .map(Month::name)
            .unwrap_or("Unknown")
    }
}
