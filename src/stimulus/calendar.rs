use chrono::{Datelike, Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Questions per day-of-week recall session.
pub const DATE_QUESTIONS: usize = 5;
/// Questions per mental-math drill session.
pub const MATH_QUESTIONS: usize = 10;

pub const DAYS_JP: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];
pub const DAYS_JP_LONG: [&str; 7] = [
    "日曜日", "月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日",
];
pub const DAYS_EN: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
pub const DAYS_EN_LONG: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Year range a date is drawn from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    /// Today's year minus 80 up to today's year
    Birthday,
    /// One year either side of today
    Recent,
    /// Competition standard: 1500-2500
    Competition,
}

impl DateRange {
    pub fn year_bounds(self, current_year: i32) -> (i32, i32) {
        match self {
            DateRange::Birthday => (current_year - 80, current_year),
            DateRange::Recent => (current_year - 1, current_year + 1),
            DateRange::Competition => (1500, 2500),
        }
    }
}

/// Draw a uniformly random date: year within the range's bounds, month 1-12,
/// day 1-28. The day cap is a deliberate policy so every drawn (y, m, d) is a
/// valid calendar date.
pub fn random_date_in<R: Rng>(range: DateRange, current_year: i32, rng: &mut R) -> NaiveDate {
    let (start, end) = range.year_bounds(current_year);
    let year = rng.gen_range(start..=end);
    let month = rng.gen_range(1..=12u32);
    let day = rng.gen_range(1..=28u32);
    // Day <= 28 guarantees validity for every month of every year
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()
    })
}

pub fn random_date<R: Rng>(range: DateRange, rng: &mut R) -> NaiveDate {
    random_date_in(range, Local::now().year(), rng)
}

/// The five dates of a day-of-week recall session.
pub fn generate_dates<R: Rng>(range: DateRange, rng: &mut R) -> Vec<NaiveDate> {
    (0..DATE_QUESTIONS).map(|_| random_date(range, rng)).collect()
}

/// Day-of-week index with Sunday = 0, matching the answer keypad.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// One mental-math drill question: the sum of the four terms modulo 7 models
/// the century/month/day table arithmetic of day-of-week calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathQuestion {
    pub n1: u32,
    pub n2: u32,
    pub n3: u32,
    pub n4: u32,
}

impl MathQuestion {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            n1: rng.gen_range(0..=1),
            n2: rng.gen_range(0..=6),
            n3: rng.gen_range(0..=6),
            n4: rng.gen_range(1..=31),
        }
    }

    pub fn answer(&self) -> u32 {
        (self.n1 + self.n2 + self.n3 + self.n4) % 7
    }
}

pub fn generate_math_questions<R: Rng>(rng: &mut R) -> Vec<MathQuestion> {
    (0..MATH_QUESTIONS).map(|_| MathQuestion::random(rng)).collect()
}
