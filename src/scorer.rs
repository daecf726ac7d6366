use crate::config::CalendarSettings;
use crate::stimulus::calendar::{MathQuestion, DATE_QUESTIONS, MATH_QUESTIONS};
use crate::stimulus::{Card, DateRange, PairQuestion};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Penalty per wrong digit, in milliseconds.
pub const DIGIT_PENALTY_MS: f64 = 5_000.0;
/// Penalty per wrong day-of-week answer.
pub const DAY_PENALTY_MS: f64 = 30_000.0;
/// Penalty per wrong mental-math answer.
pub const MATH_PENALTY_MS: f64 = 5_000.0;

/// One answered day-of-week question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    #[serde(rename = "questionNumber")]
    pub question_number: usize,
    pub date: NaiveDate,
    pub correct: bool,
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

/// Ranking key for history and the best-record table. Calendar sessions rank
/// per date range; the other disciplines rank as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Calendar(DateRange),
    Math,
    Digits,
    Cards,
    Letters,
}

/// One completed session, tagged per discipline. Immutable once built;
/// the commit timestamp is stamped by the record store, not sampled here,
/// so scoring stays a pure function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "discipline", rename_all = "lowercase")]
pub enum SessionRecord {
    Calendar(CalendarRecord),
    Math(MathRecord),
    Digits(DigitRecord),
    Cards(CardRecord),
    Letters(LetterRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub timestamp: i64,
    pub range: DateRange,
    #[serde(rename = "totalTime")]
    pub total_time_ms: f64,
    #[serde(rename = "penaltySeconds")]
    pub penalty_seconds: u32,
    #[serde(rename = "finalScore")]
    pub final_score_ms: f64,
    pub laps: Vec<LapRecord>,
    pub settings: CalendarSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathRecord {
    pub timestamp: i64,
    #[serde(rename = "rawTime")]
    pub raw_time_ms: f64,
    pub correct: usize,
    #[serde(rename = "penalty")]
    pub penalty_ms: f64,
    #[serde(rename = "totalScore")]
    pub total_score_ms: f64,
    #[serde(rename = "avgScore")]
    pub avg_score_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitRecord {
    pub timestamp: i64,
    #[serde(rename = "totalDigits")]
    pub total_digits: usize,
    #[serde(rename = "time")]
    pub time_ms: f64,
    #[serde(rename = "penaltySeconds")]
    pub penalty_seconds: u32,
    #[serde(rename = "finalScore")]
    pub final_score_ms: f64,
    pub correct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub timestamp: i64,
    #[serde(rename = "deckCount")]
    pub deck_count: usize,
    #[serde(rename = "time")]
    pub time_ms: f64,
    pub correct: usize,
    pub mistakes: usize,
    #[serde(rename = "finalScore")]
    pub final_score_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterRecord {
    pub timestamp: i64,
    pub questions: usize,
    pub correct: usize,
    #[serde(rename = "time")]
    pub time_ms: f64,
    #[serde(rename = "finalScore")]
    pub final_score_ms: f64,
}

impl SessionRecord {
    pub fn final_score_ms(&self) -> f64 {
        match self {
            SessionRecord::Calendar(r) => r.final_score_ms,
            SessionRecord::Math(r) => r.total_score_ms,
            SessionRecord::Digits(r) => r.final_score_ms,
            SessionRecord::Cards(r) => r.final_score_ms,
            SessionRecord::Letters(r) => r.final_score_ms,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            SessionRecord::Calendar(r) => Category::Calendar(r.range),
            SessionRecord::Math(_) => Category::Math,
            SessionRecord::Digits(_) => Category::Digits,
            SessionRecord::Cards(_) => Category::Cards,
            SessionRecord::Letters(_) => Category::Letters,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            SessionRecord::Calendar(r) => r.timestamp,
            SessionRecord::Math(r) => r.timestamp,
            SessionRecord::Digits(r) => r.timestamp,
            SessionRecord::Cards(r) => r.timestamp,
            SessionRecord::Letters(r) => r.timestamp,
        }
    }

    pub(crate) fn set_timestamp(&mut self, ts: i64) {
        match self {
            SessionRecord::Calendar(r) => r.timestamp = ts,
            SessionRecord::Math(r) => r.timestamp = ts,
            SessionRecord::Digits(r) => r.timestamp = ts,
            SessionRecord::Cards(r) => r.timestamp = ts,
            SessionRecord::Letters(r) => r.timestamp = ts,
        }
    }
}

/// Per-character comparison up to the longer of the two strings: an early
/// submit leaves trailing positions unmatched and each counts as a mistake.
pub fn score_digits(expected: &str, input: &str, elapsed_ms: f64) -> DigitRecord {
    let expected_chars: Vec<char> = expected.chars().collect();
    let input_chars: Vec<char> = input.chars().collect();
    let len = expected_chars.len().max(input_chars.len());

    let mistakes = (0..len)
        .filter(|&i| expected_chars.get(i) != input_chars.get(i))
        .count();

    let penalty_seconds = (mistakes * 5) as u32;
    DigitRecord {
        timestamp: 0,
        total_digits: expected_chars.len(),
        time_ms: elapsed_ms,
        penalty_seconds,
        final_score_ms: elapsed_ms + mistakes as f64 * DIGIT_PENALTY_MS,
        correct: len - mistakes,
    }
}

/// Per-position comparison over the whole shoe; suit and rank must both
/// match. Cards carry no time penalty, so the final score is the raw time.
pub fn score_cards(shoe: &[Card], recall: &[Card], elapsed_ms: f64, deck_count: usize) -> CardRecord {
    let correct = shoe
        .iter()
        .zip(recall.iter())
        .filter(|(expected, got)| expected == got)
        .count();

    CardRecord {
        timestamp: 0,
        deck_count,
        time_ms: elapsed_ms,
        correct,
        mistakes: shoe.len() - correct,
        final_score_ms: elapsed_ms,
    }
}

/// Five independent day-of-week checks; 30s penalty per wrong answer.
/// The laps already carry per-question correctness and durations.
pub fn score_days(
    laps: Vec<LapRecord>,
    total_time_ms: f64,
    range: DateRange,
    settings: CalendarSettings,
) -> CalendarRecord {
    debug_assert_eq!(laps.len(), DATE_QUESTIONS);
    let mistakes = laps.iter().filter(|l| !l.correct).count();

    CalendarRecord {
        timestamp: 0,
        range,
        total_time_ms,
        penalty_seconds: (mistakes * 30) as u32,
        final_score_ms: total_time_ms + mistakes as f64 * DAY_PENALTY_MS,
        laps,
        settings,
    }
}

/// Ten checks against `(n1+n2+n3+n4) mod 7`; the headline score is the
/// penalty-adjusted time averaged per question.
pub fn score_math(questions: &[MathQuestion], answers: &[u32], elapsed_ms: f64) -> MathRecord {
    debug_assert_eq!(questions.len(), MATH_QUESTIONS);
    let correct = questions
        .iter()
        .zip(answers.iter())
        .filter(|(q, &a)| q.answer() == a)
        .count();

    let mistakes = questions.len() - correct;
    let penalty_ms = mistakes as f64 * MATH_PENALTY_MS;
    let total_score_ms = elapsed_ms + penalty_ms;

    MathRecord {
        timestamp: 0,
        raw_time_ms: elapsed_ms,
        correct,
        penalty_ms,
        total_score_ms,
        avg_score_ms: total_score_ms / questions.len() as f64,
    }
}

/// Exact string equality per question; no time penalty.
pub fn score_letters(questions: &[PairQuestion], answers: &[String], elapsed_ms: f64) -> LetterRecord {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i).map(String::as_str) == Some(q.answer.as_str()))
        .count();

    LetterRecord {
        timestamp: 0,
        questions: questions.len(),
        correct,
        time_ms: elapsed_ms,
        final_score_ms: elapsed_ms,
    }
}
