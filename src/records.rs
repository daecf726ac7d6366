use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::scorer::{CalendarRecord, Category, MathRecord, SessionRecord};
use crate::storage::KvStore;
use crate::stimulus::DateRange;
use std::collections::BTreeMap;
use std::fs::OpenOptions;

pub const CALENDAR_HISTORY_KEY: &str = "calendar_history";
pub const CALENDAR_BEST_KEY: &str = "calendar_records";
pub const MATH_RANKING_KEY: &str = "calendar_math_records_v2";
/// Digit history has always lived under this key; there is no `number_history`.
pub const DIGIT_HISTORY_KEY: &str = "number_records";
pub const DIGIT_BEST_KEY: &str = "number_best";
pub const CARD_HISTORY_KEY: &str = "card_history";
pub const CARD_BEST_KEY: &str = "card_best";
pub const LETTER_HISTORY_KEY: &str = "letter_history";
pub const LETTER_BEST_KEY: &str = "letter_best";

pub const HISTORY_CAP: usize = 100;
pub const MATH_RANKING_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    pub is_new_best: bool,
}

/// Persists finished sessions: bounded per-discipline history, one best
/// record per category, and the mental-math top-50 ranking.
pub struct RecordStore<'a> {
    kv: &'a mut dyn KvStore,
}

impl<'a> RecordStore<'a> {
    pub fn new(kv: &'a mut dyn KvStore) -> Self {
        Self { kv }
    }

    /// Stamp the record with the current wall-clock time and commit it.
    pub fn commit(&mut self, record: SessionRecord) -> Result<CommitOutcome> {
        self.commit_at(record, chrono::Utc::now().timestamp_millis())
    }

    pub fn commit_at(&mut self, mut record: SessionRecord, ts: i64) -> Result<CommitOutcome> {
        record.set_timestamp(ts);
        let outcome = if let SessionRecord::Math(math) = &record {
            self.rank_math(math.clone())?
        } else {
            let better = self.push_history(&record)?;
            if better {
                self.store_best(&record)?;
            }
            CommitOutcome { is_new_best: better }
        };
        self.append_log(&record);
        Ok(outcome)
    }

    /// Newest-first session history for a category. Calendar history is shared
    /// across date ranges, matching the persisted layout; math "history" is
    /// its ranking.
    pub fn history(&self, category: Category) -> Vec<SessionRecord> {
        match category {
            Category::Math => self.math_ranking().into_iter().map(SessionRecord::Math).collect(),
            _ => read_list(self.kv, history_key(category)),
        }
    }

    pub fn best(&self, category: Category) -> Option<SessionRecord> {
        match category {
            Category::Calendar(range) => self
                .calendar_bests()
                .remove(range_key(range))
                .map(SessionRecord::Calendar),
            Category::Math => self.math_ranking().into_iter().next().map(SessionRecord::Math),
            _ => {
                let raw = self.kv.get(best_key(category)?)?;
                serde_json::from_str(&raw).ok()
            }
        }
    }

    /// The math ranking, ascending by total score, at most 50 entries.
    pub fn math_ranking(&self) -> Vec<MathRecord> {
        self.kv
            .get(MATH_RANKING_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn calendar_bests(&self) -> BTreeMap<String, CalendarRecord> {
        self.kv
            .get(CALENDAR_BEST_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Prepend to history, evicting the oldest past the cap. Returns whether
    /// the record beats the stored best (strictly lower, or no prior best).
    fn push_history(&mut self, record: &SessionRecord) -> Result<bool> {
        let key = history_key(record.category());
        let mut list = read_list(self.kv, key);
        list.insert(0, record.clone());
        list.truncate(HISTORY_CAP);
        self.kv.set(key, &serde_json::to_string(&list)?)?;

        let better = match self.best(record.category()) {
            Some(best) => record.final_score_ms() < best.final_score_ms(),
            None => true,
        };
        Ok(better)
    }

    fn store_best(&mut self, record: &SessionRecord) -> Result<()> {
        match record {
            SessionRecord::Calendar(cal) => {
                let mut bests = self.calendar_bests();
                bests.insert(range_key(cal.range).to_string(), cal.clone());
                self.kv.set(CALENDAR_BEST_KEY, &serde_json::to_string(&bests)?)
            }
            other => match best_key(other.category()) {
                Some(key) => self.kv.set(key, &serde_json::to_string(other)?),
                None => Ok(()),
            },
        }
    }

    /// Insert into the ascending top-50; a fresh personal best is exactly a
    /// record that sorts to rank 0. Ties keep the older entry ahead.
    fn rank_math(&mut self, record: MathRecord) -> Result<CommitOutcome> {
        let mut ranking = self.math_ranking();
        let rank = ranking
            .iter()
            .position(|r| record.total_score_ms < r.total_score_ms)
            .unwrap_or(ranking.len());
        ranking.insert(rank, record);
        ranking.truncate(MATH_RANKING_CAP);
        self.kv.set(MATH_RANKING_KEY, &serde_json::to_string(&ranking)?)?;
        Ok(CommitOutcome { is_new_best: rank == 0 })
    }

    /// Best-effort append to the flat CSV log; failures never surface.
    fn append_log(&self, record: &SessionRecord) {
        let Some(dir) = AppDirs::log_dir() else { return };
        if std::fs::create_dir_all(&dir).is_err() {
            return;
        }
        let path = dir.join("log.csv");
        let Ok(file) = OpenOptions::new().append(true).create(true).open(path) else {
            return;
        };
        let mut wtr = csv::Writer::from_writer(file);
        let _ = wtr.write_record([
            record.timestamp().to_string(),
            discipline_label(record).to_string(),
            format!("{:.0}", record.final_score_ms()),
        ]);
        let _ = wtr.flush();
    }
}

fn history_key(category: Category) -> &'static str {
    match category {
        Category::Calendar(_) => CALENDAR_HISTORY_KEY,
        Category::Math => MATH_RANKING_KEY,
        Category::Digits => DIGIT_HISTORY_KEY,
        Category::Cards => CARD_HISTORY_KEY,
        Category::Letters => LETTER_HISTORY_KEY,
    }
}

fn best_key(category: Category) -> Option<&'static str> {
    match category {
        Category::Digits => Some(DIGIT_BEST_KEY),
        Category::Cards => Some(CARD_BEST_KEY),
        Category::Letters => Some(LETTER_BEST_KEY),
        Category::Calendar(_) | Category::Math => None,
    }
}

fn range_key(range: DateRange) -> &'static str {
    match range {
        DateRange::Birthday => "birthday",
        DateRange::Recent => "recent",
        DateRange::Competition => "competition",
    }
}

fn discipline_label(record: &SessionRecord) -> &'static str {
    match record {
        SessionRecord::Calendar(_) => "calendar",
        SessionRecord::Math(_) => "math",
        SessionRecord::Digits(_) => "digits",
        SessionRecord::Cards(_) => "cards",
        SessionRecord::Letters(_) => "letters",
    }
}

fn read_list(kv: &dyn KvStore, key: &str) -> Vec<SessionRecord> {
    kv.get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}
