use crate::error::{Error, Result};
use crate::storage::KvStore;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static LETTERS_DIR: Dir = include_dir!("src/letters");

/// Storage key for user answer-word overrides. The version suffix allows a
/// future shape change without destroying older data.
pub const MASTER_OVERRIDES_KEY: &str = "letter_master_custom_v6";

pub const KANA_ROWS: [&str; 10] = ["あ", "か", "さ", "た", "な", "は", "ま", "や", "ら", "わ"];

type RowMap = BTreeMap<String, BTreeMap<String, String>>;

/// The pair → association-word table: a built-in default base with user
/// overrides merged on top, per individual pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterPairMaster {
    rows: RowMap,
}

impl LetterPairMaster {
    /// The built-in table embedded in the binary.
    pub fn builtin() -> Self {
        let file = LETTERS_DIR
            .get_file("default_master.json")
            .expect("default master table missing from binary");
        let text = file
            .contents_utf8()
            .expect("default master table is not utf-8");
        let rows = serde_json::from_str(text).expect("default master table is not valid json");
        Self { rows }
    }

    /// Built-in base merged with persisted user overrides. A corrupt
    /// overrides blob falls back to the plain built-in table.
    pub fn load(kv: &dyn KvStore) -> Self {
        let mut master = Self::builtin();
        if let Some(raw) = kv.get(MASTER_OVERRIDES_KEY) {
            if let Ok(overrides) = serde_json::from_str::<RowMap>(&raw) {
                for (row, pairs) in overrides {
                    let base = master.rows.entry(row).or_default();
                    // Per-pair precedence: untouched built-in pairs survive
                    for (pair, word) in pairs {
                        base.insert(pair, word);
                    }
                }
            }
        }
        master
    }

    pub fn answer(&self, row: &str, pair: &str) -> Option<&str> {
        self.rows.get(row)?.get(pair).map(String::as_str)
    }

    pub fn row(&self, row: &str) -> Option<&BTreeMap<String, String>> {
        self.rows.get(row)
    }

    /// Record a user override for one pair and persist it. Also updates this
    /// in-memory view so the running session sees the edit immediately.
    pub fn set_answer(
        &mut self,
        kv: &mut dyn KvStore,
        row: &str,
        pair: &str,
        word: &str,
    ) -> Result<()> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(());
        }

        self.rows
            .entry(row.to_string())
            .or_default()
            .insert(pair.to_string(), word.to_string());

        let mut overrides: RowMap = kv
            .get(MASTER_OVERRIDES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        overrides
            .entry(row.to_string())
            .or_default()
            .insert(pair.to_string(), word.to_string());
        kv.set(MASTER_OVERRIDES_KEY, &serde_json::to_string(&overrides)?)
    }
}

/// One letter-pair question as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairQuestion {
    pub row: String,
    pub pair: String,
    pub answer: String,
}

/// Full cross-product of the active rows' pairs, shuffled. Every pair is
/// used; the session is sized by the selection, not truncated.
pub fn build_questions<R: Rng>(
    active_rows: &[String],
    master: &LetterPairMaster,
    rng: &mut R,
) -> Result<Vec<PairQuestion>> {
    let mut pool: Vec<PairQuestion> = Vec::new();
    for row in active_rows {
        if let Some(pairs) = master.row(row) {
            for (pair, answer) in pairs {
                pool.push(PairQuestion {
                    row: row.clone(),
                    pair: pair.clone(),
                    answer: answer.clone(),
                });
            }
        }
    }
    if pool.is_empty() {
        return Err(Error::EmptySelection);
    }
    pool.shuffle(rng);
    Ok(pool)
}
