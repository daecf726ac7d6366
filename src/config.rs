use crate::storage::KvStore;
use crate::util::TimerFormat;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Key names are versioned so a blob-shape change can move to a new key and
/// leave older data readable by older builds.
pub const GLOBAL_SETTINGS_KEY: &str = "global_settings";
pub const CALENDAR_SETTINGS_KEY: &str = "calendar_settings";
pub const DIGIT_SETTINGS_KEY: &str = "number_settings_v3";
pub const CARD_SETTINGS_KEY: &str = "card_settings";
pub const LETTER_SETTINGS_KEY: &str = "letter_settings_v7";

fn load_or_default<T: DeserializeOwned + Default>(kv: &dyn KvStore, key: &str) -> T {
    // Missing or corrupt blobs recover to defaults; never fail session start
    kv.get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn save<T: Serialize>(kv: &mut dyn KvStore, key: &str, value: &T) -> crate::error::Result<()> {
    kv.set(key, &serde_json::to_string(value)?)
}

/// Settings consumed by every discipline uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub lang: Language,
    /// Color scheme name kept for snapshot compatibility; the terminal
    /// renderer has a single scheme.
    pub theme: String,
    #[serde(rename = "countdownSeconds")]
    pub countdown_seconds: u32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            lang: Language::Ja,
            theme: "light".to_string(),
            countdown_seconds: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl GlobalSettings {
    pub fn load(kv: &dyn KvStore) -> Self {
        load_or_default(kv, GLOBAL_SETTINGS_KEY)
    }

    pub fn save(&self, kv: &mut dyn KvStore) -> crate::error::Result<()> {
        save(kv, GLOBAL_SETTINGS_KEY, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum YearMode {
    #[default]
    Western,
    Japanese,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSettings {
    #[serde(rename = "yearMode")]
    pub year_mode: YearMode,
    #[serde(rename = "showNumbers")]
    pub show_numbers: bool,
    /// 0 = week starts on Sunday, 1 = Monday
    #[serde(rename = "startDay")]
    pub start_day: u8,
    #[serde(rename = "timerFormat")]
    pub timer_format: TimerFormat,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            year_mode: YearMode::Western,
            show_numbers: true,
            start_day: 0,
            timer_format: TimerFormat::MinSec,
        }
    }
}

impl CalendarSettings {
    pub fn load(kv: &dyn KvStore) -> Self {
        load_or_default(kv, CALENDAR_SETTINGS_KEY)
    }

    pub fn save(&self, kv: &mut dyn KvStore) -> crate::error::Result<()> {
        save(kv, CALENDAR_SETTINGS_KEY, self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitSettings {
    #[serde(rename = "digitsPerGroup")]
    pub digits_per_group: usize,
    #[serde(rename = "totalDigits")]
    pub total_digits: usize,
    /// Auto-advance interval in seconds; 0 disables the timer
    #[serde(rename = "autoNext")]
    pub auto_next: f64,
}

impl Default for DigitSettings {
    fn default() -> Self {
        Self {
            digits_per_group: 2,
            total_digits: 80,
            auto_next: 0.0,
        }
    }
}

impl DigitSettings {
    pub fn load(kv: &dyn KvStore) -> Self {
        load_or_default(kv, DIGIT_SETTINGS_KEY)
    }

    pub fn save(&self, kv: &mut dyn KvStore) -> crate::error::Result<()> {
        save(kv, DIGIT_SETTINGS_KEY, self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSettings {
    #[serde(rename = "deckCount")]
    pub deck_count: usize,
    #[serde(rename = "cardsPerImage")]
    pub cards_per_image: usize,
    #[serde(rename = "imagesPerView")]
    pub images_per_view: usize,
    #[serde(rename = "autoNext")]
    pub auto_next: f64,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            deck_count: 1,
            cards_per_image: 2,
            images_per_view: 1,
            auto_next: 0.0,
        }
    }
}

impl CardSettings {
    pub fn load(kv: &dyn KvStore) -> Self {
        load_or_default(kv, CARD_SETTINGS_KEY)
    }

    pub fn save(&self, kv: &mut dyn KvStore) -> crate::error::Result<()> {
        save(kv, CARD_SETTINGS_KEY, self)
    }

    /// Cards shown per navigation step.
    pub fn step(&self) -> usize {
        (self.cards_per_image * self.images_per_view).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterPairSettings {
    #[serde(rename = "activeRows")]
    pub active_rows: Vec<String>,
    #[serde(rename = "autoNext")]
    pub auto_next: f64,
    #[serde(rename = "alwaysShowAnswer")]
    pub always_show_answer: bool,
}

impl Default for LetterPairSettings {
    fn default() -> Self {
        Self {
            active_rows: ["あ", "か", "さ", "た", "な", "は"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            auto_next: 0.0,
            always_show_answer: false,
        }
    }
}

impl LetterPairSettings {
    pub fn load(kv: &dyn KvStore) -> Self {
        load_or_default(kv, LETTER_SETTINGS_KEY)
    }

    pub fn save(&self, kv: &mut dyn KvStore) -> crate::error::Result<()> {
        save(kv, LETTER_SETTINGS_KEY, self)
    }
}
