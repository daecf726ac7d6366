use chrono::{Datelike, NaiveDate};

/// How elapsed times are rendered on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TimerFormat {
    #[default]
    #[serde(rename = "mm:ss")]
    MinSec,
    #[serde(rename = "ss")]
    SecOnly,
}

/// Format milliseconds as `m:ss.ss` or `ss.ss秒`.
pub fn format_ms(ms: f64, format: TimerFormat) -> String {
    let total_secs = ms / 1000.0;
    match format {
        TimerFormat::SecOnly => format!("{total_secs:.2}秒"),
        TimerFormat::MinSec => {
            let m = (total_secs / 60.0).floor() as u64;
            let s = total_secs % 60.0;
            format!("{m}:{s:05.2}")
        }
    }
}

/// Japanese era label for a date (令和/平成/昭和/大正/明治), falling back to
/// the plain western year before 1868. Year 1 of an era renders as 元年.
pub fn japanese_era(date: NaiveDate) -> String {
    let year = date.year();
    let full = year * 10000 + date.month() as i32 * 100 + date.day() as i32;

    let era = |name: &str, first_year: i32| {
        let n = year - first_year + 1;
        if n == 1 {
            format!("{name}元年")
        } else {
            format!("{name}{n}年")
        }
    };

    if full >= 20190501 {
        era("令和", 2019)
    } else if full >= 19890108 {
        era("平成", 1989)
    } else if full >= 19261225 {
        era("昭和", 1926)
    } else if full >= 19120730 {
        era("大正", 1912)
    } else if full >= 18680125 {
        era("明治", 1868)
    } else {
        format!("{year}年")
    }
}
