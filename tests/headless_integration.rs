// End-to-end session flows driven through the library API with a manual
// clock and seeded rng, committed into an in-memory store.

use rand::rngs::StdRng;
use rand::SeedableRng;

use mnemo::clock::ManualClock;
use mnemo::config::{CalendarSettings, CardSettings, DigitSettings, Language, LetterPairSettings};
use mnemo::records::RecordStore;
use mnemo::scorer::{Category, SessionRecord};
use mnemo::session::{Exercise, Phase, Session, SessionConfig, Stimulus};
use mnemo::stimulus::calendar::weekday_index;
use mnemo::stimulus::{DateRange, LetterPairMaster, TrainingMode};
use mnemo::storage::MemoryKvStore;

const TICK_MS: f64 = 100.0;

fn config(exercise: Exercise, mode: TrainingMode) -> SessionConfig {
    SessionConfig {
        exercise,
        mode,
        lang: Language::Ja,
        countdown_seconds: 3,
        calendar: CalendarSettings::default(),
        digits: DigitSettings {
            total_digits: 6,
            digits_per_group: 2,
            auto_next: 0.0,
        },
        cards: CardSettings::default(),
        letters: LetterPairSettings::default(),
        master: LetterPairMaster::builtin(),
    }
}

fn session(exercise: Exercise, mode: TrainingMode, seed: u64) -> (Session, ManualClock) {
    let clock = ManualClock::new();
    let session = Session::new(
        config(exercise, mode),
        StdRng::seed_from_u64(seed),
        Box::new(clock.clone()),
    )
    .unwrap();
    (session, clock)
}

fn tick(session: &mut Session, clock: &ManualClock, n: usize) {
    for _ in 0..n {
        clock.advance_ms(TICK_MS);
        session.on_tick();
    }
}

/// 3 s countdown plus the 1 s START! hold.
fn skip_countdown(session: &mut Session, clock: &ManualClock) {
    session.start();
    tick(session, clock, 41);
    assert_ne!(session.phase, Phase::Countdown);
}

#[test]
fn digit_session_commits_a_clean_run() {
    let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory, 11);
    skip_countdown(&mut session, &clock);
    assert_eq!(session.phase, Phase::Presenting);
    assert_eq!(session.item_count(), 3);

    let raw = match &session.stimulus {
        Stimulus::Digits { raw, .. } => raw.clone(),
        other => panic!("unexpected stimulus {other:?}"),
    };
    assert_eq!(raw.len(), 6);

    session.next_item();
    session.next_item();
    session.next_item();
    assert_eq!(session.phase, Phase::Recalling);

    tick(&mut session, &clock, 25); // 2.5 s of recall time
    for c in raw.chars() {
        session.type_char(c);
    }
    session.submit_recall();
    assert_eq!(session.phase, Phase::Scored);

    let record = session.take_record().unwrap();
    let SessionRecord::Digits(ref digits) = record else {
        panic!("wrong discipline");
    };
    assert_eq!(digits.total_digits, 6);
    assert_eq!(digits.correct, 6);
    assert_eq!(digits.penalty_seconds, 0);
    assert_eq!(digits.final_score_ms, digits.time_ms);

    let mut kv = MemoryKvStore::new();
    let outcome = RecordStore::new(&mut kv).commit(record).unwrap();
    assert!(outcome.is_new_best);
    let store = RecordStore::new(&mut kv);
    assert_eq!(store.history(Category::Digits).len(), 1);
    assert!(store.best(Category::Digits).is_some());
}

#[test]
fn card_session_scores_raw_time_without_penalty() {
    let (mut session, clock) = session(Exercise::Cards, TrainingMode::Memory, 5);
    skip_countdown(&mut session, &clock);
    assert_eq!(session.item_count(), 26);

    let shoe = match &session.stimulus {
        Stimulus::Cards(shoe) => shoe.clone(),
        other => panic!("unexpected stimulus {other:?}"),
    };
    assert_eq!(shoe.len(), 52);

    while session.phase == Phase::Presenting {
        tick(&mut session, &clock, 1);
        session.next_item();
    }
    assert_eq!(session.phase, Phase::Recalling);

    // recall the first half correctly, then one swap
    for card in &shoe[..10] {
        session.push_card(*card);
    }
    session.push_card(shoe[11]);
    session.push_card(shoe[10]);
    session.submit_recall();

    let record = session.take_record().unwrap();
    let SessionRecord::Cards(ref cards) = record else {
        panic!("wrong discipline");
    };
    assert_eq!(cards.correct, 10);
    assert_eq!(cards.mistakes, 42);
    // no time penalty for cards
    assert_eq!(cards.final_score_ms, cards.time_ms);
}

#[test]
fn day_quiz_applies_the_thirty_second_penalty() {
    let (mut session, clock) = session(
        Exercise::Days(DateRange::Competition),
        TrainingMode::Memory,
        21,
    );
    skip_countdown(&mut session, &clock);
    // quiz exercises go straight to recall
    assert_eq!(session.phase, Phase::Recalling);
    assert_eq!(session.item_count(), 5);

    let dates = match &session.stimulus {
        Stimulus::Dates(dates) => dates.clone(),
        other => panic!("unexpected stimulus {other:?}"),
    };

    for (i, date) in dates.iter().enumerate() {
        let right = weekday_index(*date);
        let answer = if i == 2 { (right + 1) % 7 } else { right };
        tick(&mut session, &clock, 2);
        session.answer_day(answer);
        assert!(session.feedback.is_some());
        tick(&mut session, &clock, 4); // let the flash expire
    }
    assert_eq!(session.phase, Phase::Scored);

    let record = session.take_record().unwrap();
    let SessionRecord::Calendar(ref cal) = record else {
        panic!("wrong discipline");
    };
    assert_eq!(cal.laps.len(), 5);
    assert_eq!(cal.laps.iter().filter(|l| l.correct).count(), 4);
    assert_eq!(cal.penalty_seconds, 30);
    assert_eq!(cal.final_score_ms, cal.total_time_ms + 30_000.0);
    assert_eq!(cal.range, DateRange::Competition);
}

#[test]
fn math_drill_ranks_by_total_score() {
    let (mut session, clock) = session(Exercise::Math, TrainingMode::Memory, 9);
    skip_countdown(&mut session, &clock);
    assert_eq!(session.item_count(), 10);

    let questions = match &session.stimulus {
        Stimulus::Math(questions) => questions.clone(),
        other => panic!("unexpected stimulus {other:?}"),
    };

    for q in &questions {
        tick(&mut session, &clock, 1);
        session.answer_math(q.answer());
        tick(&mut session, &clock, 4);
    }
    assert_eq!(session.phase, Phase::Scored);

    let record = session.take_record().unwrap();
    let SessionRecord::Math(ref math) = record else {
        panic!("wrong discipline");
    };
    assert_eq!(math.correct, 10);
    assert_eq!(math.penalty_ms, 0.0);
    assert_eq!(math.total_score_ms, math.raw_time_ms);
    assert!((math.avg_score_ms - math.total_score_ms / 10.0).abs() < 1e-9);

    let mut kv = MemoryKvStore::new();
    let outcome = RecordStore::new(&mut kv).commit(record).unwrap();
    assert!(outcome.is_new_best);
    assert_eq!(RecordStore::new(&mut kv).math_ranking().len(), 1);
}

#[test]
fn letter_quiz_scores_exact_answers() {
    let (mut session, clock) = session(Exercise::Letters, TrainingMode::Memory, 17);
    skip_countdown(&mut session, &clock);
    assert_eq!(session.phase, Phase::Recalling);
    // six active rows, five pairs each
    assert_eq!(session.item_count(), 30);

    let questions = match &session.stimulus {
        Stimulus::Letters(questions) => questions.clone(),
        other => panic!("unexpected stimulus {other:?}"),
    };

    for (i, q) in questions.iter().enumerate() {
        for c in q.answer.chars() {
            session.type_char(c);
        }
        if i == 0 {
            // second thoughts on the first word, retype it
            session.backspace();
            if let Some(last) = q.answer.chars().last() {
                session.type_char(last);
            }
        }
        session.submit_word();
        tick(&mut session, &clock, 4);
    }
    assert_eq!(session.phase, Phase::Scored);

    let record = session.take_record().unwrap();
    let SessionRecord::Letters(ref letters) = record else {
        panic!("wrong discipline");
    };
    assert_eq!(letters.questions, 30);
    assert_eq!(letters.correct, 30);
    assert_eq!(letters.final_score_ms, letters.time_ms);
}

#[test]
fn conversion_mode_loops_without_scoring() {
    let (mut session, clock) = session(Exercise::Digits, TrainingMode::Conversion, 2);
    skip_countdown(&mut session, &clock);
    assert_eq!(session.phase, Phase::Presenting);

    for _ in 0..10 {
        tick(&mut session, &clock, 1);
        session.next_item();
    }
    // went past the end at least once, still presenting a fresh sequence
    assert_eq!(session.phase, Phase::Presenting);
    assert!(session.take_record().is_none());
}

#[test]
fn best_record_only_improves_on_strictly_lower_scores() {
    let mut kv = MemoryKvStore::new();
    let mut outcomes = vec![];
    for seed in [1u64, 2, 3] {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory, seed);
        skip_countdown(&mut session, &clock);
        let raw = match &session.stimulus {
            Stimulus::Digits { raw, .. } => raw.clone(),
            other => panic!("unexpected stimulus {other:?}"),
        };
        session.next_item();
        session.next_item();
        session.next_item();
        // slower on each run: 1 s, then 2 s, then 3 s
        tick(&mut session, &clock, 10 * seed as usize);
        for c in raw.chars() {
            session.type_char(c);
        }
        session.submit_recall();
        let record = session.take_record().unwrap();
        outcomes.push(RecordStore::new(&mut kv).commit(record).unwrap());
    }
    assert!(outcomes[0].is_new_best);
    assert!(!outcomes[1].is_new_best);
    assert!(!outcomes[2].is_new_best);
    assert_eq!(RecordStore::new(&mut kv).history(Category::Digits).len(), 3);
}
