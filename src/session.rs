use crate::clock::Clock;
use crate::config::{CalendarSettings, CardSettings, DigitSettings, Language, LetterPairSettings};
use crate::error::{Error, Result};
use crate::scorer::{
    score_cards, score_days, score_digits, score_letters, score_math, LapRecord, SessionRecord,
};
use crate::stimulus::calendar::{
    generate_dates, generate_math_questions, weekday_index, DAYS_EN_LONG, DAYS_JP_LONG,
};
use crate::stimulus::cards::generate_shoe;
use crate::stimulus::digits::{endless_group, generate_digits, group_digits};
use crate::stimulus::letter_pairs::build_questions;
use crate::stimulus::{Card, DateRange, Discipline, LetterPairMaster, MathQuestion, PairQuestion, TrainingMode};
use crate::runtime::TICK_RATE_MS;
use chrono::NaiveDate;
use rand::rngs::StdRng;

/// How long the per-question correct/wrong flash stays on screen.
pub const FEEDBACK_MS: f64 = 300.0;

/// What a session trains. Calendar splits into two exercises sharing its
/// settings: day-of-week recall and the mod-7 mental-math drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exercise {
    Days(DateRange),
    Math,
    Digits,
    Cards,
    Letters,
}

impl Exercise {
    pub fn discipline(self) -> Discipline {
        match self {
            Exercise::Days(_) | Exercise::Math => Discipline::Calendar,
            Exercise::Digits => Discipline::Digits,
            Exercise::Cards => Discipline::Cards,
            Exercise::Letters => Discipline::Letters,
        }
    }

    /// Quiz exercises answer one question at a time with inline feedback and
    /// skip the separate presentation phase.
    fn is_quiz(self) -> bool {
        matches!(self, Exercise::Days(_) | Exercise::Math | Exercise::Letters)
    }
}

/// Immutable per-session configuration, snapshotted at start.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub exercise: Exercise,
    pub mode: TrainingMode,
    pub lang: Language,
    pub countdown_seconds: u32,
    pub calendar: CalendarSettings,
    pub digits: DigitSettings,
    pub cards: CardSettings,
    pub letters: LetterPairSettings,
    pub master: LetterPairMaster,
}

impl SessionConfig {
    fn day_names(&self) -> &'static [&'static str; 7] {
        match self.lang {
            Language::Ja => &DAYS_JP_LONG,
            Language::En => &DAYS_EN_LONG,
        }
    }

    fn auto_next_secs(&self) -> f64 {
        match self.exercise {
            Exercise::Digits => self.digits.auto_next,
            Exercise::Cards => self.cards.auto_next,
            Exercise::Letters => self.letters.auto_next,
            Exercise::Days(_) | Exercise::Math => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown,
    Presenting,
    Recalling,
    Scored,
}

#[derive(Debug, Clone)]
pub enum Stimulus {
    Dates(Vec<NaiveDate>),
    Math(Vec<MathQuestion>),
    Digits { raw: String, groups: Vec<String> },
    Cards(Vec<Card>),
    Letters(Vec<PairQuestion>),
}

impl Stimulus {
    fn generate(config: &SessionConfig, rng: &mut StdRng) -> Result<Self> {
        match config.exercise {
            Exercise::Days(range) => Ok(Stimulus::Dates(generate_dates(range, rng))),
            Exercise::Math => Ok(Stimulus::Math(generate_math_questions(rng))),
            Exercise::Digits => {
                // A persisted blob can carry a zero size the CLI would clamp
                if config.digits.total_digits == 0 {
                    return Err(Error::EmptySelection);
                }
                if config.mode == TrainingMode::Conversion {
                    // The endless drill shows one fresh group at a time
                    let group = endless_group(config.digits.digits_per_group, rng);
                    return Ok(Stimulus::Digits {
                        raw: group.clone(),
                        groups: vec![group],
                    });
                }
                let raw = generate_digits(config.digits.total_digits, rng);
                let groups = group_digits(&raw, config.digits.digits_per_group);
                Ok(Stimulus::Digits { raw, groups })
            }
            Exercise::Cards => {
                if config.cards.deck_count == 0 {
                    return Err(Error::EmptySelection);
                }
                Ok(Stimulus::Cards(generate_shoe(config.cards.deck_count, rng)))
            }
            Exercise::Letters => Ok(Stimulus::Letters(build_questions(
                &config.letters.active_rows,
                &config.master,
                rng,
            )?)),
        }
    }

    /// Number of presentation steps (digit groups, card views, quiz items).
    fn item_count(&self, config: &SessionConfig) -> usize {
        match self {
            Stimulus::Dates(d) => d.len(),
            Stimulus::Math(q) => q.len(),
            Stimulus::Digits { groups, .. } => groups.len(),
            Stimulus::Cards(shoe) => shoe.len().div_ceil(config.cards.step()),
            Stimulus::Letters(q) => q.len(),
        }
    }
}

/// Per-question flash shown after a quiz answer. While active, further
/// answers are ignored; expiry advances to the next question.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub correct: bool,
    pub expected: String,
    pub remaining_ms: f64,
}

/// One training attempt, driven by fixed-rate `on_tick` calls and discrete
/// user actions. Out-of-phase actions are silent no-ops.
pub struct Session {
    pub config: SessionConfig,
    pub phase: Phase,
    pub stimulus: Stimulus,
    pub index: usize,
    pub countdown_remaining_ms: f64,
    pub started_at: Option<f64>,
    pub ended_at: Option<f64>,
    pub feedback: Option<Feedback>,
    pub digit_input: String,
    pub card_input: Vec<Card>,
    pub word_input: String,
    pub laps: Vec<LapRecord>,
    pub math_answers: Vec<u32>,
    pub word_answers: Vec<String>,
    auto_next_acc_ms: f64,
    question_started_at: f64,
    record: Option<SessionRecord>,
    clock: Box<dyn Clock>,
    rng: StdRng,
}

impl Session {
    /// Builds the session and generates its first stimulus sequence. Fails
    /// up front on an empty candidate pool, before any phase runs.
    pub fn new(config: SessionConfig, mut rng: StdRng, clock: Box<dyn Clock>) -> Result<Self> {
        let stimulus = Stimulus::generate(&config, &mut rng)?;
        Ok(Self {
            config,
            phase: Phase::Idle,
            stimulus,
            index: 0,
            countdown_remaining_ms: 0.0,
            started_at: None,
            ended_at: None,
            feedback: None,
            digit_input: String::new(),
            card_input: vec![],
            word_input: String::new(),
            laps: vec![],
            math_answers: vec![],
            word_answers: vec![],
            auto_next_acc_ms: 0.0,
            question_started_at: 0.0,
            record: None,
            clock,
            rng,
        })
    }

    /// Idle → Countdown.
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        self.countdown_remaining_ms = self.config.countdown_seconds as f64 * 1000.0;
        self.phase = Phase::Countdown;
    }

    /// Scored → Countdown with a freshly generated sequence.
    pub fn retry(&mut self) -> Result<()> {
        if self.phase != Phase::Scored {
            return Ok(());
        }
        self.stimulus = Stimulus::generate(&self.config, &mut self.rng)?;
        self.reset_attempt();
        self.countdown_remaining_ms = self.config.countdown_seconds as f64 * 1000.0;
        self.phase = Phase::Countdown;
        Ok(())
    }

    /// Returns to Idle from any phase, cancelling pending timer state.
    pub fn exit(&mut self) {
        self.reset_attempt();
        self.phase = Phase::Idle;
    }

    /// Countdown display: the remaining whole second, then the start marker.
    pub fn countdown_label(&self) -> String {
        if self.countdown_remaining_ms > 0.0 {
            format!("{}", (self.countdown_remaining_ms / 1000.0).ceil() as u32)
        } else {
            "START!".to_string()
        }
    }

    /// Fixed-rate driver, called every `TICK_RATE_MS`.
    pub fn on_tick(&mut self) {
        let tick_ms = TICK_RATE_MS as f64;
        match self.phase {
            Phase::Countdown => {
                self.countdown_remaining_ms -= tick_ms;
                // The start marker holds for one full second before play
                if self.countdown_remaining_ms <= -1000.0 {
                    self.begin();
                }
            }
            Phase::Presenting => {
                let auto_next = self.config.auto_next_secs();
                if auto_next > 0.0 {
                    self.auto_next_acc_ms += tick_ms;
                    if self.auto_next_acc_ms >= auto_next * 1000.0 {
                        self.next_item();
                    }
                }
            }
            Phase::Recalling => {
                if let Some(feedback) = &mut self.feedback {
                    feedback.remaining_ms -= tick_ms;
                    if feedback.remaining_ms <= 0.0 {
                        self.feedback = None;
                        self.advance_question();
                    }
                }
            }
            Phase::Idle | Phase::Scored => {}
        }
    }

    /// Elapsed play time in milliseconds, live until the end is captured.
    pub fn elapsed_ms(&self) -> f64 {
        match self.started_at {
            Some(start) => self.ended_at.unwrap_or_else(|| self.clock.now_ms()) - start,
            None => 0.0,
        }
    }

    pub fn item_count(&self) -> usize {
        self.stimulus.item_count(&self.config)
    }

    /// Consumes the finished record for committing. `None` until Scored.
    pub fn take_record(&mut self) -> Option<SessionRecord> {
        self.record.take()
    }

    // --- presentation navigation ---

    pub fn next_item(&mut self) {
        if self.phase != Phase::Presenting {
            return;
        }
        self.auto_next_acc_ms = 0.0;
        if self.index + 1 < self.item_count() {
            self.index += 1;
            return;
        }
        match self.config.mode {
            // Conversion drills loop forever over fresh material
            TrainingMode::Conversion => {
                if let Ok(next) = Stimulus::generate(&self.config, &mut self.rng) {
                    self.stimulus = next;
                }
                self.index = 0;
            }
            TrainingMode::Memory => self.enter_recall(),
        }
    }

    pub fn prev_item(&mut self) {
        if self.phase != Phase::Presenting {
            return;
        }
        self.auto_next_acc_ms = 0.0;
        self.index = self.index.saturating_sub(1);
    }

    pub fn first_item(&mut self) {
        if self.phase != Phase::Presenting {
            return;
        }
        self.auto_next_acc_ms = 0.0;
        self.index = 0;
    }

    // --- recall input ---

    pub fn type_char(&mut self, c: char) {
        if self.phase != Phase::Recalling || self.feedback.is_some() {
            return;
        }
        match self.config.exercise {
            Exercise::Digits if c.is_ascii_digit() => self.digit_input.push(c),
            Exercise::Letters => self.word_input.push(c),
            _ => {}
        }
    }

    /// Undoes the last entered unit: a digit, a card, or a word character.
    pub fn backspace(&mut self) {
        if self.phase != Phase::Recalling || self.feedback.is_some() {
            return;
        }
        match self.config.exercise {
            Exercise::Digits => {
                self.digit_input.pop();
            }
            Exercise::Cards => {
                self.card_input.pop();
            }
            Exercise::Letters => {
                self.word_input.pop();
            }
            Exercise::Days(_) | Exercise::Math => {}
        }
    }

    pub fn push_card(&mut self, card: Card) {
        if self.phase != Phase::Recalling || self.config.exercise != Exercise::Cards {
            return;
        }
        self.card_input.push(card);
    }

    /// Day-of-week answer, Sunday = 0. One lap per question.
    pub fn answer_day(&mut self, day: usize) {
        if self.phase != Phase::Recalling || self.feedback.is_some() || day > 6 {
            return;
        }
        let Stimulus::Dates(dates) = &self.stimulus else { return };
        let Some(&date) = dates.get(self.index) else { return };

        let now = self.clock.now_ms();
        let expected = weekday_index(date);
        let correct = day == expected;
        let names = self.config.day_names();
        self.laps.push(LapRecord {
            question_number: self.index + 1,
            date,
            correct,
            duration_ms: now - self.question_started_at,
            user_answer: names[day].to_string(),
            correct_answer: names[expected].to_string(),
        });
        self.flash(correct, names[expected].to_string(), now);
    }

    /// Mental-math answer, 0..=6.
    pub fn answer_math(&mut self, value: u32) {
        if self.phase != Phase::Recalling || self.feedback.is_some() || value > 6 {
            return;
        }
        let Stimulus::Math(questions) = &self.stimulus else { return };
        let Some(question) = questions.get(self.index) else { return };

        let now = self.clock.now_ms();
        let correct = question.answer() == value;
        self.math_answers.push(value);
        self.flash(correct, question.answer().to_string(), now);
    }

    /// Letter-pair answer: submits the typed word for the current question.
    pub fn submit_word(&mut self) {
        if self.phase != Phase::Recalling || self.feedback.is_some() {
            return;
        }
        let Stimulus::Letters(questions) = &self.stimulus else { return };
        let Some(question) = questions.get(self.index) else { return };

        let now = self.clock.now_ms();
        let word = std::mem::take(&mut self.word_input);
        let correct = word == question.answer;
        let expected = question.answer.clone();
        self.word_answers.push(word);
        self.flash(correct, expected, now);
    }

    /// Whole-sequence submit for digits and cards.
    pub fn submit_recall(&mut self) {
        if self.phase != Phase::Recalling {
            return;
        }
        match self.config.exercise {
            Exercise::Digits | Exercise::Cards => self.finish(self.clock.now_ms()),
            // Quiz exercises finish through their last feedback instead
            Exercise::Days(_) | Exercise::Math | Exercise::Letters => {}
        }
    }

    // --- internals ---

    fn begin(&mut self) {
        let now = self.clock.now_ms();
        self.started_at = Some(now);
        self.question_started_at = now;
        self.index = 0;
        self.auto_next_acc_ms = 0.0;
        self.phase = if self.config.mode == TrainingMode::Memory && self.config.exercise.is_quiz() {
            Phase::Recalling
        } else {
            Phase::Presenting
        };
    }

    fn enter_recall(&mut self) {
        self.phase = Phase::Recalling;
        self.index = 0;
    }

    /// Starts the post-answer flash. The last answer also fixes the end time
    /// and the score; the phase flips to Scored once the flash expires.
    fn flash(&mut self, correct: bool, expected: String, now: f64) {
        if self.answered() == self.item_count() {
            self.finish(now);
        }
        self.feedback = Some(Feedback {
            correct,
            expected,
            remaining_ms: FEEDBACK_MS,
        });
    }

    fn answered(&self) -> usize {
        match self.config.exercise {
            Exercise::Days(_) => self.laps.len(),
            Exercise::Math => self.math_answers.len(),
            Exercise::Letters => self.word_answers.len(),
            Exercise::Digits | Exercise::Cards => 0,
        }
    }

    fn advance_question(&mut self) {
        if self.phase != Phase::Recalling {
            return;
        }
        if self.record.is_some() {
            self.phase = Phase::Scored;
            return;
        }
        self.index += 1;
        self.question_started_at = self.clock.now_ms();
    }

    fn finish(&mut self, now: f64) {
        self.ended_at = Some(now);
        let elapsed = now - self.started_at.unwrap_or(now);
        let record = match (&self.stimulus, self.config.exercise) {
            (Stimulus::Digits { raw, .. }, _) => {
                SessionRecord::Digits(score_digits(raw, &self.digit_input, elapsed))
            }
            (Stimulus::Cards(shoe), _) => SessionRecord::Cards(score_cards(
                shoe,
                &self.card_input,
                elapsed,
                self.config.cards.deck_count,
            )),
            (Stimulus::Dates(_), Exercise::Days(range)) => SessionRecord::Calendar(score_days(
                self.laps.clone(),
                elapsed,
                range,
                self.config.calendar.clone(),
            )),
            (Stimulus::Math(questions), _) => {
                SessionRecord::Math(score_math(questions, &self.math_answers, elapsed))
            }
            (Stimulus::Letters(questions), _) => {
                SessionRecord::Letters(score_letters(questions, &self.word_answers, elapsed))
            }
            // Stimulus and exercise are built from the same config
            (Stimulus::Dates(_), _) => return,
        };
        self.record = Some(record);
        if self.config.exercise.is_quiz() {
            // Stay in Recalling until the last flash expires
        } else {
            self.phase = Phase::Scored;
        }
    }

    fn reset_attempt(&mut self) {
        self.index = 0;
        self.countdown_remaining_ms = 0.0;
        self.started_at = None;
        self.ended_at = None;
        self.feedback = None;
        self.digit_input.clear();
        self.card_input.clear();
        self.word_input.clear();
        self.laps.clear();
        self.math_answers.clear();
        self.word_answers.clear();
        self.auto_next_acc_ms = 0.0;
        self.question_started_at = 0.0;
        self.record = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::scorer::DAY_PENALTY_MS;
    use crate::stimulus::{Rank, Suit};
    use rand::SeedableRng;

    fn config(exercise: Exercise, mode: TrainingMode) -> SessionConfig {
        SessionConfig {
            exercise,
            mode,
            lang: Language::Ja,
            countdown_seconds: 3,
            calendar: CalendarSettings::default(),
            digits: DigitSettings {
                total_digits: 4,
                digits_per_group: 2,
                auto_next: 0.0,
            },
            cards: CardSettings::default(),
            letters: LetterPairSettings::default(),
            master: LetterPairMaster::builtin(),
        }
    }

    fn session(exercise: Exercise, mode: TrainingMode) -> (Session, ManualClock) {
        let clock = ManualClock::new();
        let session = Session::new(
            config(exercise, mode),
            StdRng::seed_from_u64(42),
            Box::new(clock.clone()),
        )
        .unwrap();
        (session, clock)
    }

    /// Steps ticks and the clock together, like the event loop does.
    fn run_ticks(session: &mut Session, clock: &ManualClock, n: usize) {
        for _ in 0..n {
            clock.advance_ms(TICK_RATE_MS as f64);
            session.on_tick();
        }
    }

    fn ticks_per_sec() -> usize {
        (1000 / TICK_RATE_MS) as usize
    }

    fn start_and_skip_countdown(session: &mut Session, clock: &ManualClock) {
        session.start();
        // 3s countdown + 1s holding the start marker
        run_ticks(session, clock, 4 * ticks_per_sec() + 1);
    }

    #[test]
    fn countdown_counts_down_to_start_marker() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory);
        session.start();
        assert_eq!(session.phase, Phase::Countdown);
        assert_eq!(session.countdown_label(), "3");

        run_ticks(&mut session, &clock, ticks_per_sec());
        assert_eq!(session.countdown_label(), "2");
        run_ticks(&mut session, &clock, 2 * ticks_per_sec());
        assert_eq!(session.countdown_label(), "START!");
        assert_eq!(session.phase, Phase::Countdown);

        run_ticks(&mut session, &clock, ticks_per_sec() + 1);
        assert_eq!(session.phase, Phase::Presenting);
        assert!(session.started_at.is_some());
    }

    #[test]
    fn digits_full_lifecycle_scores_on_submit() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);

        let Stimulus::Digits { raw, groups } = session.stimulus.clone() else {
            panic!("wrong stimulus")
        };
        assert_eq!(raw.len(), 4);
        assert_eq!(groups.len(), 2);

        // Walk past the last group into recall
        session.next_item();
        assert_eq!(session.index, 1);
        session.next_item();
        assert_eq!(session.phase, Phase::Recalling);

        clock.advance_ms(5_000.0);
        for c in raw.chars() {
            session.type_char(c);
        }
        session.submit_recall();

        assert_eq!(session.phase, Phase::Scored);
        let record = session.take_record().unwrap();
        assert_eq!(record.final_score_ms(), 5_000.0);
        assert!(session.take_record().is_none());
    }

    #[test]
    fn digit_input_rejects_non_digits_and_backspaces() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        session.next_item();
        session.next_item();

        session.type_char('7');
        session.type_char('x');
        session.type_char('3');
        assert_eq!(session.digit_input, "73");
        session.backspace();
        assert_eq!(session.digit_input, "7");
    }

    #[test]
    fn out_of_phase_actions_are_no_ops() {
        let (mut session, _clock) = session(Exercise::Digits, TrainingMode::Memory);
        // Not started yet: nothing below may panic or change phase
        session.type_char('1');
        session.submit_recall();
        session.next_item();
        session.answer_day(0);
        assert_eq!(session.phase, Phase::Idle);
        assert!(session.digit_input.is_empty());

        session.start();
        session.start(); // double start is ignored
        assert_eq!(session.phase, Phase::Countdown);
        session.submit_recall(); // submit during countdown is ignored
        assert_eq!(session.phase, Phase::Countdown);
    }

    #[test]
    fn auto_advance_fires_and_manual_navigation_resets_it() {
        let (mut session, clock) = {
            let clock = ManualClock::new();
            let mut cfg = config(Exercise::Digits, TrainingMode::Memory);
            cfg.digits.total_digits = 6;
            cfg.digits.auto_next = 1.0;
            let s = Session::new(cfg, StdRng::seed_from_u64(7), Box::new(clock.clone())).unwrap();
            (s, clock)
        };
        start_and_skip_countdown(&mut session, &clock);
        assert_eq!(session.item_count(), 3);

        run_ticks(&mut session, &clock, ticks_per_sec());
        assert_eq!(session.index, 1);

        // Manual prev resets the accumulator: half an interval, nav, then
        // another half must NOT fire
        run_ticks(&mut session, &clock, ticks_per_sec() / 2);
        session.prev_item();
        run_ticks(&mut session, &clock, ticks_per_sec() / 2);
        assert_eq!(session.index, 0);
        run_ticks(&mut session, &clock, ticks_per_sec() / 2);
        assert_eq!(session.index, 1);
    }

    #[test]
    fn days_quiz_answers_with_feedback_then_scores() {
        let (mut session, clock) = session(Exercise::Days(DateRange::Competition), TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        assert_eq!(session.phase, Phase::Recalling);

        let Stimulus::Dates(dates) = session.stimulus.clone() else {
            panic!("wrong stimulus")
        };
        assert_eq!(dates.len(), 5);

        for (i, date) in dates.iter().enumerate() {
            clock.advance_ms(1_000.0);
            let right = weekday_index(*date);
            // Miss the last question on purpose
            let pick = if i == 4 { (right + 1) % 7 } else { right };
            session.answer_day(pick);
            assert!(session.feedback.is_some());
            // Answers during the flash are swallowed
            session.answer_day(right);
            assert_eq!(session.laps.len(), i + 1);
            run_ticks(&mut session, &clock, 4);
        }

        assert_eq!(session.phase, Phase::Scored);
        let SessionRecord::Calendar(record) = session.take_record().unwrap() else {
            panic!("wrong record")
        };
        assert_eq!(record.laps.len(), 5);
        assert_eq!(record.penalty_seconds, 30);
        assert_eq!(record.final_score_ms, record.total_time_ms + DAY_PENALTY_MS);
    }

    #[test]
    fn math_quiz_records_per_question_answers() {
        let (mut session, clock) = session(Exercise::Math, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        assert_eq!(session.phase, Phase::Recalling);

        let Stimulus::Math(questions) = session.stimulus.clone() else {
            panic!("wrong stimulus")
        };
        for question in &questions {
            clock.advance_ms(500.0);
            session.answer_math(question.answer());
            run_ticks(&mut session, &clock, 4);
        }

        assert_eq!(session.phase, Phase::Scored);
        let SessionRecord::Math(record) = session.take_record().unwrap() else {
            panic!("wrong record")
        };
        assert_eq!(record.correct, 10);
        assert_eq!(record.penalty_ms, 0.0);
    }

    #[test]
    fn letters_quiz_takes_typed_words() {
        let (mut session, clock) = session(Exercise::Letters, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        assert_eq!(session.phase, Phase::Recalling);

        let Stimulus::Letters(questions) = session.stimulus.clone() else {
            panic!("wrong stimulus")
        };
        // Six default rows, five pairs each, all of them asked
        assert_eq!(questions.len(), 30);

        for question in &questions {
            for c in question.answer.chars() {
                session.type_char(c);
            }
            session.submit_word();
            run_ticks(&mut session, &clock, 4);
        }

        assert_eq!(session.phase, Phase::Scored);
        let SessionRecord::Letters(record) = session.take_record().unwrap() else {
            panic!("wrong record")
        };
        assert_eq!(record.correct, 30);
        assert_eq!(record.questions, 30);
    }

    #[test]
    fn cards_recall_compares_positionally() {
        let (mut session, clock) = session(Exercise::Cards, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);

        // 52 cards, 2 per image: 26 presentation steps
        assert_eq!(session.item_count(), 26);
        for _ in 0..26 {
            session.next_item();
        }
        assert_eq!(session.phase, Phase::Recalling);

        let Stimulus::Cards(shoe) = session.stimulus.clone() else {
            panic!("wrong stimulus")
        };
        clock.advance_ms(42_000.0);
        for card in &shoe {
            session.push_card(*card);
        }
        // Mangle the last entry, then fix it
        session.backspace();
        session.push_card(Card::new(Suit::Spade, Rank::Ace));
        session.backspace();
        session.push_card(*shoe.last().unwrap());
        session.submit_recall();

        let SessionRecord::Cards(record) = session.take_record().unwrap() else {
            panic!("wrong record")
        };
        assert_eq!(record.mistakes, 0);
        assert_eq!(record.final_score_ms, 42_000.0);
    }

    #[test]
    fn conversion_mode_loops_without_scoring() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Conversion);
        start_and_skip_countdown(&mut session, &clock);
        assert_eq!(session.phase, Phase::Presenting);

        // Walk past the end several times over: never leaves presentation
        for _ in 0..10 {
            session.next_item();
        }
        assert_eq!(session.phase, Phase::Presenting);
        assert!(session.take_record().is_none());
        assert!(session.index < session.item_count());
    }

    #[test]
    fn digit_conversion_presents_one_fresh_group_per_advance() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Conversion);
        start_and_skip_countdown(&mut session, &clock);

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..20 {
            assert_eq!(session.item_count(), 1);
            let Stimulus::Digits { groups, .. } = &session.stimulus else {
                panic!("wrong stimulus")
            };
            assert_eq!(groups[0].len(), 2);
            seen.insert(groups[0].clone());
            session.next_item();
            assert_eq!(session.index, 0);
        }
        assert!(seen.len() > 1, "every advance should draw fresh digits");
    }

    #[test]
    fn zero_sized_settings_refuse_to_start() {
        let clock = ManualClock::new();
        let mut cfg = config(Exercise::Digits, TrainingMode::Memory);
        cfg.digits.total_digits = 0;
        assert!(Session::new(cfg, StdRng::seed_from_u64(1), Box::new(clock.clone())).is_err());

        let mut cfg = config(Exercise::Cards, TrainingMode::Memory);
        cfg.cards.deck_count = 0;
        assert!(Session::new(cfg, StdRng::seed_from_u64(1), Box::new(clock)).is_err());
    }

    #[test]
    fn english_language_records_english_day_names() {
        let clock = ManualClock::new();
        let mut cfg = config(Exercise::Days(DateRange::Competition), TrainingMode::Memory);
        cfg.lang = Language::En;
        let mut session =
            Session::new(cfg, StdRng::seed_from_u64(9), Box::new(clock.clone())).unwrap();
        start_and_skip_countdown(&mut session, &clock);

        let Stimulus::Dates(dates) = session.stimulus.clone() else {
            panic!("wrong stimulus")
        };
        let right = weekday_index(dates[0]);
        session.answer_day(right);
        assert_eq!(session.laps[0].user_answer, DAYS_EN_LONG[right]);
        assert_eq!(session.laps[0].correct_answer, DAYS_EN_LONG[right]);
    }

    #[test]
    fn retry_resets_state_and_regenerates() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        session.next_item();
        session.next_item();
        session.type_char('1');
        session.submit_recall();
        assert_eq!(session.phase, Phase::Scored);
        let _ = session.take_record();

        session.retry().unwrap();
        assert_eq!(session.phase, Phase::Countdown);
        assert!(session.digit_input.is_empty());
        assert!(session.started_at.is_none());
        assert_eq!(session.countdown_label(), "3");
    }

    #[test]
    fn exit_returns_to_idle_from_any_phase() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        assert_eq!(session.phase, Phase::Presenting);
        session.exit();
        assert_eq!(session.phase, Phase::Idle);
        assert!(session.started_at.is_none());
    }

    #[test]
    fn empty_letter_selection_refuses_to_build() {
        let clock = ManualClock::new();
        let mut cfg = config(Exercise::Letters, TrainingMode::Memory);
        cfg.letters.active_rows.clear();
        let result = Session::new(cfg, StdRng::seed_from_u64(1), Box::new(clock.clone()));
        assert!(result.is_err());
    }

    #[test]
    fn elapsed_time_is_clock_driven() {
        let (mut session, clock) = session(Exercise::Digits, TrainingMode::Memory);
        start_and_skip_countdown(&mut session, &clock);
        let before = session.elapsed_ms();
        clock.advance_ms(1_234.0);
        assert_eq!(session.elapsed_ms() - before, 1_234.0);
    }
}
