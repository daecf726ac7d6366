use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use crate::celebration::Confetti;
use crate::config::{Language, YearMode};
use crate::scorer::SessionRecord;
use crate::session::{Exercise, Phase, Stimulus};
use crate::stimulus::calendar::{DAYS_EN, DAYS_JP};
use crate::stimulus::Card;
use crate::util::{format_ms, japanese_era};
use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 4;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::History => render_history(self, area, buf),
            AppState::Training => match self.session.phase {
                Phase::Idle => render_idle(area, buf),
                Phase::Countdown => render_countdown(self, area, buf),
                Phase::Presenting => render_presenting(self, area, buf),
                Phase::Recalling => render_recalling(self, area, buf),
                Phase::Scored => {
                    render_results(self, area, buf);
                    if self.confetti.is_active() {
                        render_confetti(&self.confetti, area, buf);
                    }
                }
            },
        }
    }
}

fn centered_rows(area: Rect, middle: u16) -> Rect {
    let pad = area.height.saturating_sub(middle) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(pad),
            Constraint::Length(middle),
            Constraint::Min(0),
        ])
        .split(area);
    chunks[1]
}

fn render_idle(area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(
        "press enter to start / (esc) quit",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(centered_rows(area, 1), buf);
}

fn render_countdown(app: &App, area: Rect, buf: &mut Buffer) {
    let label = app.session.countdown_label();
    let style = if label == "START!" {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(centered_rows(area, 3));
    Paragraph::new(title_line(app))
        .alignment(Alignment::Center)
        .render(rows[0], buf);
    Paragraph::new(Span::styled(label, style))
        .alignment(Alignment::Center)
        .render(rows[2], buf);
}

fn title_line(app: &App) -> Line<'static> {
    let name = match app.session.config.exercise {
        Exercise::Days(range) => format!("calendar · {range}"),
        Exercise::Math => "calendar · mod-7 drill".to_string(),
        Exercise::Digits => "digits".to_string(),
        Exercise::Cards => "cards".to_string(),
        Exercise::Letters => "letter pairs".to_string(),
    };
    Line::from(Span::styled(
        name,
        Style::default().add_modifier(Modifier::DIM | Modifier::BOLD),
    ))
}

fn render_presenting(app: &App, area: Rect, buf: &mut Buffer) {
    let rows = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Length(1),
        Constraint::Length(2), // stimulus
        Constraint::Length(1),
        Constraint::Length(1), // position + legend
    ])
    .split(centered_rows(area, 6));
    Paragraph::new(title_line(app))
        .alignment(Alignment::Center)
        .render(rows[0], buf);

    let body: Line = match &app.session.stimulus {
        Stimulus::Digits { groups, .. } => {
            let group = groups.get(app.session.index).cloned().unwrap_or_default();
            Line::from(Span::styled(
                group,
                Style::default().add_modifier(Modifier::BOLD),
            ))
        }
        Stimulus::Cards(shoe) => {
            let step = app.session.config.cards.step();
            let start = app.session.index * step;
            let view = &shoe[start..shoe.len().min(start + step)];
            card_line(view)
        }
        Stimulus::Dates(dates) => {
            let date = dates[app.session.index.min(dates.len() - 1)];
            let text = date_label(app, date);
            let day = day_names(app)[crate::stimulus::calendar::weekday_index(date)];
            Line::from(vec![
                Span::styled(text, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(day.to_string(), Style::default().fg(Color::Green)),
            ])
        }
        Stimulus::Math(questions) => {
            let q = questions[app.session.index.min(questions.len() - 1)];
            Line::from(vec![
                Span::styled(
                    format!("{} + {} + {} + {} mod 7", q.n1, q.n2, q.n3, q.n4),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(q.answer().to_string(), Style::default().fg(Color::Green)),
            ])
        }
        Stimulus::Letters(questions) => {
            let q = &questions[app.session.index.min(questions.len() - 1)];
            Line::from(vec![
                Span::styled(q.pair.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(q.answer.clone(), Style::default().fg(Color::Green)),
            ])
        }
    };

    let alignment = if body.width() <= area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize {
        Alignment::Center
    } else {
        Alignment::Left
    };
    Paragraph::new(body)
        .alignment(alignment)
        .wrap(Wrap { trim: true })
        .render(rows[2], buf);

    let footer = format!(
        "{} / {}   ·   {}",
        app.session.index + 1,
        app.session.item_count(),
        nav_legend(app),
    );
    Paragraph::new(Span::styled(footer, Style::default().add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
        .render(rows[4], buf);
}

fn nav_legend(app: &App) -> &'static str {
    match app.session.config.exercise {
        Exercise::Cards | Exercise::Digits => "(→/space) next  (←) prev  (home) first  (esc) quit",
        _ => "(→/space) next  (←) prev  (esc) quit",
    }
}

fn render_recalling(app: &App, area: Rect, buf: &mut Buffer) {
    let rows = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Length(1), // timer
        Constraint::Length(1),
        Constraint::Length(4), // input / question
        Constraint::Length(1), // flash or progress
    ])
    .split(centered_rows(area, 8));
    Paragraph::new(title_line(app))
        .alignment(Alignment::Center)
        .render(rows[0], buf);

    let timer = format_ms(app.session.elapsed_ms(), app.session.config.calendar.timer_format);
    Paragraph::new(Span::styled(timer, Style::default().add_modifier(Modifier::DIM)))
        .alignment(Alignment::Center)
        .render(rows[1], buf);

    let avail = area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize;
    let body: Vec<Line> = match &app.session.stimulus {
        Stimulus::Digits { .. } => vec![
            Line::from(Span::styled(
                tail_fit(&app.session.digit_input, avail),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                "type the digits · (bksp) undo · (enter) submit",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ],
        Stimulus::Cards(_) => {
            let tail_start = app.session.card_input.len().saturating_sub(8);
            let mut line = card_line(&app.session.card_input[tail_start..]);
            line.spans.insert(
                0,
                Span::styled(
                    format!("{} entered  ", app.session.card_input.len()),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            );
            vec![
                line,
                Line::default(),
                Line::from(Span::styled(
                    "(s/h/d/c) suit then (a,2-9,t,j,q,k) rank · (bksp) undo · (enter) submit",
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ]
        }
        Stimulus::Dates(dates) => {
            let date = dates[app.session.index.min(dates.len() - 1)];
            vec![
                Line::from(Span::styled(
                    date_label(app, date),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(Span::styled(day_keypad(app), Style::default().add_modifier(Modifier::ITALIC))),
            ]
        }
        Stimulus::Math(questions) => {
            let q = questions[app.session.index.min(questions.len() - 1)];
            vec![
                Line::from(Span::styled(
                    format!("{} + {} + {} + {} mod 7 = ?", q.n1, q.n2, q.n3, q.n4),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(Span::styled(
                    "(0-6) answer",
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ]
        }
        Stimulus::Letters(questions) => {
            let q = &questions[app.session.index.min(questions.len() - 1)];
            let mut lines = vec![
                Line::from(Span::styled(
                    q.pair.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::raw(tail_fit(&app.session.word_input, avail))),
            ];
            if app.session.config.letters.always_show_answer {
                lines.push(Line::from(Span::styled(
                    q.answer.clone(),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
            lines.push(Line::from(Span::styled(
                "type the word · (enter) submit",
                Style::default().add_modifier(Modifier::ITALIC),
            )));
            lines
        }
    };
    Paragraph::new(body)
        .alignment(Alignment::Center)
        .render(rows[3], buf);

    if let Some(feedback) = &app.session.feedback {
        let (text, style) = if feedback.correct {
            ("○".to_string(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            (
                format!("✕ {}", feedback.expected),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        };
        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .render(rows[4], buf);
    } else if let Some((done, total)) = quiz_progress(app) {
        Paragraph::new(Span::styled(
            format!("{done} / {total}"),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(rows[4], buf);
    }
}

fn quiz_progress(app: &App) -> Option<(usize, usize)> {
    match app.session.config.exercise {
        Exercise::Days(_) => Some((app.session.laps.len(), app.session.item_count())),
        Exercise::Math => Some((app.session.math_answers.len(), app.session.item_count())),
        Exercise::Letters => Some((app.session.word_answers.len(), app.session.item_count())),
        _ => None,
    }
}

fn day_names(app: &App) -> [&'static str; 7] {
    match app.global.lang {
        Language::Ja => DAYS_JP,
        Language::En => DAYS_EN,
    }
}

/// Answer legend for the day quiz. The keys are always the true weekday
/// indexes; a Monday week start only reorders the display, and the numeric
/// hints can be switched off once they are memorized.
fn day_keypad(app: &App) -> String {
    let days = day_names(app);
    let cal = &app.session.config.calendar;
    let mut order: Vec<usize> = (0..7).collect();
    if cal.start_day == 1 {
        order.rotate_left(1);
    }
    order
        .into_iter()
        .map(|i| {
            if cal.show_numbers {
                format!("({i}){}", days[i])
            } else {
                days[i].to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn date_label(app: &App, date: chrono::NaiveDate) -> String {
    use chrono::Datelike;
    let western = format!("{}年{}月{}日", date.year(), date.month(), date.day());
    match app.session.config.calendar.year_mode {
        YearMode::Western => western,
        YearMode::Japanese => format!("{} {}月{}日", japanese_era(date), date.month(), date.day()),
        YearMode::Both => format!("{} ({})", western, japanese_era(date)),
    }
}

/// Keeps the tail of the typed input inside `avail` terminal columns.
/// Kana answers are double-width, so this counts display columns, not chars.
fn tail_fit(input: &str, avail: usize) -> String {
    if input.width() <= avail {
        return input.to_string();
    }
    let mut cols = 0;
    let mut out = Vec::new();
    for c in input.chars().rev() {
        let w = c.to_string().width();
        if cols + w > avail.saturating_sub(1) {
            break;
        }
        cols += w;
        out.push(c);
    }
    let mut s = String::from("…");
    s.extend(out.into_iter().rev());
    s
}

fn card_line(cards: &[Card]) -> Line<'static> {
    let mut spans = Vec::with_capacity(cards.len() * 2);
    for card in cards {
        let color = if card.suit.is_red() { Color::Red } else { Color::White };
        spans.push(Span::styled(
            card.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // banner
            Constraint::Length(1), // title
            Constraint::Length(1), // headline score
            Constraint::Min(1),    // breakdown
            Constraint::Length(1), // best
            Constraint::Length(1), // legend
        ])
        .split(area);

    if app.outcome.is_some_and(|o| o.is_new_best) {
        Paragraph::new(Span::styled(
            "NEW RECORD",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);
    }

    Paragraph::new(title_line(app))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let timer_format = app.session.config.calendar.timer_format;
    let Some(record) = &app.last_record else {
        return;
    };

    let headline = format_ms(headline_score(record), timer_format);
    Paragraph::new(Span::styled(
        headline,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let mut breakdown: Vec<Line> = match record {
        SessionRecord::Digits(r) => vec![
            Line::from(format!("time {}", format_ms(r.time_ms, timer_format))),
            Line::from(format!("correct {} / {}", r.correct, r.total_digits)),
            Line::from(format!("penalty +{}s", r.penalty_seconds)),
        ],
        SessionRecord::Cards(r) => vec![
            Line::from(format!("decks {}", r.deck_count)),
            Line::from(format!("correct {} / {}", r.correct, r.correct + r.mistakes)),
        ],
        SessionRecord::Letters(r) => {
            vec![Line::from(format!("correct {} / {}", r.correct, r.questions))]
        }
        SessionRecord::Calendar(r) => {
            let mut lines: Vec<Line> = r
                .laps
                .iter()
                .map(|lap| {
                    let mark = if lap.correct { "○" } else { "✕" };
                    Line::from(format!(
                        "{} {}  {}  {}",
                        mark,
                        lap.date,
                        lap.correct_answer,
                        format_ms(lap.duration_ms, timer_format),
                    ))
                })
                .collect();
            lines.push(Line::from(format!("penalty +{}s", r.penalty_seconds)));
            lines
        }
        SessionRecord::Math(r) => vec![
            Line::from(format!("raw {}", format_ms(r.raw_time_ms, timer_format))),
            Line::from(format!("correct {} / 10", r.correct)),
            Line::from(format!("avg {}", format_ms(r.avg_score_ms, timer_format))),
        ],
    };
    if let Some(edit) = &app.master_edit {
        breakdown.push(Line::default());
        breakdown.push(Line::from(vec![
            Span::styled(
                edit.current_pair().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  new word: "),
            Span::styled(edit.input.clone(), Style::default().fg(Color::Yellow)),
        ]));
    }
    Paragraph::new(breakdown)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    if let Some(best) = &app.best {
        Paragraph::new(Span::styled(
            format!("best {}", format_ms(headline_score(best), timer_format)),
            Style::default().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    let legend = if app.master_edit.is_some() {
        "(enter) save · (bksp) undo · (esc) done"
    } else if matches!(record, SessionRecord::Letters(r) if r.correct < r.questions) {
        "(e)dit misses / (r)etry / (h)istory / (esc)ape"
    } else {
        "(r)etry / (h)istory / (esc)ape"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

/// What the results screen headlines: math ranks by the per-question average,
/// the rest by the final score.
fn headline_score(record: &SessionRecord) -> f64 {
    match record {
        SessionRecord::Math(r) => r.avg_score_ms,
        other => other.final_score_ms(),
    }
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let now_ms = chrono::Utc::now().timestamp_millis();
    let timer_format = app.session.config.calendar.timer_format;
    let rows: Vec<Row> = app
        .history
        .iter()
        .skip(app.history_scroll)
        .map(|record| {
            let age_secs = (record.timestamp() - now_ms) / 1000;
            Row::new(vec![
                Cell::from(HumanTime::from(age_secs).to_string()),
                Cell::from(format_ms(headline_score(record), timer_format)),
            ])
        })
        .collect();

    let table = Table::new(rows, &[Constraint::Length(24), Constraint::Length(16)])
        .header(
            Row::new(vec![Cell::from("when"), Cell::from("score")]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(Block::default().borders(Borders::ALL).title("history"));
    table.render(chunks[0], buf);

    Paragraph::new(Span::styled(
        "↑/↓ scroll · (b)ack · (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);
}

fn render_confetti(confetti: &Confetti, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];
    for p in &confetti.particles {
        if p.x < 0.0 || p.y < 0.0 {
            continue;
        }
        let (x, y) = (p.x as u16, p.y as u16);
        if x < area.width && y < area.height {
            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&p.symbol.to_string());
                cell.set_style(Style::default().fg(colors[p.color_index % colors.len()]));
            }
        }
    }
}
