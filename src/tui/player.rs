//! Workout player screen

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use super::Tui;
use crate::cue::AudioCue;
use crate::session::{PersistenceGateway, Phase, RestDurations, SessionEngine, SessionResult, TickClock};
use crate::workouts::{FeedbackRating, Workout};

/// Play `workout` until it finishes (Some) or the user leaves (None, progress stays saved)
pub fn run_player<P: PersistenceGateway, A: AudioCue>(
    terminal: &mut Tui,
    store: P,
    cue: A,
    workout: Workout,
    rest: RestDurations,
    restart: bool,
) -> Result<Option<SessionResult>> {
    let mut engine = if restart {
        SessionEngine::restart(workout, store, cue, rest)?
    } else {
        SessionEngine::with_rest(workout, store, cue, rest)?
    };
    let mut clock = TickClock::new();

    loop {
        let secs = clock.poll(Instant::now(), engine.countdown_key());
        if let Some(result) = engine.elapse(secs) {
            return Ok(Some(result));
        }

        terminal.draw(|frame| render(frame, &engine))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    let finished = match key.code {
                        KeyCode::Char(' ') => {
                            engine.toggle_play_pause();
                            None
                        }
                        KeyCode::Enter => engine.complete_current_set(),
                        KeyCode::Right | KeyCode::Char('n') => engine.skip_current(),
                        KeyCode::Left | KeyCode::Char('b') => {
                            engine.go_to_previous();
                            None
                        }
                        KeyCode::Char('g') => {
                            engine.submit_feedback(FeedbackRating::Good);
                            None
                        }
                        KeyCode::Char('h') => {
                            engine.submit_feedback(FeedbackRating::Hard);
                            None
                        }
                        KeyCode::Char('f') => engine.force_finish(),
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
                        _ => None,
                    };
                    if finished.is_some() {
                        return Ok(finished);
                    }
                }
    }
}

fn render<P: PersistenceGateway, A: AudioCue>(frame: &mut Frame, engine: &SessionEngine<P, A>) {
    let area = frame.area();
    let resting = engine.phase() == Phase::Resting;
    let accent = if resting { Color::LightBlue } else { Color::Cyan };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(area);

    // Header
    let workout = engine.workout();
    let header = Paragraph::new(format!(
        "Упражнение {} из {} | {}",
        engine.exercise_index() + 1,
        workout.exercises.len(),
        workout.title
    ))
    .style(Style::default().fg(accent).bold())
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    // Title and next-up line
    let exercise = engine.current_exercise();
    let title = match (engine.phase(), engine.is_set_rest()) {
        (Phase::Exercising, _) => exercise.name.clone(),
        (Phase::Resting, true) => "Отдых".to_string(),
        (Phase::Resting, false) => "Перерыв".to_string(),
    };
    let subtitle = if !resting {
        if engine.total_sets() > 1 {
            format!("Подход {} из {}", engine.current_set(), engine.total_sets())
        } else {
            String::new()
        }
    } else if engine.is_set_rest() {
        format!("Далее: Подход {}", engine.current_set() + 1)
    } else if let Some(next) = engine.next_exercise() {
        format!("Далее: {}", next.name)
    } else {
        "Тренировка почти закончена!".to_string()
    };
    let heading = Paragraph::new(vec![
        Line::from(title).bold().fg(accent),
        Line::from(subtitle),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::NONE));
    frame.render_widget(heading, chunks[1]);

    // Countdown or rep target
    let pause_mark = if engine.is_playing() { "" } else { " ⏸" };
    if resting {
        let total = engine.rest_duration().max(1);
        let ratio = (engine.time_left() as f64 / total as f64).clamp(0.0, 1.0);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(accent))
            .ratio(ratio)
            .label(format!("{} сек{}", engine.time_left(), pause_mark));
        frame.render_widget(gauge, chunks[2]);
    } else {
        let target = if exercise.is_timed() {
            format!("Осталось: {} сек{}", engine.time_left(), pause_mark)
        } else {
            format!("Цель: {} повторений", exercise.display_target())
        };
        let target = Paragraph::new(target)
            .alignment(Alignment::Center)
            .style(Style::default().fg(accent).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(target, chunks[2]);
    }

    // Description or feedback prompt
    let mut lines = Vec::new();
    if !resting {
        lines.push(Line::from(exercise.description.clone()));
    } else if engine.accepts_feedback() {
        lines.push(Line::from(format!("Как вам «{}»?", exercise.name)));
        lines.push(Line::from("g: помогло | h: слишком сложно").fg(Color::DarkGray));
        if let Some(rating) = engine.feedback().get(&exercise.name) {
            lines.push(Line::from(format!("Ваша оценка: {}", rating.name_ru())).fg(Color::Green));
        }
    }
    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(body, chunks[3]);

    // Footer
    let hint = if resting {
        "space: пауза | →: пропустить отдых | ←: назад | f: завершить | q: выйти"
    } else if exercise.is_timed() {
        "space: пауза | →: пропустить | ←: назад | f: завершить | q: выйти"
    } else {
        "enter: подход выполнен | →: пропустить | ←: назад | f: завершить | q: выйти"
    };
    let footer = Paragraph::new(hint)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[4]);
}
