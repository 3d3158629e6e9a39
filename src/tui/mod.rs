//! TUI module - dashboard and workout player with ratatui

mod player;

use std::collections::BTreeMap;
use std::io::{Stdout, stdout};

use anyhow::Result;
use chrono::Local;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use tracing::warn;

use crate::config::Config;
use crate::cue::{SilentCue, TerminalBell};
use crate::db::Database;
use crate::history::{self, History};
use crate::session::{RestDurations, SessionResult};
use crate::tips;
use crate::workouts::{self, Workout};

pub use player::run_player;

pub(crate) type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for TUI
pub struct App {
    db: Database,
    config: Config,
    workouts: Vec<Workout>,
    rest: RestDurations,
    quiet: bool,
    selected: usize,
    pending: Vec<String>,
    history: History,
    progress: BTreeMap<u32, u32>,
    special_day: u32,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database, config: &Config) -> Result<Self> {
        let mut app = Self {
            db,
            config: config.clone(),
            workouts: Vec::new(),
            rest: config.rest(),
            quiet: config.quiet,
            selected: 0,
            pending: Vec::new(),
            history: History::new(Vec::new()),
            progress: BTreeMap::new(),
            special_day: 1,
            should_quit: false,
        };
        app.refresh()?;
        Ok(app)
    }

    fn refresh(&mut self) -> Result<()> {
        self.pending = self.db.pending_sessions()?;
        self.history = History::new(self.db.get_workout_history()?);
        self.progress = self.db.get_program_progress()?;
        self.special_day = self.db.get_special_program_day()?;
        // the course entry changes id as days go by
        self.workouts = self.config.catalog(self.special_day)?;
        self.selected = self.selected.min(self.workouts.len().saturating_sub(1));
        Ok(())
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = self.main_loop(&mut terminal);
        restore_terminal()?;
        result
    }

    /// Open the player straight away for one workout
    pub fn run_workout(&mut self, workout_id: &str, restart: bool) -> Result<()> {
        let Some(index) = self.workouts.iter().position(|w| w.id == workout_id) else {
            anyhow::bail!("unknown workout '{}'", workout_id);
        };
        self.selected = index;

        let mut terminal = init_terminal()?;
        let result = self.play(&mut terminal, restart);
        restore_terminal()?;
        result
    }

    fn main_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events(terminal)?;
        }
        Ok(())
    }

    fn play(&mut self, terminal: &mut Tui, restart: bool) -> Result<()> {
        let workout = self.workouts[self.selected].clone();
        let finished = if self.quiet {
            run_player(terminal, &self.db, SilentCue, workout.clone(), self.rest, restart)?
        } else {
            run_player(terminal, &self.db, TerminalBell, workout.clone(), self.rest, restart)?
        };

        if let Some(result) = finished {
            let today = Local::now().date_naive();
            if let Err(e) = history::record_finished(&self.db, &workout, &result, today) {
                warn!("Failed to record history for '{}': {:#}", workout.id, e);
            }
            show_completion(terminal, &workout, &result)?;
        }
        self.refresh()
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new("rehabtrack - Здоровая спина")
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        // Workout table
        let rows: Vec<Row> = self.workouts.iter().enumerate().map(|(i, w)| {
            let marker = if self.pending.contains(&w.id) { "▶ продолжить" } else { "" };
            let style = if i == self.selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(w.title.clone()),
                Cell::from(w.exercises.len().to_string()),
                Cell::from(format!("~{} мин", w.estimated_minutes())),
                Cell::from(marker),
            ])
            .style(style)
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(24),
                Constraint::Length(6),
                Constraint::Length(9),
                Constraint::Length(13),
            ],
        )
        .header(Row::new(vec!["Тренировка", "Упр.", "Время", ""])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Тренировки"));
        frame.render_widget(table, body[0]);

        frame.render_widget(self.stats_panel(), body[1]);

        // Footer
        let footer = Paragraph::new("↑↓: выбор | enter: начать | r: заново | q: выход")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn stats_panel(&self) -> Paragraph<'static> {
        let today = Local::now().date_naive();
        let stage = workouts::current_stage(&self.progress);
        let done = self.progress.get(&stage.id).copied().unwrap_or(0);
        let stage_line = match stage.total_days {
            Some(total) => format!("Этап {}: {} ({}/{} дн.)", stage.id, stage.name, done, total),
            None => format!("Этап {}: {}", stage.id, stage.name),
        };

        let strip: String = self
            .history
            .activity(today, 14)
            .iter()
            .map(|(_, trained)| if *trained { '■' } else { '·' })
            .collect();

        let tip = tips::tip_of_the_day(today);
        let lines = vec![
            Line::from(stage_line).bold(),
            Line::from(format!("Курс: день {}/{}", self.special_day, workouts::SPECIAL_PROGRAM_DAYS)),
            Line::from(format!("Серия: {} дн.", self.history.streak(today))),
            Line::from(format!("Всего тренировок: {}", self.history.total_sessions())),
            Line::from(format!("14 дней: {}", strip)),
            Line::from(""),
            Line::from(format!("{} Совет дня", tip.category.emoji())).fg(Color::Yellow),
            Line::from(tip.text).italic(),
        ];

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Прогресс"))
    }

    fn handle_events(&mut self, terminal: &mut Tui) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                        KeyCode::Up | KeyCode::Char('k') => {
                            self.selected = self.selected.saturating_sub(1);
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            self.selected = (self.selected + 1).min(self.workouts.len().saturating_sub(1));
                        }
                        KeyCode::Enter => self.play(terminal, false)?,
                        KeyCode::Char('r') => self.play(terminal, true)?,
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn show_completion(terminal: &mut Tui, workout: &Workout, result: &SessionResult) -> Result<()> {
    let title = if result.skipped == 0 {
        "Тренировка завершена!"
    } else {
        "Тренировка окончена"
    };
    let mut lines = vec![
        Line::from(title).bold().fg(Color::Green),
        Line::from(workout.title.clone()),
        Line::from(""),
        Line::from(format!("Выполнено: {} из {}", result.completed, result.total)),
        Line::from(format!("Пропущено: {}", result.skipped)),
        Line::from(""),
    ];
    lines.extend(
        result
            .completed_exercises
            .iter()
            .map(|e| Line::from(format!("✓ {}", e.name))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from("любая клавиша: на главный экран").fg(Color::DarkGray));

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            let summary = Paragraph::new(lines.clone())
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Итог"));
            frame.render_widget(summary, area);
        })?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press {
                return Ok(());
            }
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
