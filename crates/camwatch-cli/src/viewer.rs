use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use camwatch_core::{projection, CameraRecord, CameraStatus, CycleOutcome, Gateway, SimulatedProbe, Simulator};
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Terminal;

use crate::render::format_check_time;

struct DashboardState {
    roster: Vec<CameraRecord>,
    last_outcome: Option<CycleOutcome>,
    /// Worklist of the cycle in flight; empty between cycles.
    pending: VecDeque<String>,
    in_progress: CycleOutcome,
    next_check: Instant,
}

impl DashboardState {
    fn new(gateway: &Gateway, first_check: Instant) -> Self {
        Self {
            roster: gateway.snapshot(),
            last_outcome: None,
            pending: VecDeque::new(),
            in_progress: CycleOutcome::default(),
            next_check: first_check,
        }
    }
}

/// Full-screen roster dashboard. Runs the liveness schedule itself (early
/// one-shot, then the regular interval) and refreshes after every cycle;
/// quitting tears the schedule down with the screen.
///
/// The cycle is stepped one probe per loop pass, so the table redraws (and
/// keys keep working) between records: each finished check appears while the
/// rest of the roster still shows as checking.
pub async fn run_viewer(
    gateway: &mut Gateway,
    mut simulator: Simulator<SimulatedProbe>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let first_check = Instant::now() + simulator.config().first_check_delay;
    let interval = simulator.config().check_interval;
    let mut state = DashboardState::new(gateway, first_check);

    let run_result = async {
        loop {
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') => {
                            // Manual cycle on demand.
                            state.next_check = Instant::now();
                        }
                        _ => {}
                    }
                }
            }

            if state.pending.is_empty() && Instant::now() >= state.next_check {
                state.pending = simulator.start_cycle(gateway).into();
                state.in_progress = CycleOutcome::default();
                state.next_check = Instant::now() + interval;
            }

            if let Some(id) = state.pending.pop_front() {
                match simulator.check_one(gateway, &id).await? {
                    Some(toggled) => {
                        state.in_progress.checked += 1;
                        if toggled {
                            state.in_progress.toggled += 1;
                        }
                    }
                    None => state.in_progress.skipped += 1,
                }
                if state.pending.is_empty() {
                    state.last_outcome = Some(state.in_progress);
                }
            }

            state.roster = gateway.snapshot();
            terminal.draw(|frame| draw_ui(frame.size(), frame, &state))?;
        }

        Ok::<(), anyhow::Error>(())
    }
    .await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

fn draw_ui(area: Rect, frame: &mut ratatui::Frame<'_>, state: &DashboardState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    frame.render_widget(render_header(state), rows[0]);
    render_roster_table(frame, rows[1], state);
}

fn render_header(state: &DashboardState) -> Paragraph<'static> {
    let stats = projection::stats(&state.roster);
    let countdown = state.next_check.saturating_duration_since(Instant::now());

    let summary = format!(
        "{} cameras  {} online  {} offline  next check in {}s",
        stats.total,
        stats.online,
        stats.offline,
        countdown.as_secs()
    );
    let cycle = match state.last_outcome {
        Some(outcome) => format!(
            "last cycle: checked={} toggled={}  ('c' checks now, 'q' quits)",
            outcome.checked, outcome.toggled
        ),
        None => "waiting for first cycle...  ('c' checks now, 'q' quits)".to_string(),
    };

    Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "Camwatch Dashboard  ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(summary),
        ]),
        Line::from(cycle),
    ])
    .block(Block::default().borders(Borders::ALL).title("Status"))
}

fn render_roster_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &DashboardState) {
    let rows: Vec<Row> = projection::active(&state.roster)
        .map(|record| {
            let status_cell = if record.is_checking {
                Cell::from("checking…").style(Style::default().fg(Color::Yellow))
            } else {
                match record.status {
                    CameraStatus::Online => {
                        Cell::from("online").style(Style::default().fg(Color::Green))
                    }
                    CameraStatus::Offline => {
                        Cell::from("offline").style(Style::default().fg(Color::Red))
                    }
                }
            };

            Row::new(vec![
                Cell::from(record.name.clone()),
                Cell::from(record.ip.clone()),
                status_cell,
                Cell::from(format_check_time(record.last_check_at)),
                Cell::from(record.address.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(24),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(20),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["name", "ip", "status", "last check", "address"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Cameras"));

    frame.render_widget(table, area);
}
