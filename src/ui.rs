//! `ratatui` console: viewport, solve and system panels plus the key loop that
//! drives [`App::tick`].

use crate::log_debug;
use crate::terminal_restore::TerminalRestoreGuard;
use crate::solve::{DisplayMode, SolvePhase};
use crate::App;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthChar;

const MAX_LOOP_WAIT: Duration = Duration::from_millis(50);

const BORDER: Color = Color::Rgb(90, 140, 255);
const TITLE: Color = Color::Rgb(130, 170, 255);
const DIM: Color = Color::Rgb(90, 100, 130);
const TEXT: Color = Color::Rgb(205, 210, 220);
const LABEL: Color = Color::Rgb(140, 150, 175);
const ACCENT: Color = Color::Rgb(255, 210, 110);
const GOOD: Color = Color::Rgb(120, 220, 140);
const BAD: Color = Color::Rgb(255, 110, 110);

/// Configure the terminal, run the control loop, and tear everything down.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    let guard = TerminalRestoreGuard::enter(&mut stdout)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = app_loop(&mut terminal, app);

    drop(terminal);
    drop(guard);
    result
}

fn app_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    app.begin_session(Instant::now());
    terminal.draw(|frame| draw(frame, app))?;
    let wait = app.config().refresh_interval().min(MAX_LOOP_WAIT);

    loop {
        app.tick(Instant::now());
        let mut should_draw = app.take_redraw_request();
        let mut should_quit = false;

        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    should_quit = handle_key_event(app, key, Instant::now());
                    should_draw = true;
                }
                Event::Resize(_, _) => should_draw = true,
                _ => {}
            }
        }

        if should_draw {
            terminal.draw(|frame| draw(frame, app))?;
        }
        if should_quit {
            log_debug("quit requested");
            break;
        }
    }
    Ok(())
}

/// Apply one keystroke. Returns true when the operator asked to quit.
fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return key.code == KeyCode::Char('c');
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('s') => {
            if !app.solve_field(now) {
                log_debug("solve key ignored while an attempt is running");
            }
        }
        KeyCode::Char('c') => {
            app.capture_snapshot();
        }
        KeyCode::Tab | KeyCode::Char('m') => app.toggle_display_mode(now),
        KeyCode::Char('l') | KeyCode::Char('1') => app.set_display_mode(DisplayMode::Live, now),
        KeyCode::Char('o') | KeyCode::Char('2') => {
            app.set_display_mode(DisplayMode::Solved, now)
        }
        _ => {}
    }
    false
}

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(frame.size());
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    draw_viewport(frame, app, top[0]);
    draw_solve(frame, app, top[1]);
    draw_system(frame, app, rows[1]);
    draw_status(frame, app, rows[2]);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
        ))
}

fn field<'a>(label: &'a str, value: String, width: u16) -> Line<'a> {
    let budget = (width as usize).saturating_sub(label.len() + 4);
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(LABEL)),
        Span::styled(fit_width(&value, budget), Style::default().fg(TEXT)),
    ])
}

fn draw_viewport(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let feed = app.feed();
    let mode = app.display_mode();
    let fps = feed
        .fps()
        .map(|fps| format!("{fps:.1}"))
        .unwrap_or_else(|| "--".to_string());
    let frame_text = match feed.last_frame() {
        Some(info) => format!("{} bytes ({})", info.bytes, info.mode.label()),
        None => "none yet".to_string(),
    };
    let mode_style = match mode {
        DisplayMode::Live => Style::default().fg(GOOD).add_modifier(Modifier::BOLD),
        DisplayMode::Solved => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Mode: ", Style::default().fg(LABEL)),
            Span::styled(mode.to_string(), mode_style),
        ]),
        field("FPS", fps, area.width),
        field("Frame", frame_text, area.width),
        field(
            "Source",
            feed.current_url().unwrap_or("--").to_string(),
            area.width,
        ),
        field(
            "Loaded",
            format!("{} ok / {} failed", feed.frames_loaded(), feed.frame_errors()),
            area.width,
        ),
        field(
            "Refresh",
            format!("every {} ms", feed.cadence().as_millis()),
            area.width,
        ),
    ];
    frame.render_widget(Paragraph::new(lines).block(panel("Viewport")), area);
}

fn draw_solve(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let readouts = app.readouts();
    let status_color = match app.solve_phase() {
        SolvePhase::Idle if readouts.solver_status() == "Solved" => GOOD,
        SolvePhase::Idle if readouts.solver_status() != "Idle" => BAD,
        SolvePhase::Idle => TEXT,
        SolvePhase::Requesting | SolvePhase::Polling => ACCENT,
    };
    let counters = app.solve_counters();
    let width = area.width;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Solver: ", Style::default().fg(LABEL)),
            Span::styled(
                fit_width(readouts.solver_status(), width.saturating_sub(12) as usize),
                Style::default().fg(status_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        field("RA", readouts.ra().to_string(), width),
        field("Dec", readouts.dec().to_string(), width),
        field("RA (hms)", readouts.ra_hms().to_string(), width),
        field("Dec (dms)", readouts.dec_dms().to_string(), width),
        field("Roll", readouts.roll().to_string(), width),
        field("Solution time", readouts.solution_time().to_string(), width),
        field("Constellation", readouts.constellation().to_string(), width),
        field(
            "Image",
            readouts.image_url().unwrap_or("--").to_string(),
            width,
        ),
    ];
    if let Some(result) = readouts.result_line() {
        lines.push(Line::from(Span::styled(
            fit_width(result, width.saturating_sub(2) as usize),
            Style::default().fg(DIM),
        )));
    }
    lines.push(field(
        "Attempts",
        format!(
            "{} #{} ({} solved, {} failed, {} errors, poll {} ms)",
            app.solve_phase().label(),
            app.solve_attempt(),
            counters.solved,
            counters.failed,
            counters.rejected + counters.transport_errors,
            app.poll_interval().as_millis()
        ),
        width,
    ));
    frame.render_widget(Paragraph::new(lines).block(panel("Plate Solve")), area);
}

fn draw_system(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let (temp, load) = match app.stats().latest() {
        Some(stats) => (stats.cpu_temp(), stats.cpu_load()),
        None => ("--".to_string(), "--".to_string()),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("CPU temp: ", Style::default().fg(LABEL)),
            Span::styled(temp, Style::default().fg(TEXT)),
            Span::styled("   CPU load: ", Style::default().fg(LABEL)),
            Span::styled(load, Style::default().fg(TEXT)),
        ]),
        field("Service", app.base_url().to_string(), area.width),
    ];
    frame.render_widget(Paragraph::new(lines).block(panel("System")), area);
}

fn draw_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let key = |label: &'static str, enabled: bool| {
        let style = if enabled {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        Span::styled(label, style)
    };
    let hint = |text: &'static str| Span::styled(text, Style::default().fg(DIM));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(DIM))
        .title(Span::styled(" Status ", Style::default().fg(LABEL)))
        .title_bottom(Line::from(vec![
            key(" s ", app.solve_trigger_enabled()),
            hint("solve  "),
            key("Tab ", true),
            hint("live/solved  "),
            key("c ", !app.snapshot_pending()),
            hint("snapshot  "),
            key("q ", true),
            hint("quit "),
        ]));
    let status = fit_width(app.status_text(), area.width.saturating_sub(2) as usize);
    frame.render_widget(
        Paragraph::new(status)
            .style(Style::default().fg(TEXT))
            .block(block),
        area,
    );
}

/// Cut `text` to `max` terminal columns, marking the cut with an ellipsis.
fn fit_width(text: &str, max: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > max {
            if max > 0 {
                while used + 1 > max {
                    match out.pop() {
                        Some(last) => used -= last.width().unwrap_or(0),
                        None => break,
                    }
                }
                out.push('…');
            }
            return out;
        }
        out.push(ch);
        used += width;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::{solution, ScriptedBackend};
    use crate::backend::{Dispatcher, SolveBackend};
    use crate::config::AppConfig;
    use crate::solve::SolveResult;
    use clap::Parser;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn test_app(args: &[&str]) -> (App, Arc<ScriptedBackend>, Instant) {
        let mut argv = vec!["solvecam-tests", "--no-remember-mode"];
        argv.extend_from_slice(args);
        let config = AppConfig::parse_from(argv);
        let backend = ScriptedBackend::new();
        let dispatcher = Dispatcher::inline(backend.clone() as Arc<dyn SolveBackend>);
        let now = Instant::now();
        (App::with_dispatcher(config, dispatcher, now), backend, now)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).expect("test terminal");
        terminal.draw(|frame| draw(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn quit_keys() {
        let (mut app, _backend, now) = test_app(&[]);
        assert!(handle_key_event(&mut app, press(KeyCode::Char('q')), now));
        assert!(handle_key_event(&mut app, press(KeyCode::Esc), now));
        assert!(handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            now
        ));
        assert!(!handle_key_event(&mut app, press(KeyCode::Char('x')), now));
    }

    #[test]
    fn mode_keys_switch_display() {
        let (mut app, backend, now) = test_app(&[]);
        app.begin_session(now);
        handle_key_event(&mut app, press(KeyCode::Tab), now);
        assert_eq!(app.display_mode(), DisplayMode::Solved);
        assert_eq!(backend.begin_calls(), 1);
        handle_key_event(&mut app, press(KeyCode::Char('l')), now);
        assert_eq!(app.display_mode(), DisplayMode::Live);
        handle_key_event(&mut app, press(KeyCode::Char('2')), now);
        assert_eq!(app.display_mode(), DisplayMode::Solved);
        assert_eq!(backend.begin_calls(), 1);
    }

    #[test]
    fn solve_key_starts_one_attempt() {
        let (mut app, backend, now) = test_app(&["--solve-mode", "manual"]);
        app.begin_session(now);
        handle_key_event(&mut app, press(KeyCode::Char('s')), now);
        handle_key_event(&mut app, press(KeyCode::Char('s')), now);
        assert_eq!(backend.begin_calls(), 1);
    }

    #[test]
    fn draw_shows_solution_readouts() {
        let (mut app, backend, now) = test_app(&["--mode", "solved"]);
        backend.push_status(SolveResult::Solved(solution("10.5", "41.2")));
        app.begin_session(now);
        app.tick(now + Duration::from_millis(200));
        app.tick(now + Duration::from_millis(250));

        let text = screen_text(&app);
        assert!(text.contains("Viewport"));
        assert!(text.contains("Plate Solve"));
        assert!(text.contains("RA: 10.5"));
        assert!(text.contains("Dec: 41.2"));
        assert!(text.contains("Constellation: And"));
        assert!(text.contains("CPU temp: 48.2"));
    }

    #[test]
    fn draw_shows_placeholders_before_first_solve() {
        let (app, _backend, _now) = test_app(&[]);
        let text = screen_text(&app);
        assert!(text.contains("RA: --:--:--.-"));
        assert!(text.contains("Solver: Idle"));
        assert!(text.contains("Attempts: idle #0"));
        assert!(text.contains("Mode: Live"));
    }

    #[test]
    fn draw_shows_phase_of_running_attempt() {
        let (mut app, _backend, now) = test_app(&["--mode", "solved"]);
        app.begin_session(now);
        let text = screen_text(&app);
        assert!(text.contains("Attempts: polling #1"));
    }

    #[test]
    fn fit_width_truncates_with_ellipsis() {
        assert_eq!(fit_width("abcdef", 10), "abcdef");
        assert_eq!(fit_width("abcdef", 4), "abc…");
        assert_eq!(fit_width("abcdef", 0), "");
        assert_eq!(fit_width("日本語", 4), "日…");
    }
}
