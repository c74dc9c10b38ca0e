use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::time::Duration;

use homehub::AppState;

use crate::status::render_status_bar;

pub type Term = Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>;

pub const HEADER_LINES: &[&str] = &["HOMEHUB", "Family home screen", ""];

// ── Padding ───────────────────────────────────────────────────────────────────
// Horizontal padding applied to every screen so text never touches the edges.
const H_PAD: u16 = 3;

/// Shrink a rect by H_PAD columns on each side.
pub fn pad_horizontal(area: Rect) -> Rect {
    let pad = H_PAD.min(area.width / 2);
    Rect {
        x: area.x + pad,
        y: area.y,
        width: area.width.saturating_sub(pad * 2),
        height: area.height,
    }
}

// ── Color helpers ─────────────────────────────────────────────────────────────

const ACCENT: Color = Color::Rgb(96, 165, 250);

pub fn normal_style() -> Style { Style::default().fg(Color::White) }
pub fn sel_style()    -> Style { Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD) }
pub fn title_style()  -> Style { Style::default().fg(ACCENT).add_modifier(Modifier::BOLD) }
pub fn dim_style()    -> Style { Style::default().fg(Color::Gray).add_modifier(Modifier::DIM) }
pub fn error_style()  -> Style { Style::default().fg(Color::LightRed) }

// ── Header ────────────────────────────────────────────────────────────────────

pub fn render_header(f: &mut Frame, area: Rect) {
    let inner = pad_horizontal(area);
    let lines: Vec<Line> = HEADER_LINES
        .iter()
        .map(|l| Line::from(Span::styled(*l, title_style())))
        .collect();
    let p = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(p, inner);
}

pub fn render_separator(f: &mut Frame, area: Rect) {
    let inner = pad_horizontal(area);
    let sep = "─".repeat(inner.width as usize);
    let p = Paragraph::new(sep).alignment(Alignment::Center).style(dim_style());
    f.render_widget(p, inner);
}

// ── Menu ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuResult {
    Selected(String),
    Back,
}

/// Arrow-key menu. `"---"` entries render as spacers and cannot be selected.
/// Login completions keep being applied while the menu waits for input.
pub fn run_menu(
    terminal: &mut Term,
    app: &mut AppState,
    title: &str,
    choices: &[&str],
    subtitle: Option<&str>,
) -> Result<MenuResult> {
    run_menu_at(terminal, app, title, choices, subtitle, 0)
}

/// Same as [`run_menu`], starting on the `start`-th selectable entry.
pub fn run_menu_at(
    terminal: &mut Term,
    app: &mut AppState,
    title: &str,
    choices: &[&str],
    subtitle: Option<&str>,
    start: usize,
) -> Result<MenuResult> {
    let selectable: Vec<&str> = choices.iter().copied().filter(|c| *c != "---").collect();
    let mut idx = start.min(selectable.len().saturating_sub(1));

    loop {
        app.tick();
        let user = app.session().user().map(|u| u.name.clone());
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    if subtitle.is_some() { Constraint::Length(2) } else { Constraint::Length(0) },
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(size);

            render_header(f, chunks[0]);
            render_separator(f, chunks[1]);

            let title_area = pad_horizontal(chunks[2]);
            let title_p = Paragraph::new(title).alignment(Alignment::Center).style(title_style());
            f.render_widget(title_p, title_area);
            render_separator(f, chunks[3]);

            if let Some(sub) = subtitle {
                let sub_area = pad_horizontal(chunks[4]);
                let sp = Paragraph::new(Span::styled(sub, dim_style())).alignment(Alignment::Left);
                f.render_widget(sp, sub_area);
            }

            let content_area = pad_horizontal(chunks[5]);
            let mut lines: Vec<Line> = Vec::new();
            for &choice in choices {
                if choice == "---" {
                    lines.push(Line::from(Span::styled("", dim_style())));
                    continue;
                }
                let selected = selectable.get(idx).copied() == Some(choice);
                if selected {
                    lines.push(Line::from(Span::styled(format!("  > {choice}"), sel_style())));
                } else {
                    lines.push(Line::from(Span::styled(format!("    {choice}"), normal_style())));
                }
            }
            f.render_widget(Paragraph::new(lines), content_area);

            render_status_bar(f, chunks[6], user.as_deref());
        })?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press { continue; }
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        idx = idx.saturating_sub(1);
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        if !selectable.is_empty() {
                            idx = (idx + 1).min(selectable.len() - 1);
                        }
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        if let Some(&sel) = selectable.get(idx) {
                            return Ok(MenuResult::Selected(sel.to_string()));
                        }
                    }
                    KeyCode::Char('q') | KeyCode::Esc | KeyCode::Tab => {
                        return Ok(MenuResult::Back);
                    }
                    _ => {}
                }
            }
        }
    }
}

// ── Text input ────────────────────────────────────────────────────────────────

pub fn input_prompt(terminal: &mut Term, prompt: &str, initial: &str) -> Result<Option<String>> {
    let mut buf = initial.to_string();

    loop {
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(size);

            render_header(f, chunks[0]);
            render_separator(f, chunks[1]);

            let content_area = pad_horizontal(chunks[2]);
            let display = format!("{prompt}\n\n  > {buf}█");
            f.render_widget(Paragraph::new(display).style(normal_style()), content_area);
            render_status_bar(f, chunks[3], None);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press { continue; }
                match key.code {
                    KeyCode::Enter => return Ok(Some(buf.trim().to_string())),
                    KeyCode::Esc => return Ok(None),
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Char(c) if (c as u32) >= 32 => buf.push(c),
                    _ => {}
                }
            }
        }
    }
}

// ── Message flash ─────────────────────────────────────────────────────────────

pub fn flash_message(terminal: &mut Term, message: &str, ms: u64) -> Result<()> {
    flash_styled(terminal, message, ms, normal_style())
}

pub fn flash_error(terminal: &mut Term, message: &str, ms: u64) -> Result<()> {
    flash_styled(terminal, message, ms, error_style())
}

fn flash_styled(terminal: &mut Term, message: &str, ms: u64, style: Style) -> Result<()> {
    terminal.draw(|f| {
        let size = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
            .split(size);
        render_header(f, chunks[0]);
        let content_area = pad_horizontal(chunks[1]);
        f.render_widget(Paragraph::new(format!("\n  {message}")).style(style), content_area);
        render_status_bar(f, chunks[2], None);
    })?;
    std::thread::sleep(Duration::from_millis(ms));
    Ok(())
}
