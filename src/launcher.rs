use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;

use homehub::core::catalog::{Direction as Move, Rgb};
use homehub::{
    AppState, AppTile, BackgroundConfig, BackgroundTheme, LauncherLayout, TileAction, HOME_TILES,
};

use crate::status::render_status_bar;
use crate::ui::{
    dim_style, normal_style, pad_horizontal, render_header, render_separator, sel_style,
    title_style, Term,
};

pub enum HomeEvent {
    Open(TileAction),
    Quit,
}

const TILE_HEIGHT: u16 = 4;
const SIDEBAR_WIDTH: u16 = 30;

fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

fn tile_style(tile: &AppTile) -> Style {
    Style::default().fg(rgb(tile.foreground)).bg(rgb(tile.background))
}

pub fn image_label(bg: &BackgroundConfig) -> &'static str {
    if bg.is_inline_image() {
        return "Uploaded image";
    }
    BackgroundTheme::for_url(&bg.image).map_or("Default", BackgroundTheme::label)
}

/// One-line description of the current wallpaper.
pub fn background_summary(bg: &BackgroundConfig) -> String {
    format!(
        "{} | {} | {} | {}%",
        image_label(bg),
        bg.position.as_str(),
        bg.size.as_str(),
        bg.opacity.percent()
    )
}

/// First row to draw so that `selected_row` stays on screen.
fn first_visible_row(selected_row: usize, visible_rows: usize) -> usize {
    selected_row.saturating_sub(visible_rows.saturating_sub(1))
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn render_grid(f: &mut Frame, area: Rect, columns: usize, selected: usize) {
    let visible_rows = (area.height / TILE_HEIGHT).max(1) as usize;
    let first = first_visible_row(selected / columns, visible_rows);
    let cell_width = area.width / columns as u16;

    for (i, tile) in HOME_TILES.iter().enumerate().skip(first * columns) {
        let row = i / columns - first;
        if row >= visible_rows {
            break;
        }
        let col = i % columns;
        let cell = Rect {
            x: area.x + col as u16 * cell_width,
            y: area.y + row as u16 * TILE_HEIGHT,
            width: cell_width,
            height: TILE_HEIGHT,
        };
        let border = if i == selected { title_style() } else { dim_style() };
        let mut label_style = tile_style(tile);
        if i == selected {
            label_style = label_style.add_modifier(Modifier::BOLD);
        }
        let body = vec![
            Line::from(Span::styled(tile.glyph, label_style)),
            Line::from(Span::styled(tile.label, label_style)),
        ];
        let p = Paragraph::new(body)
            .alignment(Alignment::Center)
            .style(tile_style(tile))
            .block(Block::default().borders(Borders::ALL).border_style(border));
        f.render_widget(p, cell);
    }
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &AppState, selected: usize) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(area);

    let visible = cols[0].height.max(1) as usize;
    let first = first_visible_row(selected, visible);
    let lines: Vec<Line> = HOME_TILES
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(i, tile)| {
            let label = if i == selected {
                Span::styled(format!(" > {}", tile.label), sel_style())
            } else {
                Span::styled(format!("   {}", tile.label), normal_style())
            };
            Line::from(vec![Span::styled(format!(" {} ", tile.glyph), tile_style(tile)), label])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), cols[0]);

    let greeting = match app.session().user() {
        Some(user) => match &user.family_name {
            Some(family) => format!("Welcome home, {}", family),
            None => format!("Welcome home, {}", user.name),
        },
        None => "Welcome home".to_string(),
    };
    let panel = vec![
        Line::from(Span::styled(greeting, title_style())),
        Line::from(""),
        Line::from(Span::styled(
            format!("Background: {}", background_summary(app.settings.background())),
            dim_style(),
        )),
    ];
    let p = Paragraph::new(panel)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::LEFT).border_style(dim_style()));
    f.render_widget(p, cols[1]);
}

// ── Home screen ───────────────────────────────────────────────────────────────

/// Tile launcher. Returns when a tile opens another screen or the user quits;
/// `selected` survives between calls.
pub fn home_screen(terminal: &mut Term, app: &mut AppState, selected: &mut usize) -> Result<HomeEvent> {
    let mut notice: Option<String> = None;

    loop {
        app.tick();
        let layout = app.layout_for_width(terminal.size()?.width);
        let user = app.session().user().map(|u| u.name.clone());

        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(size);

            render_header(f, chunks[0]);
            render_separator(f, chunks[1]);

            let body = pad_horizontal(chunks[2]);
            match layout {
                LauncherLayout::Grid { columns } => render_grid(f, body, columns, *selected),
                LauncherLayout::Sidebar => render_sidebar(f, body, &*app, *selected),
            }

            let footer = match &notice {
                Some(msg) => Span::styled(msg.as_str(), normal_style()),
                None => Span::styled("Arrows move | Enter open | q quit", dim_style()),
            };
            f.render_widget(
                Paragraph::new(footer).alignment(Alignment::Center),
                pad_horizontal(chunks[3]),
            );
            render_status_bar(f, chunks[4], user.as_deref());
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let dir = match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Move::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Move::Down),
            KeyCode::Left | KeyCode::Char('h') => Some(Move::Left),
            KeyCode::Right | KeyCode::Char('l') => Some(Move::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            *selected = layout.step(*selected, dir, HOME_TILES.len());
            continue;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                let Some(tile) = HOME_TILES.get(*selected) else { continue };
                notice = None;
                match app.activate_tile(tile.id) {
                    Some(TileAction::OpenSettings) if !app.session().is_settings_open() => {
                        notice = Some("Settings need a sign-in provider.".to_string());
                    }
                    Some(action) => return Ok(HomeEvent::Open(action)),
                    None => notice = Some(format!("{} is not available yet.", tile.label)),
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return Ok(HomeEvent::Quit),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homehub::{BackgroundPosition, BackgroundSize};

    #[test]
    fn summary_names_default_theme_and_upload() {
        let mut bg = BackgroundConfig::default();
        assert_eq!(background_summary(&bg), "Default | center | cover | 100%");

        bg.image = BackgroundTheme::BeachOcean.url().to_string();
        bg.position = BackgroundPosition::Top;
        bg.size = BackgroundSize::Contain;
        assert!(background_summary(&bg).starts_with("Beach and Ocean | top | contain"));

        bg.image = "data:image/png;base64,AAAA".to_string();
        assert!(background_summary(&bg).starts_with("Uploaded image"));
    }

    #[test]
    fn scrolling_keeps_selection_visible() {
        assert_eq!(first_visible_row(0, 3), 0);
        assert_eq!(first_visible_row(2, 3), 0);
        assert_eq!(first_visible_row(4, 3), 2);
        assert_eq!(first_visible_row(4, 0), 4);
    }
}
