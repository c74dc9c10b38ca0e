use anyhow::Result;
use crossterm::event;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
};
use std::time::Duration;

use homehub::{AppState, SessionHandle};

use crate::status::render_status_bar;
use crate::ui::{flash_error, flash_message, normal_style, pad_horizontal, render_header, Term};

const SPINNER: &[char] = &['|', '/', '-', '\\'];

/// Settings row describing the signed-in account.
pub fn account_label(session: &dyn SessionHandle) -> String {
    match session.user() {
        Some(user) => format!("Account: {} <{}> [sign out]", user.name, user.email),
        None => "Account: not signed in [sign in with Google]".to_string(),
    }
}

/// Starts a login and spins until the session settles, then reports the
/// outcome.
pub fn sign_in(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    if app.session_mut().login().is_none() {
        return flash_error(terminal, "Sign-in is not available.", 1200);
    }

    let mut frame = 0usize;
    while app.session().is_loading() {
        app.tick();
        let glyph = SPINNER[frame % SPINNER.len()];
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
                .split(f.area());
            render_header(f, chunks[0]);
            let p = Paragraph::new(format!("\n{glyph} Signing in with Google..."))
                .alignment(Alignment::Center)
                .style(normal_style());
            f.render_widget(p, pad_horizontal(chunks[1]));
            render_status_bar(f, chunks[2], None);
        })?;
        frame += 1;
        // Keys pressed while waiting are dropped.
        if event::poll(Duration::from_millis(80))? {
            let _ = event::read()?;
        }
    }

    let session = app.session();
    match (session.user(), session.error()) {
        (_, Some(err)) => flash_error(terminal, err, 1500),
        (Some(user), None) => flash_message(terminal, &format!("Welcome, {}!", user.name), 1000),
        (None, None) => Ok(()),
    }
}

pub fn sign_out(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    app.session_mut().logout();
    flash_message(terminal, "Signed out.", 800)
}
