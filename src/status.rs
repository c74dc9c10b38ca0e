use chrono::Local;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::sel_style;

// ── Status bar ────────────────────────────────────────────────────────────────

pub fn render_status_bar(f: &mut Frame, area: Rect, user: Option<&str>) {
    if area.height == 0 { return; }

    let now = Local::now().format("%A, %d. %B - %I:%M%p").to_string();
    let who = user.map(|u| format!("{u} ")).unwrap_or_else(|| "Not signed in ".to_string());

    let left  = Span::styled(format!(" {now}"), sel_style());
    let right = Span::styled(who.clone(), sel_style());

    let used = now.chars().count() + 1 + who.chars().count();
    let pad  = " ".repeat((area.width as usize).saturating_sub(used));

    let line = Line::from(vec![left, Span::styled(pad, sel_style()), right]);
    f.render_widget(Paragraph::new(line), area);
}
