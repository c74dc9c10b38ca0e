use anyhow::Result;
use std::path::Path;

use homehub::core::background::MIN_OPACITY;
use homehub::core::ingest::ImageUpload;
use homehub::{AppState, BackgroundPatch, BackgroundTheme, Persistence};

use crate::auth::{account_label, sign_in, sign_out};
use crate::launcher::image_label;
use crate::ui::{flash_error, flash_message, input_prompt, run_menu, run_menu_at, MenuResult, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsRow {
    Account,
    Theme,
    Upload,
    Position,
    Size,
    Opacity,
    Reset,
    Back,
}

// ── Rows ──────────────────────────────────────────────────────────────────────

fn settings_rows(app: &AppState) -> Vec<(String, Option<SettingsRow>)> {
    let bg = app.settings.background();
    vec![
        (account_label(app.session()), Some(SettingsRow::Account)),
        ("---".to_string(), None),
        (format!("Background: {}", image_label(bg)), Some(SettingsRow::Theme)),
        ("Upload Image from File".to_string(), Some(SettingsRow::Upload)),
        (format!("Position: {} [cycle]", bg.position.as_str()), Some(SettingsRow::Position)),
        (format!("Size: {} [cycle]", bg.size.as_str()), Some(SettingsRow::Size)),
        (format!("Opacity: {}% [cycle]", bg.opacity.percent()), Some(SettingsRow::Opacity)),
        ("Restore Default Background".to_string(), Some(SettingsRow::Reset)),
        ("---".to_string(), None),
        ("Back".to_string(), Some(SettingsRow::Back)),
    ]
}

fn selectable_index(rows: &[(String, Option<SettingsRow>)], row: SettingsRow) -> usize {
    rows.iter()
        .filter_map(|(_, r)| *r)
        .position(|r| r == row)
        .unwrap_or(0)
}

/// Next step down in tenths, wrapping from the minimum back to opaque.
fn next_opacity(current: f32) -> f32 {
    let tenths = (current * 10.0).round() as i32 - 1;
    let next = tenths as f32 / 10.0;
    if next < MIN_OPACITY - f32::EPSILON {
        1.0
    } else {
        next
    }
}

fn report(terminal: &mut Term, outcome: Persistence, done: Option<&str>) -> Result<()> {
    match (outcome.notice(), done) {
        (Some(notice), _) => flash_error(terminal, &notice, 2000),
        (None, Some(msg)) => flash_message(terminal, msg, 700),
        (None, None) => Ok(()),
    }
}

// ── Settings screen ───────────────────────────────────────────────────────────

/// Runs while the session's settings modal is open.
pub fn settings_screen(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    let mut cursor = 0usize;

    while app.session().is_settings_open() {
        let rows = settings_rows(app);
        let choices: Vec<&str> = rows.iter().map(|(l, _)| l.as_str()).collect();
        let subtitle = app.session().user().and_then(|u| u.family_name.clone());

        let picked = match run_menu_at(terminal, app, "Settings", &choices, subtitle.as_deref(), cursor)? {
            MenuResult::Back => SettingsRow::Back,
            MenuResult::Selected(label) => {
                match rows.iter().find(|(l, _)| *l == label).and_then(|(_, r)| *r) {
                    Some(row) => row,
                    None => continue,
                }
            }
        };
        cursor = selectable_index(&rows, picked);

        let bg = app.settings.background().clone();
        match picked {
            SettingsRow::Account => {
                if app.session().is_authenticated() {
                    sign_out(terminal, app)?;
                } else {
                    sign_in(terminal, app)?;
                }
            }
            SettingsRow::Theme => theme_menu(terminal, app)?,
            SettingsRow::Upload => upload_dialog(terminal, app)?,
            SettingsRow::Position => {
                let patch = BackgroundPatch::default().position(bg.position.next());
                report(terminal, app.settings.update_background(patch), None)?;
            }
            SettingsRow::Size => {
                let patch = BackgroundPatch::default().size(bg.size.next());
                report(terminal, app.settings.update_background(patch), None)?;
            }
            SettingsRow::Opacity => {
                let patch = BackgroundPatch::default().opacity(next_opacity(bg.opacity.get()));
                report(terminal, app.settings.update_background(patch), None)?;
            }
            SettingsRow::Reset => {
                report(terminal, app.settings.reset_background(), Some("Background restored."))?;
            }
            SettingsRow::Back => app.session_mut().close_settings(),
        }
    }
    Ok(())
}

fn theme_menu(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    let current = BackgroundTheme::for_url(&app.settings.background().image);
    let labels: Vec<String> = BackgroundTheme::ALL
        .iter()
        .map(|t| {
            if Some(*t) == current {
                format!("{} (current)", t.label())
            } else {
                t.label().to_string()
            }
        })
        .collect();
    let mut choices: Vec<&str> = labels.iter().map(String::as_str).collect();
    choices.push("---");
    choices.push("Back");

    let MenuResult::Selected(label) = run_menu(terminal, app, "Background Gallery", &choices, None)? else {
        return Ok(());
    };
    let Some(pos) = labels.iter().position(|l| *l == label) else {
        return Ok(());
    };
    let theme = BackgroundTheme::ALL[pos];
    let done = format!("Background set to {}.", theme.label());
    report(terminal, app.settings.apply_theme(theme), Some(&done))
}

fn upload_dialog(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    let ceiling = app.config.max_upload_bytes;
    let prompt = format!(
        "Path to a PNG or JPEG image (up to {:.0}MB):",
        ceiling as f64 / (1024.0 * 1024.0)
    );
    let Some(path) = input_prompt(terminal, &prompt, "")? else {
        return Ok(());
    };
    if path.is_empty() {
        return Ok(());
    }

    let outcome = ImageUpload::from_path(Path::new(&path))
        .and_then(|upload| app.settings.upload_background(&upload, ceiling));
    match outcome {
        Ok(persisted) => report(terminal, persisted, Some("Background image updated.")),
        Err(err) => flash_error(terminal, &err.user_message(), 2500),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homehub::config::HubConfig;
    use homehub::MemoryStore;

    fn app() -> AppState {
        let config = HubConfig {
            login_delay_ms: 0,
            ..HubConfig::default()
        };
        AppState::from_config(config, MemoryStore::new().shared())
    }

    #[test]
    fn opacity_cycles_down_and_wraps() {
        assert_eq!(next_opacity(1.0), 0.9);
        assert_eq!(next_opacity(0.2), 0.1);
        assert_eq!(next_opacity(0.1), 1.0);
        assert_eq!(next_opacity(0.5), 0.4);
    }

    #[test]
    fn rows_reflect_current_background() {
        let mut app = app();
        let rows = settings_rows(&app);
        let labels: Vec<&str> = rows.iter().map(|(l, _)| l.as_str()).collect();
        assert!(labels.contains(&"Background: Default"));
        assert!(labels.contains(&"Position: center [cycle]"));
        assert!(labels.contains(&"Opacity: 100% [cycle]"));

        let _ = app.settings.apply_theme(BackgroundTheme::ForestTrees);
        let rows = settings_rows(&app);
        assert!(rows.iter().any(|(l, _)| l == "Background: Forest"));
    }

    #[test]
    fn cursor_skips_spacers() {
        let rows = settings_rows(&app());
        assert_eq!(selectable_index(&rows, SettingsRow::Account), 0);
        assert_eq!(selectable_index(&rows, SettingsRow::Theme), 1);
        assert_eq!(selectable_index(&rows, SettingsRow::Back), 7);
    }
}
