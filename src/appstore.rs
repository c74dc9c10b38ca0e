use anyhow::Result;

use homehub::core::store::{StoreApp, CATEGORIES};
use homehub::{AppState, StoreBrowser, StoreTab, StoreView};

use crate::ui::{flash_message, input_prompt, run_menu, MenuResult, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreRow {
    Tab(StoreTab),
    Category(&'static str),
    App(&'static str),
    EditSearch,
    Purchase(&'static str),
    Back,
    Close,
}

struct StorePage {
    title: String,
    subtitle: Option<String>,
    rows: Vec<(String, Option<StoreRow>)>,
}

impl StorePage {
    fn row_for(&self, label: &str) -> Option<StoreRow> {
        self.rows.iter().find(|(l, _)| l == label).and_then(|(_, r)| *r)
    }
}

fn spacer() -> (String, Option<StoreRow>) {
    ("---".to_string(), None)
}

fn app_row(app: &'static StoreApp) -> (String, Option<StoreRow>) {
    let label = format!("{} {}  {:.1}*  {}", app.icon, app.name, app.rating, app.price);
    (label, Some(StoreRow::App(app.id)))
}

fn tab_rows(current: StoreTab) -> Vec<(String, Option<StoreRow>)> {
    StoreTab::ALL
        .into_iter()
        .filter(|t| *t != current)
        .map(|t| (format!("Go to {}", t.label()), Some(StoreRow::Tab(t))))
        .collect()
}

// ── Page model ────────────────────────────────────────────────────────────────

fn store_page(browser: &StoreBrowser) -> StorePage {
    let mut rows = Vec::new();
    let mut subtitle = None;

    let title = match browser.view() {
        StoreView::Closed => "App Store".to_string(),
        StoreView::Featured => {
            rows.extend(browser.visible_apps().into_iter().map(app_row));
            rows.push(spacer());
            rows.extend(tab_rows(StoreTab::Featured));
            "App Store | Featured".to_string()
        }
        StoreView::CategoryGrid => {
            rows.extend(
                CATEGORIES
                    .iter()
                    .map(|c| (c.name.to_string(), Some(StoreRow::Category(c.id)))),
            );
            rows.push(spacer());
            rows.extend(tab_rows(StoreTab::Categories));
            "App Store | Categories".to_string()
        }
        StoreView::Category(category) => {
            let apps = browser.visible_apps();
            if apps.is_empty() {
                subtitle = Some("No apps in this category yet.".to_string());
            }
            rows.extend(apps.into_iter().map(app_row));
            rows.push(spacer());
            rows.push(("Back".to_string(), Some(StoreRow::Back)));
            format!("App Store | {}", category.name)
        }
        StoreView::Search(query) => {
            let apps = browser.visible_apps();
            if query.trim().is_empty() {
                subtitle = Some("Search by name, developer or description.".to_string());
            } else if apps.is_empty() {
                subtitle = Some(format!("No apps match \"{}\".", query.trim()));
            }
            rows.push((format!("Search: {query} [edit]"), Some(StoreRow::EditSearch)));
            rows.extend(apps.into_iter().map(app_row));
            rows.push(spacer());
            rows.extend(tab_rows(StoreTab::Search));
            "App Store | Search".to_string()
        }
        StoreView::AppDetail(app) => {
            let mut meta = format!(
                "{} | {} | {:.1}* | {} downloads | {}",
                app.developer,
                app.category_name(),
                app.rating,
                app.downloads,
                app.size
            );
            if app.in_app_purchases {
                meta.push_str(" | in-app purchases");
            }
            subtitle = Some(format!("{}\n{meta}", app.description));
            rows.push((app.purchase_label(), Some(StoreRow::Purchase(app.id))));
            rows.push(spacer());
            rows.push(("Back".to_string(), Some(StoreRow::Back)));
            format!("{} {}", app.icon, app.name)
        }
    };
    rows.push(("Close Store".to_string(), Some(StoreRow::Close)));

    StorePage { title, subtitle, rows }
}

// ── Store screen ──────────────────────────────────────────────────────────────

/// Runs until the browser is closed. Esc steps back one level and closes the
/// store from a tab root.
pub fn app_store_screen(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    while app.store_browser.is_open() {
        let page = store_page(&app.store_browser);
        let choices: Vec<&str> = page.rows.iter().map(|(l, _)| l.as_str()).collect();

        let row = match run_menu(terminal, app, &page.title, &choices, page.subtitle.as_deref())? {
            MenuResult::Back => StoreRow::Back,
            MenuResult::Selected(label) => match page.row_for(&label) {
                Some(row) => row,
                None => continue,
            },
        };

        let browser = &mut app.store_browser;
        match row {
            StoreRow::Tab(tab) => {
                browser.select_tab(tab);
                if tab == StoreTab::Search && browser.search_query().is_empty() {
                    edit_search(terminal, browser)?;
                }
            }
            StoreRow::Category(id) => {
                browser.select_category(id);
            }
            StoreRow::App(id) => {
                browser.select_app(id);
            }
            StoreRow::EditSearch => edit_search(terminal, browser)?,
            StoreRow::Purchase(_) => {
                flash_message(terminal, "Installing is not available in this preview.", 1200)?;
            }
            StoreRow::Back => {
                if browser.back() {
                    browser.close();
                }
            }
            StoreRow::Close => browser.close(),
        }
    }
    Ok(())
}

fn edit_search(terminal: &mut Term, browser: &mut StoreBrowser) -> Result<()> {
    let current = browser.search_query().to_string();
    if let Some(query) = input_prompt(terminal, "Search apps:", &current)? {
        browser.set_search_query(&query);
    }
    Ok(())
}
