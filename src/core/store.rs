//! Mock app store: a static catalog and the browser's navigation state.

use tracing::debug;

use crate::core::catalog::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreApp {
    pub id: &'static str,
    pub name: &'static str,
    pub developer: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub icon: &'static str,
    pub rating: f32,
    pub downloads: &'static str,
    pub size: &'static str,
    pub price: &'static str,
    pub in_app_purchases: bool,
}

pub const FREE: &str = "Free";

pub const CATEGORIES: &[Category] = &[
    Category { id: "productivity", name: "Productivity", icon: "zap", color: Rgb(59, 130, 246) },
    Category { id: "entertainment", name: "Entertainment", icon: "gamepad", color: Rgb(168, 85, 247) },
    Category { id: "education", name: "Education", icon: "book-open", color: Rgb(34, 197, 94) },
    Category { id: "lifestyle", name: "Lifestyle", icon: "heart", color: Rgb(236, 72, 153) },
    Category { id: "photo", name: "Photo & Video", icon: "camera", color: Rgb(249, 115, 22) },
    Category { id: "music", name: "Music", icon: "music", color: Rgb(239, 68, 68) },
];

pub const FEATURED_APPS: &[StoreApp] = &[
    StoreApp {
        id: "1",
        name: "FamilyPhotos",
        developer: "Family Apps",
        description: "Organise and share family photos safely and privately.",
        category: "photo",
        icon: "📸",
        rating: 4.8,
        downloads: "10K+",
        size: "45 MB",
        price: FREE,
        in_app_purchases: true,
    },
    StoreApp {
        id: "2",
        name: "Shared List",
        developer: "Family Apps",
        description: "A shopping list the whole family edits in real time.",
        category: "productivity",
        icon: "🛒",
        rating: 4.6,
        downloads: "25K+",
        size: "12 MB",
        price: FREE,
        in_app_purchases: false,
    },
    StoreApp {
        id: "3",
        name: "Grandma's Recipes",
        developer: "Culinary Dev",
        description: "Thousands of traditional home-cooked recipes.",
        category: "lifestyle",
        icon: "🍲",
        rating: 4.9,
        downloads: "100K+",
        size: "78 MB",
        price: "R$ 9,90",
        in_app_purchases: false,
    },
    StoreApp {
        id: "4",
        name: "MeditationPlus",
        developer: "Wellness Co",
        description: "Guided meditations for the whole family, children included.",
        category: "lifestyle",
        icon: "🧘",
        rating: 4.7,
        downloads: "50K+",
        size: "120 MB",
        price: FREE,
        in_app_purchases: true,
    },
];

pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

pub fn app_by_id(id: &str) -> Option<&'static StoreApp> {
    FEATURED_APPS.iter().find(|a| a.id == id)
}

impl StoreApp {
    pub fn category_name(&self) -> &'static str {
        category_by_id(self.category).map_or("", |c| c.name)
    }

    pub fn is_free(&self) -> bool {
        self.price == FREE
    }

    pub fn purchase_label(&self) -> String {
        if self.is_free() {
            "Install".to_string()
        } else {
            format!("Buy {}", self.price)
        }
    }

    fn matches(&self, needle: &str) -> bool {
        [self.name, self.developer, self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

// ── Browser state ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreTab {
    #[default]
    Featured,
    Categories,
    Search,
}

impl StoreTab {
    pub const ALL: [StoreTab; 3] = [StoreTab::Featured, StoreTab::Categories, StoreTab::Search];

    pub fn label(self) -> &'static str {
        match self {
            StoreTab::Featured => "Featured",
            StoreTab::Categories => "Categories",
            StoreTab::Search => "Search",
        }
    }
}

/// What the browser is showing right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreView<'a> {
    Closed,
    Featured,
    CategoryGrid,
    Category(&'static Category),
    Search(&'a str),
    AppDetail(&'static StoreApp),
}

#[derive(Debug, Clone, Default)]
pub struct StoreBrowser {
    open: bool,
    tab: StoreTab,
    selected_category: Option<&'static Category>,
    selected_app: Option<&'static StoreApp>,
    search_query: String,
}

impl StoreBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn tab(&self) -> StoreTab {
        self.tab
    }

    pub fn selected_category(&self) -> Option<&'static Category> {
        self.selected_category
    }

    pub fn selected_app(&self) -> Option<&'static StoreApp> {
        self.selected_app
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Always starts on Featured with nothing selected.
    pub fn open(&mut self) {
        *self = Self::default();
        self.open = true;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn view(&self) -> StoreView<'_> {
        if !self.open {
            return StoreView::Closed;
        }
        if let Some(app) = self.selected_app {
            return StoreView::AppDetail(app);
        }
        match self.tab {
            StoreTab::Featured => StoreView::Featured,
            StoreTab::Categories => match self.selected_category {
                Some(category) => StoreView::Category(category),
                None => StoreView::CategoryGrid,
            },
            StoreTab::Search => StoreView::Search(&self.search_query),
        }
    }

    /// Tabs are hidden while an app is shown, so this is ignored then.
    pub fn select_tab(&mut self, tab: StoreTab) {
        if !self.open || self.selected_app.is_some() {
            return;
        }
        debug!(tab = tab.label(), "store tab selected");
        self.tab = tab;
    }

    pub fn select_category(&mut self, id: &str) -> bool {
        if !self.open || self.tab != StoreTab::Categories || self.selected_app.is_some() {
            return false;
        }
        match category_by_id(id) {
            Some(category) => {
                self.selected_category = Some(category);
                true
            }
            None => false,
        }
    }

    pub fn select_app(&mut self, id: &str) -> bool {
        if !self.open {
            return false;
        }
        match app_by_id(id) {
            Some(app) => {
                debug!(app = app.id, "store app opened");
                self.selected_app = Some(app);
                true
            }
            None => false,
        }
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    /// Steps back one level. Returns `true` when already at a tab root, so
    /// the caller may close the browser.
    pub fn back(&mut self) -> bool {
        if self.selected_app.take().is_some() {
            return false;
        }
        if self.tab == StoreTab::Categories && self.selected_category.take().is_some() {
            return false;
        }
        true
    }

    /// Apps listed by the current view; empty for the category grid, the
    /// detail view and a blank search.
    pub fn visible_apps(&self) -> Vec<&'static StoreApp> {
        match self.view() {
            StoreView::Featured => FEATURED_APPS.iter().collect(),
            StoreView::Category(category) => FEATURED_APPS
                .iter()
                .filter(|a| a.category == category.id)
                .collect(),
            StoreView::Search(query) => {
                let needle = query.trim().to_lowercase();
                if needle.is_empty() {
                    return Vec::new();
                }
                FEATURED_APPS.iter().filter(|a| a.matches(&needle)).collect()
            }
            StoreView::Closed | StoreView::CategoryGrid | StoreView::AppDetail(_) => Vec::new(),
        }
    }
}
