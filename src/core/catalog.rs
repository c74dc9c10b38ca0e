//! The launcher's shortcut tiles.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileAction {
    OpenAppStore,
    OpenSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppTile {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub glyph: &'static str,
    pub background: Rgb,
    pub foreground: Rgb,
    pub action: Option<TileAction>,
}

const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);

const fn tile(
    id: &'static str,
    label: &'static str,
    icon: &'static str,
    glyph: &'static str,
    background: Rgb,
    foreground: Rgb,
) -> AppTile {
    AppTile {
        id,
        label,
        icon,
        glyph,
        background,
        foreground,
        action: None,
    }
}

pub const HOME_TILES: &[AppTile] = &[
    AppTile {
        action: Some(TileAction::OpenAppStore),
        ..tile("app-store", "App Store", "shopping-bag", "$", Rgb(29, 78, 216), WHITE)
    },
    AppTile {
        action: Some(TileAction::OpenSettings),
        ..tile("settings", "Settings", "settings", "*", Rgb(55, 65, 81), WHITE)
    },
    tile("who-we-are", "Who We Are", "users", "W", Rgb(250, 204, 21), Rgb(220, 38, 38)),
    tile("meditation", "Weekly Meditation", "brain", "M", WHITE, BLACK),
    tile("contribute", "Contribute", "heart", "+", WHITE, Rgb(239, 68, 68)),
    tile("join-us", "Join Us", "user-plus", "J", Rgb(17, 24, 39), Rgb(96, 165, 250)),
    tile("theme-of-the-year", "Theme of the Year", "calendar", "T", Rgb(34, 197, 94), WHITE),
    tile("kids", "Kids", "baby", "K", WHITE, BLACK),
    tile("bible", "Bible App", "book", "B", Rgb(185, 28, 28), WHITE),
    tile("small-groups", "Small Groups", "users-round", "G", WHITE, BLACK),
    tile("whatsapp", "WhatsApp Group", "message-circle", "@", Rgb(34, 197, 94), WHITE),
    tile("instagram", "Insta", "instagram", "I", Rgb(236, 72, 153), WHITE),
    tile("youtube", "YouTube", "youtube", ">", Rgb(220, 38, 38), WHITE),
    tile("podcast", "Podcast", "headphones", "P", Rgb(249, 115, 22), WHITE),
    tile("family-calendar", "Family Calendar", "calendar-days", "C", WHITE, Rgb(37, 99, 235)),
    tile("playlist", "Music Playlist", "music", "~", Rgb(239, 68, 68), WHITE),
    tile("sozo", "SOZO", "sparkles", "S", WHITE, BLACK),
    tile("pause-for-one", "Pause for One", "pause-circle", "=", Rgb(21, 128, 61), WHITE),
];

pub fn tile_by_id(id: &str) -> Option<&'static AppTile> {
    HOME_TILES.iter().find(|t| t.id == id)
}

// ── Layout ────────────────────────────────────────────────────────────────────

pub const GRID_COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherLayout {
    Grid { columns: usize },
    Sidebar,
}

impl LauncherLayout {
    pub fn for_width(width: u16, sidebar_min_width: u16) -> Self {
        if width >= sidebar_min_width {
            LauncherLayout::Sidebar
        } else {
            LauncherLayout::Grid {
                columns: GRID_COLUMNS,
            }
        }
    }

    pub fn is_sidebar(self) -> bool {
        matches!(self, LauncherLayout::Sidebar)
    }

    /// Moves a tile selection by one step in `dir`, staying inside the catalog.
    pub fn step(self, idx: usize, dir: Direction, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let last = len - 1;
        match (self, dir) {
            (LauncherLayout::Sidebar, Direction::Up | Direction::Left) => idx.saturating_sub(1),
            (LauncherLayout::Sidebar, Direction::Down | Direction::Right) => (idx + 1).min(last),
            (LauncherLayout::Grid { .. }, Direction::Left) => idx.saturating_sub(1),
            (LauncherLayout::Grid { .. }, Direction::Right) => (idx + 1).min(last),
            (LauncherLayout::Grid { columns }, Direction::Up) => {
                idx.checked_sub(columns).unwrap_or(idx)
            }
            (LauncherLayout::Grid { columns }, Direction::Down) => {
                let next = idx + columns;
                if next <= last {
                    next
                } else {
                    idx
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tile_ids_are_unique() {
        let ids: HashSet<&str> = HOME_TILES.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), HOME_TILES.len());
    }

    #[test]
    fn only_store_and_settings_carry_actions() {
        let with_actions: Vec<_> = HOME_TILES
            .iter()
            .filter_map(|t| t.action.map(|a| (t.id, a)))
            .collect();
        assert_eq!(
            with_actions,
            vec![
                ("app-store", TileAction::OpenAppStore),
                ("settings", TileAction::OpenSettings)
            ]
        );
        assert_eq!(tile_by_id("kids").map(|t| t.label), Some("Kids"));
        assert!(tile_by_id("missing").is_none());
    }

    #[test]
    fn layout_switches_at_breakpoint() {
        assert_eq!(LauncherLayout::for_width(99, 100), LauncherLayout::Grid { columns: 4 });
        assert!(LauncherLayout::for_width(100, 100).is_sidebar());
    }

    #[test]
    fn grid_navigation_moves_by_rows_and_stays_in_bounds() {
        let grid = LauncherLayout::Grid { columns: 4 };
        assert_eq!(grid.step(1, Direction::Down, 18), 5);
        assert_eq!(grid.step(1, Direction::Up, 18), 1);
        assert_eq!(grid.step(15, Direction::Down, 18), 15);
        assert_eq!(grid.step(17, Direction::Right, 18), 17);
        assert_eq!(grid.step(0, Direction::Left, 18), 0);
        assert_eq!(LauncherLayout::Sidebar.step(3, Direction::Down, 18), 4);
        assert_eq!(LauncherLayout::Sidebar.step(0, Direction::Up, 0), 0);
    }
}
