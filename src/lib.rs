//! Client state for the home screen: session, background settings, the tile
//! catalog and the mock app store's navigation.

pub mod config;
pub mod core;
pub mod error;
pub mod state;
pub mod storage;

pub use crate::core::auth::{InertSession, SessionHandle, SessionManager, SessionPhase, User};
pub use crate::core::background::{
    BackgroundConfig, BackgroundPatch, BackgroundPosition, BackgroundSize, BackgroundTheme,
    Persistence, SettingsStore,
};
pub use crate::core::catalog::{AppTile, LauncherLayout, TileAction, HOME_TILES};
pub use crate::core::identity::{IdentityProvider, MockIdentityProvider};
pub use crate::core::store::{StoreBrowser, StoreTab, StoreView};
pub use crate::state::AppState;
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore, SharedStore};
