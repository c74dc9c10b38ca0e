use std::sync::Arc;
use tracing::info;

use crate::config::{HubConfig, IdentityProviderKind};
use crate::core::auth::{InertSession, SessionHandle, SessionManager};
use crate::core::background::SettingsStore;
use crate::core::catalog::{tile_by_id, LauncherLayout, TileAction};
use crate::core::identity::{IdentityProvider, MockIdentityProvider};
use crate::core::store::StoreBrowser;
use crate::storage::SharedStore;

/// Everything the screens share, built once at start-up.
pub struct AppState {
    pub config: HubConfig,
    session: Option<SessionManager>,
    inert: InertSession,
    pub settings: SettingsStore,
    pub store_browser: StoreBrowser,
}

pub fn provider_for(config: &HubConfig) -> Option<Arc<dyn IdentityProvider>> {
    match config.identity_provider {
        IdentityProviderKind::Mock => {
            Some(Arc::new(MockIdentityProvider::new(config.login_delay())))
        }
        IdentityProviderKind::Disabled => None,
    }
}

impl AppState {
    /// Wires the session (when a provider is given) and the settings store to
    /// one shared store, then restores any saved session.
    pub fn new(
        config: HubConfig,
        store: SharedStore,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let session = provider.map(|p| {
            let mut manager = SessionManager::new(Arc::clone(&store), p);
            manager.check_session();
            manager
        });
        match &session {
            Some(m) => info!(provider = m.provider_name(), "session ready"),
            None => info!("no identity provider configured, session is inert"),
        }
        let settings = SettingsStore::load(store, config.max_persisted_background_bytes);
        Self {
            config,
            session,
            inert: InertSession,
            settings,
            store_browser: StoreBrowser::new(),
        }
    }

    pub fn from_config(config: HubConfig, store: SharedStore) -> Self {
        let provider = provider_for(&config);
        Self::new(config, store, provider)
    }

    pub fn session(&self) -> &dyn SessionHandle {
        match &self.session {
            Some(m) => m as &dyn SessionHandle,
            None => &self.inert,
        }
    }

    pub fn session_mut(&mut self) -> &mut dyn SessionHandle {
        match &mut self.session {
            Some(m) => m as &mut dyn SessionHandle,
            None => &mut self.inert,
        }
    }

    pub fn session_manager_mut(&mut self) -> Option<&mut SessionManager> {
        self.session.as_mut()
    }

    /// Applies login completions that have arrived; call once per UI tick.
    pub fn tick(&mut self) {
        if let Some(m) = self.session.as_mut() {
            m.pump();
        }
    }

    pub fn layout_for_width(&self, width: u16) -> LauncherLayout {
        LauncherLayout::for_width(width, self.config.sidebar_min_width)
    }

    /// Runs a tile's action. Plain tiles and unknown ids return `None`.
    pub fn activate_tile(&mut self, id: &str) -> Option<TileAction> {
        let action = tile_by_id(id)?.action?;
        match action {
            TileAction::OpenAppStore => self.store_browser.open(),
            TileAction::OpenSettings => self.session_mut().open_settings(),
        }
        Some(action)
    }
}
