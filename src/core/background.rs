use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::core::ingest::{ingest, ImageUpload};
use crate::error::{IngestError, StorageError};
use crate::storage::SharedStore;

pub const BACKGROUND_KEY: &str = "familia_background";
pub const DEFAULT_BACKGROUND_IMAGE: &str = "asset:default-background.png";

pub const MIN_OPACITY: f32 = 0.1;
pub const MAX_OPACITY: f32 = 1.0;

// ── Value types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPosition {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl BackgroundPosition {
    pub const ALL: [BackgroundPosition; 5] = [
        BackgroundPosition::Center,
        BackgroundPosition::Top,
        BackgroundPosition::Bottom,
        BackgroundPosition::Left,
        BackgroundPosition::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundPosition::Center => "center",
            BackgroundPosition::Top => "top",
            BackgroundPosition::Bottom => "bottom",
            BackgroundPosition::Left => "left",
            BackgroundPosition::Right => "right",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundSize {
    #[default]
    Cover,
    Contain,
    Auto,
}

impl BackgroundSize {
    pub const ALL: [BackgroundSize; 3] = [
        BackgroundSize::Cover,
        BackgroundSize::Contain,
        BackgroundSize::Auto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundSize::Cover => "cover",
            BackgroundSize::Contain => "contain",
            BackgroundSize::Auto => "auto",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for BackgroundPosition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for BackgroundSize {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Opacity in `[0.1, 1.0]`. Out-of-range input is clamped, NaN becomes 1.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Opacity(f32);

impl Opacity {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(MAX_OPACITY);
        }
        Self(value.clamp(MIN_OPACITY, MAX_OPACITY))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(MAX_OPACITY)
    }
}

impl From<f32> for Opacity {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Opacity> for f32 {
    fn from(value: Opacity) -> Self {
        value.0
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackgroundConfig {
    pub image: String,
    #[serde(default)]
    pub position: BackgroundPosition,
    #[serde(default)]
    pub size: BackgroundSize,
    #[serde(default)]
    pub opacity: Opacity,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_BACKGROUND_IMAGE.to_string(),
            position: BackgroundPosition::Center,
            size: BackgroundSize::Cover,
            opacity: Opacity::default(),
        }
    }
}

impl BackgroundConfig {
    pub fn is_inline_image(&self) -> bool {
        self.image.starts_with("data:")
    }
}

/// Fields to change; `None` leaves the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundPatch {
    pub image: Option<String>,
    pub position: Option<BackgroundPosition>,
    pub size: Option<BackgroundSize>,
    pub opacity: Option<f32>,
}

impl BackgroundPatch {
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn position(mut self, position: BackgroundPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: BackgroundSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    fn apply(self, cfg: &mut BackgroundConfig) {
        if let Some(image) = self.image {
            cfg.image = image;
        }
        if let Some(position) = self.position {
            cfg.position = position;
        }
        if let Some(size) = self.size {
            cfg.size = size;
        }
        if let Some(opacity) = self.opacity {
            cfg.opacity = Opacity::new(opacity);
        }
    }
}

// ── Theme gallery ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundTheme {
    FamilyGathering,
    NatureLandscape,
    SunsetMountains,
    BeachOcean,
    ForestTrees,
    CitySkyline,
    MinimalAbstract,
}

impl BackgroundTheme {
    pub const ALL: [BackgroundTheme; 7] = [
        BackgroundTheme::FamilyGathering,
        BackgroundTheme::NatureLandscape,
        BackgroundTheme::SunsetMountains,
        BackgroundTheme::BeachOcean,
        BackgroundTheme::ForestTrees,
        BackgroundTheme::CitySkyline,
        BackgroundTheme::MinimalAbstract,
    ];

    /// Query key, e.g. `"nature landscape"`.
    pub fn key(self) -> &'static str {
        match self {
            BackgroundTheme::FamilyGathering => "family gathering",
            BackgroundTheme::NatureLandscape => "nature landscape",
            BackgroundTheme::SunsetMountains => "sunset mountains",
            BackgroundTheme::BeachOcean => "beach ocean",
            BackgroundTheme::ForestTrees => "forest trees",
            BackgroundTheme::CitySkyline => "city skyline",
            BackgroundTheme::MinimalAbstract => "minimal abstract",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BackgroundTheme::FamilyGathering => "Family Gathering",
            BackgroundTheme::NatureLandscape => "Nature Landscape",
            BackgroundTheme::SunsetMountains => "Sunset",
            BackgroundTheme::BeachOcean => "Beach and Ocean",
            BackgroundTheme::ForestTrees => "Forest",
            BackgroundTheme::CitySkyline => "City",
            BackgroundTheme::MinimalAbstract => "Minimal Abstract",
        }
    }

    pub fn url(self) -> &'static str {
        match self {
            BackgroundTheme::FamilyGathering => "https://images.unsplash.com/photo-1722252799088-4781aabc3d0f?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            BackgroundTheme::NatureLandscape => "https://images.unsplash.com/photo-1638544576933-d2bdf36ef947?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            BackgroundTheme::SunsetMountains => "https://images.unsplash.com/photo-1720709626262-34eaf9942e43?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            BackgroundTheme::BeachOcean => "https://images.unsplash.com/photo-1611794416281-6664ddf1a929?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            BackgroundTheme::ForestTrees => "https://images.unsplash.com/photo-1663312790104-c16cd011b761?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            BackgroundTheme::CitySkyline => "https://images.unsplash.com/photo-1619297560564-f183f9b1fb6b?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            BackgroundTheme::MinimalAbstract => "https://images.unsplash.com/photo-1679193559674-860ef78899bc?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
        }
    }

    /// Looks up a query key; anything unknown maps to the nature landscape.
    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .unwrap_or(BackgroundTheme::NatureLandscape)
    }

    pub fn for_url(url: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.url() == url)
    }
}

// ── Persistence outcome ───────────────────────────────────────────────────────

/// Whether a settings change will survive a restart. The live value has
/// changed either way.
#[derive(Debug)]
#[must_use]
pub enum Persistence {
    Saved,
    LiveOnly(StorageError),
}

impl Persistence {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persistence::Saved)
    }

    pub fn notice(&self) -> Option<String> {
        match self {
            Persistence::Saved => None,
            Persistence::LiveOnly(err) if err.is_quota() => Some(
                "The image was applied, but it is too large to be kept after a restart."
                    .to_string(),
            ),
            Persistence::LiveOnly(_) => Some(
                "The background was applied, but it could not be saved.".to_string(),
            ),
        }
    }
}

// ── Settings store ────────────────────────────────────────────────────────────

pub struct SettingsStore {
    store: SharedStore,
    background: BackgroundConfig,
    max_persisted_bytes: usize,
}

impl SettingsStore {
    /// Loads the saved background; a missing or malformed record yields the default.
    pub fn load(store: SharedStore, max_persisted_bytes: usize) -> Self {
        let background = match store.get(BACKGROUND_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(%err, "saved background is malformed, using default");
                BackgroundConfig::default()
            }),
            Ok(None) => BackgroundConfig::default(),
            Err(err) => {
                warn!(%err, "could not read saved background, using default");
                BackgroundConfig::default()
            }
        };
        Self {
            store,
            background,
            max_persisted_bytes,
        }
    }

    pub fn background(&self) -> &BackgroundConfig {
        &self.background
    }

    pub fn update_background(&mut self, patch: BackgroundPatch) -> Persistence {
        patch.apply(&mut self.background);
        debug!(
            position = self.background.position.as_str(),
            size = self.background.size.as_str(),
            opacity = self.background.opacity.get(),
            "background updated"
        );
        self.persist()
    }

    pub fn reset_background(&mut self) -> Persistence {
        self.background = BackgroundConfig::default();
        self.persist()
    }

    pub fn apply_theme(&mut self, theme: BackgroundTheme) -> Persistence {
        self.update_background(BackgroundPatch::default().image(theme.url()))
    }

    /// Validates and inlines an uploaded image, then applies it. A rejected
    /// upload leaves the background unchanged.
    pub fn upload_background(
        &mut self,
        upload: &ImageUpload,
        ceiling: u64,
    ) -> Result<Persistence, IngestError> {
        let data_url = ingest(upload, ceiling)?;
        Ok(self.update_background(BackgroundPatch::default().image(data_url)))
    }

    fn persist(&self) -> Persistence {
        let json = match serde_json::to_string(&self.background) {
            Ok(json) => json,
            Err(err) => return Persistence::LiveOnly(err.into()),
        };
        let needed = BACKGROUND_KEY.len() + json.len();
        if needed > self.max_persisted_bytes {
            warn!(needed, limit = self.max_persisted_bytes, "background too large to persist");
            return Persistence::LiveOnly(StorageError::QuotaExceeded {
                needed,
                limit: self.max_persisted_bytes,
            });
        }
        match self.store.set(BACKGROUND_KEY, &json) {
            Ok(()) => Persistence::Saved,
            Err(err) => {
                warn!(%err, "could not persist background");
                Persistence::LiveOnly(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    const MIB: usize = 1024 * 1024;

    fn settings(store: &SharedStore) -> SettingsStore {
        SettingsStore::load(Arc::clone(store), 2 * MIB)
    }

    #[test]
    fn defaults_when_nothing_saved() {
        let store = MemoryStore::new().shared();
        assert_eq!(settings(&store).background(), &BackgroundConfig::default());
    }

    #[test]
    fn opacity_outside_range_is_clamped() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        for (input, expected) in [(0.0, 0.1), (-3.0, 0.1), (1.5, 1.0), (42.0, 1.0)] {
            let _ = s.update_background(BackgroundPatch::default().opacity(input));
            assert_eq!(s.background().opacity.get(), expected, "input {input}");
        }
    }

    #[test]
    fn opacity_inside_range_passes_through() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        for input in [0.1, 0.35, 0.5, 1.0] {
            let _ = s.update_background(BackgroundPatch::default().opacity(input));
            assert_eq!(s.background().opacity.get(), input);
        }
    }

    #[test]
    fn nan_opacity_becomes_opaque() {
        assert_eq!(Opacity::new(f32::NAN).get(), 1.0);
    }

    #[test]
    fn update_merges_instead_of_replacing() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        let _ = s.update_background(
            BackgroundPatch::default()
                .image("https://example.com/a.jpg")
                .position(BackgroundPosition::Top)
                .size(BackgroundSize::Contain),
        );
        let before = s.background().clone();

        let outcome = s.update_background(BackgroundPatch::default().opacity(0.5));
        assert!(outcome.is_saved());
        let after = s.background();
        assert_eq!(after.opacity.get(), 0.5);
        assert_eq!(after.image, before.image);
        assert_eq!(after.position, before.position);
        assert_eq!(after.size, before.size);
    }

    #[test]
    fn saved_background_is_reloaded() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        let _ = s.apply_theme(BackgroundTheme::BeachOcean);
        let reloaded = settings(&store);
        assert_eq!(reloaded.background().image, BackgroundTheme::BeachOcean.url());
    }

    #[test]
    fn reset_restores_and_persists_default() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        let _ = s.update_background(BackgroundPatch::default().opacity(0.3).size(BackgroundSize::Auto));
        assert!(s.reset_background().is_saved());
        assert_eq!(s.background(), &BackgroundConfig::default());
        assert_eq!(settings(&store).background(), &BackgroundConfig::default());
    }

    #[test]
    fn malformed_saved_background_falls_back_to_default() {
        let store = MemoryStore::new().shared();
        store.set(BACKGROUND_KEY, r#"{"image": 12, "position": "sideways"}"#).unwrap();
        assert_eq!(settings(&store).background(), &BackgroundConfig::default());
    }

    #[test]
    fn stored_out_of_range_opacity_is_clamped_on_load() {
        let store = MemoryStore::new().shared();
        store
            .set(BACKGROUND_KEY, r#"{"image":"x","position":"left","size":"auto","opacity":7}"#)
            .unwrap();
        let s = settings(&store);
        assert_eq!(s.background().opacity.get(), 1.0);
        assert_eq!(s.background().position, BackgroundPosition::Left);
    }

    #[test]
    fn oversized_config_applies_live_but_reports_not_saved() {
        let store = MemoryStore::new().shared();
        let mut s = SettingsStore::load(Arc::clone(&store), 256);
        let big = format!("data:image/png;base64,{}", "A".repeat(1024));
        let outcome = s.update_background(BackgroundPatch::default().image(big.clone()));
        assert!(!outcome.is_saved());
        assert!(outcome.notice().is_some_and(|n| n.contains("too large")));
        assert_eq!(s.background().image, big);
        assert_eq!(store.get(BACKGROUND_KEY).unwrap(), None);
    }

    #[test]
    fn store_quota_failure_is_reported_and_live_value_kept() {
        let store = MemoryStore::with_quota(64).shared();
        let mut s = SettingsStore::load(Arc::clone(&store), 2 * MIB);
        let outcome = s.apply_theme(BackgroundTheme::CitySkyline);
        assert!(matches!(outcome, Persistence::LiveOnly(ref e) if e.is_quota()));
        assert_eq!(s.background().image, BackgroundTheme::CitySkyline.url());
    }

    #[test]
    fn oversized_upload_leaves_image_unchanged() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        let before = s.background().image.clone();
        let upload = ImageUpload::new("huge.png", vec![0u8; 3 * MIB]);
        let err = s.upload_background(&upload, 2 * MIB as u64).unwrap_err();
        assert!(err.user_message().contains("too large"));
        assert_eq!(s.background().image, before);
    }

    #[test]
    fn accepted_upload_becomes_inline_image() {
        let store = MemoryStore::new().shared();
        let mut s = settings(&store);
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let outcome = s
            .upload_background(&ImageUpload::new("tiny.png", png), 2 * MIB as u64)
            .unwrap();
        assert!(outcome.is_saved());
        assert!(s.background().is_inline_image());
        assert!(s.background().image.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn enums_parse_only_listed_names() {
        assert_eq!("bottom".parse::<BackgroundPosition>(), Ok(BackgroundPosition::Bottom));
        assert!("middle".parse::<BackgroundPosition>().is_err());
        assert_eq!("contain".parse::<BackgroundSize>(), Ok(BackgroundSize::Contain));
        assert!("stretch".parse::<BackgroundSize>().is_err());
        assert_eq!(BackgroundPosition::Right.next(), BackgroundPosition::Center);
        assert_eq!(BackgroundSize::Auto.next(), BackgroundSize::Cover);
    }

    #[test]
    fn unknown_theme_falls_back_to_nature() {
        assert_eq!(BackgroundTheme::from_key("volcano"), BackgroundTheme::NatureLandscape);
        assert_eq!(BackgroundTheme::from_key("city skyline"), BackgroundTheme::CitySkyline);
        let url = BackgroundTheme::ForestTrees.url();
        assert_eq!(BackgroundTheme::for_url(url), Some(BackgroundTheme::ForestTrees));
    }
}
