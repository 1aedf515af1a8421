//! The closed registry of synchronizable content modules.
//!
//! Every module key that crosses the API boundary is parsed into a
//! [`SyncModule`] exactly once, via [`resolve_scope`]. Internal code works
//! with the enum and with [`ModuleScope`], never with raw strings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One named content category with its own draft table and sync rules.
///
/// Variant order is the registry order (the order keys are accepted and
/// listed in). The order modules are synced and reported in is
/// [`SyncModule::CANONICAL_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncModule {
    VersionNames,
    AppUiFields,
    Banners,
    Identities,
    Scenes,
    ClothesCategories,
    PhotoHobbies,
    ConfigExtraSteps,
}

impl SyncModule {
    /// Every module, in registry order.
    pub const ALL: [SyncModule; 8] = [
        Self::VersionNames,
        Self::AppUiFields,
        Self::Banners,
        Self::Identities,
        Self::Scenes,
        Self::ClothesCategories,
        Self::PhotoHobbies,
        Self::ConfigExtraSteps,
    ];

    /// The order in which modules are pushed, tracked and reported.
    pub const CANONICAL_ORDER: [SyncModule; 8] = [
        Self::VersionNames,
        Self::Banners,
        Self::Identities,
        Self::Scenes,
        Self::AppUiFields,
        Self::ConfigExtraSteps,
        Self::ClothesCategories,
        Self::PhotoHobbies,
    ];

    /// Module key as used on the wire, in job rows and in audit details.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VersionNames => "version_names",
            Self::AppUiFields => "app_ui_fields",
            Self::Banners => "banners",
            Self::Identities => "identities",
            Self::Scenes => "scenes",
            Self::ClothesCategories => "clothes_categories",
            Self::PhotoHobbies => "photo_hobbies",
            Self::ConfigExtraSteps => "config_extra_steps",
        }
    }

    /// Parse a module key after trimming and lower-casing it.
    pub fn parse(key: &str) -> Option<Self> {
        let normalized = key.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|module| module.as_str() == normalized)
    }

    /// Draft table backing this module's rows.
    ///
    /// `version_names` lives on the draft version row itself.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::VersionNames => "draft_versions",
            Self::AppUiFields => "draft_app_ui_fields",
            Self::Banners => "draft_banners",
            Self::Identities => "draft_identities",
            Self::Scenes => "draft_scenes",
            Self::ClothesCategories => "draft_clothes_categories",
            Self::PhotoHobbies => "draft_photo_hobbies",
            Self::ConfigExtraSteps => "draft_config_extra_steps",
        }
    }

    /// Columns of this module's table that may hold a media path.
    pub fn media_columns(self) -> &'static [&'static str] {
        match self {
            Self::VersionNames => &[],
            Self::AppUiFields => &["step1_music", "step2_music"],
            Self::Banners | Self::Identities => &["image"],
            Self::Scenes => &["image", "music", "watermark_path"],
            Self::ClothesCategories | Self::PhotoHobbies => &["image", "music"],
            Self::ConfigExtraSteps => &["music"],
        }
    }
}

impl std::fmt::Display for SyncModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which modules a sync call covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleScope {
    /// Every registered module.
    All,
    /// An explicit, non-empty selection.
    Subset(BTreeSet<SyncModule>),
}

impl ModuleScope {
    /// The covered modules in canonical order.
    pub fn modules(&self) -> Vec<SyncModule> {
        match self {
            Self::All => SyncModule::CANONICAL_ORDER.to_vec(),
            Self::Subset(set) => SyncModule::CANONICAL_ORDER
                .into_iter()
                .filter(|m| set.contains(m))
                .collect(),
        }
    }

    pub fn contains(&self, module: SyncModule) -> bool {
        match self {
            Self::All => true,
            Self::Subset(set) => set.contains(&module),
        }
    }

    /// Module keys in canonical order, as sent to the remote API.
    pub fn keys(&self) -> Vec<String> {
        self.modules()
            .into_iter()
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Resolve caller-supplied module keys into a [`ModuleScope`].
///
/// Blank entries are ignored. An empty selection means every module.
/// Unknown keys are rejected together in a single validation error.
pub fn resolve_scope(keys: &[String]) -> Result<ModuleScope, CoreError> {
    let mut selected = BTreeSet::new();
    let mut unknown = Vec::new();

    for key in keys {
        if key.trim().is_empty() {
            continue;
        }
        match SyncModule::parse(key) {
            Some(module) => {
                selected.insert(module);
            }
            None => unknown.push(key.trim().to_string()),
        }
    }

    if !unknown.is_empty() {
        return Err(CoreError::Validation(format!(
            "Unknown modules: {}. Must be one of: {}",
            unknown.join(", "),
            SyncModule::ALL.map(SyncModule::as_str).join(", ")
        )));
    }

    if selected.is_empty() {
        Ok(ModuleScope::All)
    } else {
        Ok(ModuleScope::Subset(selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_selection_is_all_modules_in_canonical_order() {
        let scope = resolve_scope(&[]).unwrap();
        assert_eq!(scope, ModuleScope::All);
        assert_eq!(
            scope.keys(),
            vec![
                "version_names",
                "banners",
                "identities",
                "scenes",
                "app_ui_fields",
                "config_extra_steps",
                "clothes_categories",
                "photo_hobbies",
            ]
        );
    }

    #[test]
    fn blank_entries_count_as_empty() {
        let scope = resolve_scope(&keys(&["", "  "])).unwrap();
        assert_eq!(scope, ModuleScope::All);
    }

    #[test]
    fn keys_are_normalized_and_deduplicated() {
        let scope = resolve_scope(&keys(&[" Scenes ", "BANNERS", "scenes"])).unwrap();
        assert_eq!(
            scope.modules(),
            vec![SyncModule::Banners, SyncModule::Scenes]
        );
        assert!(scope.contains(SyncModule::Scenes));
        assert!(!scope.contains(SyncModule::Identities));
    }

    #[test]
    fn unknown_keys_are_listed_together() {
        let err = resolve_scope(&keys(&["scenes", "posters", "Trailers"])).unwrap_err();
        assert_matches!(err, CoreError::Validation(ref msg) if msg.contains("posters, Trailers"));
    }

    #[test]
    fn every_module_round_trips_through_parse() {
        for module in SyncModule::ALL {
            assert_eq!(SyncModule::parse(module.as_str()), Some(module));
        }
    }

    #[test]
    fn canonical_order_covers_the_registry() {
        let canonical: BTreeSet<_> = SyncModule::CANONICAL_ORDER.into_iter().collect();
        let registry: BTreeSet<_> = SyncModule::ALL.into_iter().collect();
        assert_eq!(canonical, registry);
    }

    #[test]
    fn serde_uses_module_keys() {
        let json = serde_json::to_string(&SyncModule::ConfigExtraSteps).unwrap();
        assert_eq!(json, "\"config_extra_steps\"");
    }
}
