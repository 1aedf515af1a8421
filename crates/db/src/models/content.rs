//! Per-module draft content rows and the assembled draft snapshot.
//!
//! Each row struct maps one module table. Conversions into the wire items
//! in `draftsync_core::payload` carry the draft row id as `id`.

use draftsync_core::module::{ModuleScope, SyncModule};
use draftsync_core::payload::{
    AppUiFieldsItem, BannerItem, CatalogItem, ExtraStepItem, IdentityItem, SceneItem, SyncPayload,
};
use draftsync_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

use super::draft_version::DraftVersion;

/// A row from `draft_banners`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftBanner {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub title: String,
    pub image: String,
    pub sort: i32,
    pub is_active: bool,
    pub banner_type: i32,
}

/// A row from `draft_identities`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftIdentity {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub name: String,
    pub image: String,
    pub sort: i32,
    pub status: i32,
}

/// A row from `draft_scenes`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftScene {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub name: String,
    pub image: String,
    pub description: String,
    pub music: String,
    pub watermark_path: String,
    pub need_watermark: bool,
    pub sort: i32,
    pub status: i32,
    pub oss_style: String,
}

/// A row from `draft_clothes_categories` or `draft_photo_hobbies` (same shape).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftCatalogEntry {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub name: String,
    pub image: String,
    pub sort: i32,
    pub status: i32,
    pub music: String,
    pub description: String,
    pub music_text: String,
}

/// A row from `draft_config_extra_steps`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftExtraStep {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub step_index: Option<i32>,
    pub field_name: String,
    pub label: String,
    pub music: String,
    pub music_text: String,
    pub status: i32,
}

/// The singleton row from `draft_app_ui_fields`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftAppUiFields {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub home_title_left: String,
    pub home_title_right: String,
    pub home_subtitle: String,
    pub start_experience: String,
    pub step1_music: String,
    pub step1_music_text: String,
    pub step2_music: String,
    pub step2_music_text: String,
    pub step1_title: String,
    pub step2_title: String,
    pub status: i32,
    pub print_wait: i32,
}

impl From<&DraftBanner> for BannerItem {
    fn from(row: &DraftBanner) -> Self {
        Self {
            id: Some(row.id),
            title: row.title.clone(),
            image: row.image.clone(),
            sort: row.sort,
            is_active: row.is_active,
            banner_type: row.banner_type,
        }
    }
}

impl From<&DraftIdentity> for IdentityItem {
    fn from(row: &DraftIdentity) -> Self {
        Self {
            id: Some(row.id),
            name: row.name.clone(),
            image: row.image.clone(),
            sort: row.sort,
            status: row.status,
        }
    }
}

impl From<&DraftScene> for SceneItem {
    fn from(row: &DraftScene) -> Self {
        Self {
            id: Some(row.id),
            name: row.name.clone(),
            image: row.image.clone(),
            description: row.description.clone(),
            music: row.music.clone(),
            watermark_path: row.watermark_path.clone(),
            need_watermark: row.need_watermark,
            sort: row.sort,
            status: row.status,
            oss_style: row.oss_style.clone(),
        }
    }
}

impl From<&DraftCatalogEntry> for CatalogItem {
    fn from(row: &DraftCatalogEntry) -> Self {
        Self {
            id: Some(row.id),
            name: row.name.clone(),
            image: row.image.clone(),
            sort: row.sort,
            status: row.status,
            music: row.music.clone(),
            description: row.description.clone(),
            music_text: row.music_text.clone(),
        }
    }
}

impl From<&DraftExtraStep> for ExtraStepItem {
    fn from(row: &DraftExtraStep) -> Self {
        Self {
            id: Some(row.id),
            step_index: row.step_index,
            field_name: row.field_name.clone(),
            label: row.label.clone(),
            music: row.music.clone(),
            music_text: row.music_text.clone(),
            status: row.status,
        }
    }
}

impl From<&DraftAppUiFields> for AppUiFieldsItem {
    fn from(row: &DraftAppUiFields) -> Self {
        Self {
            id: Some(row.id),
            home_title_left: row.home_title_left.clone(),
            home_title_right: row.home_title_right.clone(),
            home_subtitle: row.home_subtitle.clone(),
            start_experience: row.start_experience.clone(),
            step1_music: row.step1_music.clone(),
            step1_music_text: row.step1_music_text.clone(),
            step2_music: row.step2_music.clone(),
            step2_music_text: row.step2_music_text.clone(),
            step1_title: row.step1_title.clone(),
            step2_title: row.step2_title.clone(),
            status: row.status,
            print_wait: row.print_wait,
        }
    }
}

/// A media path referenced by one column of one draft row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub module: SyncModule,
    pub row_id: DbId,
    pub column: &'static str,
    pub path: String,
}

/// A draft version together with all of its module rows.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSnapshot {
    pub version: DraftVersion,
    pub banners: Vec<DraftBanner>,
    pub identities: Vec<DraftIdentity>,
    pub scenes: Vec<DraftScene>,
    pub clothes_categories: Vec<DraftCatalogEntry>,
    pub photo_hobbies: Vec<DraftCatalogEntry>,
    pub config_extra_steps: Vec<DraftExtraStep>,
    pub app_ui_fields: Option<DraftAppUiFields>,
}

impl DraftSnapshot {
    /// Build the wire payload carrying the version block plus every module
    /// in `scope`. Out-of-scope modules are left as `None`.
    pub fn to_payload(&self, scope: &ModuleScope) -> SyncPayload {
        let mut payload = SyncPayload {
            version: self.version.version_block(),
            ..SyncPayload::default()
        };

        for module in scope.modules() {
            match module {
                SyncModule::VersionNames => {}
                SyncModule::AppUiFields => {
                    payload.app_ui_fields = self.app_ui_fields.as_ref().map(AppUiFieldsItem::from);
                }
                SyncModule::Banners => {
                    payload.banners = Some(self.banners.iter().map(BannerItem::from).collect());
                }
                SyncModule::Identities => {
                    payload.identities =
                        Some(self.identities.iter().map(IdentityItem::from).collect());
                }
                SyncModule::Scenes => {
                    payload.scenes = Some(self.scenes.iter().map(SceneItem::from).collect());
                }
                SyncModule::ClothesCategories => {
                    payload.clothes_categories = Some(
                        self.clothes_categories
                            .iter()
                            .map(CatalogItem::from)
                            .collect(),
                    );
                }
                SyncModule::PhotoHobbies => {
                    payload.photo_hobbies =
                        Some(self.photo_hobbies.iter().map(CatalogItem::from).collect());
                }
                SyncModule::ConfigExtraSteps => {
                    payload.config_extra_steps = Some(
                        self.config_extra_steps
                            .iter()
                            .map(ExtraStepItem::from)
                            .collect(),
                    );
                }
            }
        }

        payload
    }

    /// Every non-empty media path referenced by the in-scope modules, in
    /// canonical module order.
    pub fn media_refs(&self, scope: &ModuleScope) -> Vec<MediaRef> {
        let mut refs = Vec::new();
        let mut push = |module: SyncModule, row_id: DbId, column: &'static str, path: &str| {
            if !path.trim().is_empty() {
                refs.push(MediaRef {
                    module,
                    row_id,
                    column,
                    path: path.to_string(),
                });
            }
        };

        for module in scope.modules() {
            match module {
                SyncModule::VersionNames => {}
                SyncModule::AppUiFields => {
                    if let Some(ui) = &self.app_ui_fields {
                        push(module, ui.id, "step1_music", &ui.step1_music);
                        push(module, ui.id, "step2_music", &ui.step2_music);
                    }
                }
                SyncModule::Banners => {
                    for row in &self.banners {
                        push(module, row.id, "image", &row.image);
                    }
                }
                SyncModule::Identities => {
                    for row in &self.identities {
                        push(module, row.id, "image", &row.image);
                    }
                }
                SyncModule::Scenes => {
                    for row in &self.scenes {
                        push(module, row.id, "image", &row.image);
                        push(module, row.id, "music", &row.music);
                        push(module, row.id, "watermark_path", &row.watermark_path);
                    }
                }
                SyncModule::ClothesCategories | SyncModule::PhotoHobbies => {
                    let rows = if module == SyncModule::ClothesCategories {
                        &self.clothes_categories
                    } else {
                        &self.photo_hobbies
                    };
                    for row in rows {
                        push(module, row.id, "image", &row.image);
                        push(module, row.id, "music", &row.music);
                    }
                }
                SyncModule::ConfigExtraSteps => {
                    for row in &self.config_extra_steps {
                        push(module, row.id, "music", &row.music);
                    }
                }
            }
        }

        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use draftsync_core::module::resolve_scope;

    fn version() -> DraftVersion {
        DraftVersion {
            id: 5,
            app_version_name: "harbor-2024".into(),
            location_name: "Harbor".into(),
            feishu_field_names: "[]".into(),
            ai_modal: "NANO".into(),
            status: 1,
            draft_status: "draft".into(),
            submit_version: 0,
            last_submit_by: None,
            last_submit_at: None,
            confirmed_by: None,
            confirmed_at: None,
            sync_status: "idle".into(),
            sync_message: None,
            synced_at: None,
            target_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn snapshot() -> DraftSnapshot {
        DraftSnapshot {
            version: version(),
            banners: vec![DraftBanner {
                id: 1,
                draft_version_id: 5,
                title: "Welcome".into(),
                image: "/local/banners/welcome.png".into(),
                sort: 0,
                is_active: true,
                banner_type: 1,
            }],
            identities: vec![],
            scenes: vec![DraftScene {
                id: 2,
                draft_version_id: 5,
                name: "Pier".into(),
                image: "/local/scenes/pier.png".into(),
                description: "".into(),
                music: "".into(),
                watermark_path: "drafts/5/wm.png".into(),
                need_watermark: true,
                sort: 0,
                status: 1,
                oss_style: "".into(),
            }],
            clothes_categories: vec![],
            photo_hobbies: vec![],
            config_extra_steps: vec![],
            app_ui_fields: None,
        }
    }

    #[test]
    fn payload_contains_only_scoped_modules() {
        let scope = resolve_scope(&["scenes".to_string()]).unwrap();
        let payload = snapshot().to_payload(&scope);
        assert_eq!(payload.version.app_version_name, "harbor-2024");
        assert_eq!(payload.scenes.as_ref().map(Vec::len), Some(1));
        assert!(payload.banners.is_none());
        assert!(payload.app_ui_fields.is_none());
    }

    #[test]
    fn media_refs_skip_blank_paths_and_out_of_scope_rows() {
        let scope = resolve_scope(&["scenes".to_string()]).unwrap();
        let refs = snapshot().media_refs(&scope);
        let columns: Vec<_> = refs.iter().map(|r| (r.row_id, r.column)).collect();
        assert_eq!(columns, vec![(2, "image"), (2, "watermark_path")]);
    }

    #[test]
    fn media_refs_follow_canonical_order() {
        let refs = snapshot().media_refs(&ModuleScope::All);
        let modules: Vec<_> = refs.iter().map(|r| r.module).collect();
        assert_eq!(
            modules,
            vec![SyncModule::Banners, SyncModule::Scenes, SyncModule::Scenes]
        );
    }
}
