//! Wire schema shared by the production push and pull endpoints.
//!
//! The same [`SyncPayload`] shape is sent on push (with only the in-scope
//! modules populated) and received on pull (under a `data` envelope).
//! Entity `id`s are draft row ids on push and production ids on pull.

use serde::{Deserialize, Serialize};

use crate::module::SyncModule;
use crate::types::DbId;
use crate::validation::ValidationIssue;

/// AI model family an attraction renders with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiModal {
    #[default]
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "NANO")]
    Nano,
}

impl AiModal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sd => "SD",
            Self::Nano => "NANO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SD" => Some(Self::Sd),
            "NANO" => Some(Self::Nano),
            _ => None,
        }
    }
}

/// Identity block of a version. `app_version_name` is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionBlock {
    pub app_version_name: String,
    #[serde(default)]
    pub location_name: String,
    /// JSON array encoded as a string, e.g. `"[\"name\",\"phone\"]"`.
    #[serde(default = "empty_json_array")]
    pub feishu_field_names: String,
    #[serde(default)]
    pub ai_modal: AiModal,
    #[serde(default)]
    pub status: i32,
}

fn empty_json_array() -> String {
    "[]".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BannerItem {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(rename = "type", default)]
    pub banner_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityItem {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub status: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub music: String,
    #[serde(default)]
    pub watermark_path: String,
    #[serde(default)]
    pub need_watermark: bool,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub oss_style: String,
}

/// Shape shared by `clothes_categories` and `photo_hobbies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub music: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub music_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraStepItem {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub step_index: Option<i32>,
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub music: String,
    #[serde(default)]
    pub music_text: String,
    #[serde(default)]
    pub status: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppUiFieldsItem {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub home_title_left: String,
    #[serde(default)]
    pub home_title_right: String,
    #[serde(default)]
    pub home_subtitle: String,
    #[serde(default)]
    pub start_experience: String,
    #[serde(default)]
    pub step1_music: String,
    #[serde(default)]
    pub step1_music_text: String,
    #[serde(default)]
    pub step2_music: String,
    #[serde(default)]
    pub step2_music_text: String,
    #[serde(default)]
    pub step1_title: String,
    #[serde(default)]
    pub step2_title: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub print_wait: i32,
}

/// One version's full content, or the in-scope part of it.
///
/// A `None` module list means "not part of this payload", which is distinct
/// from `Some(vec![])` ("this module has no rows").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub version: VersionBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banners: Option<Vec<BannerItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identities: Option<Vec<IdentityItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenes: Option<Vec<SceneItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothes_categories: Option<Vec<CatalogItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_hobbies: Option<Vec<CatalogItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_extra_steps: Option<Vec<ExtraStepItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_ui_fields: Option<AppUiFieldsItem>,
}

impl SyncPayload {
    /// Number of entities carried for `module`.
    ///
    /// `version_names` always counts as one (the version block).
    pub fn count(&self, module: SyncModule) -> usize {
        match module {
            SyncModule::VersionNames => 1,
            SyncModule::AppUiFields => usize::from(self.app_ui_fields.is_some()),
            SyncModule::Banners => self.banners.as_ref().map_or(0, Vec::len),
            SyncModule::Identities => self.identities.as_ref().map_or(0, Vec::len),
            SyncModule::Scenes => self.scenes.as_ref().map_or(0, Vec::len),
            SyncModule::ClothesCategories => self.clothes_categories.as_ref().map_or(0, Vec::len),
            SyncModule::PhotoHobbies => self.photo_hobbies.as_ref().map_or(0, Vec::len),
            SyncModule::ConfigExtraSteps => self.config_extra_steps.as_ref().map_or(0, Vec::len),
        }
    }
}

/// Body of `POST /api/sync/push`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(flatten)]
    pub payload: SyncPayload,
    pub draft_version_id: DbId,
    pub trigger_by: DbId,
    pub confirm: bool,
    pub modules: Vec<String>,
}

/// 2xx body of a push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushAccepted {
    #[serde(default)]
    pub status: String,
    pub target_app_version_name_id: DbId,
}

/// 409 body of a push: the natural key already exists remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConflict {
    #[serde(default)]
    pub need_confirm: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub target_app_version_name_id: Option<DbId>,
}

/// 4xx/5xx body of a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushRejected {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub details: Vec<ValidationIssue>,
}

/// A production version offered for import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVersion {
    pub id: DbId,
    pub app_version_name: String,
    #[serde(default)]
    pub location_name: String,
}

/// `{ "data": T }` envelope used by the production pull endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEnvelope<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn out_of_scope_modules_are_omitted_from_push() {
        let request = PushRequest {
            payload: SyncPayload {
                version: VersionBlock {
                    app_version_name: "harbor-2024".into(),
                    ..VersionBlock::default()
                },
                scenes: Some(vec![SceneItem {
                    id: Some(4),
                    name: "Pier".into(),
                    image: "drafts/1/pier.png".into(),
                    description: "Sunset pier".into(),
                    ..SceneItem::default()
                }]),
                ..SyncPayload::default()
            },
            draft_version_id: 1,
            trigger_by: 7,
            confirm: false,
            modules: vec!["version_names".into(), "scenes".into()],
        };

        let body = serde_json::to_value(&request).unwrap();
        let object = body.as_object().unwrap();
        assert!(object.contains_key("version"));
        assert!(object.contains_key("scenes"));
        assert!(!object.contains_key("banners"));
        assert!(!object.contains_key("app_ui_fields"));
        assert_eq!(body["scenes"][0]["desc"], "Sunset pier");
        assert_eq!(body["version"]["ai_modal"], "SD");
        assert_eq!(body["draft_version_id"], 1);
    }

    #[test]
    fn pull_snapshot_tolerates_missing_fields() {
        let snapshot: RemoteEnvelope<SyncPayload> = serde_json::from_value(json!({
            "data": {
                "version": {"app_version_name": "harbor", "ai_modal": "NANO"},
                "banners": [{"id": 31, "image": "b.png", "type": 2}],
                "app_ui_fields": {"home_subtitle": "Welcome", "print_wait": 5}
            }
        }))
        .unwrap();

        let payload = snapshot.data;
        assert_eq!(payload.version.ai_modal, AiModal::Nano);
        assert_eq!(payload.version.feishu_field_names, "[]");
        let banners = payload.banners.unwrap();
        assert_eq!(banners[0].id, Some(31));
        assert_eq!(banners[0].banner_type, 2);
        assert!(payload.scenes.is_none());
        assert_eq!(payload.app_ui_fields.unwrap().print_wait, 5);
    }

    #[test]
    fn count_reflects_module_presence() {
        let payload = SyncPayload {
            identities: Some(vec![IdentityItem::default(), IdentityItem::default()]),
            ..SyncPayload::default()
        };
        assert_eq!(payload.count(SyncModule::VersionNames), 1);
        assert_eq!(payload.count(SyncModule::Identities), 2);
        assert_eq!(payload.count(SyncModule::Scenes), 0);
        assert_eq!(payload.count(SyncModule::AppUiFields), 0);
    }

    #[test]
    fn conflict_body_parses() {
        let conflict: PushConflict = serde_json::from_value(json!({
            "need_confirm": true,
            "reason": "version exists",
            "target_app_version_name_id": 88
        }))
        .unwrap();
        assert!(conflict.need_confirm);
        assert_eq!(conflict.target_app_version_name_id, Some(88));
    }
}
