//! Required-field checks run on a draft before it may be pushed.
//!
//! The production side re-runs the same checks, so a payload that passes
//! here is only rejected remotely if the two rule sets drift apart.

use serde::{Deserialize, Serialize};

use crate::module::{ModuleScope, SyncModule};
use crate::payload::SyncPayload;
use crate::types::DbId;

/// One failed check. `row_id` is `None` for module-level problems such as
/// "no scenes at all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub module: String,
    #[serde(default)]
    pub row_id: Option<DbId>,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(module: SyncModule, row_id: Option<DbId>, field: &str, message: &str) -> Self {
        Self {
            module: module.as_str().to_string(),
            row_id,
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Check every in-scope module of `payload`.
///
/// The version block is always checked because it carries the natural key
/// the production side resolves the target by.
pub fn validate_payload(payload: &SyncPayload, scope: &ModuleScope) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_version(payload, &mut issues);

    for module in scope.modules() {
        match module {
            SyncModule::VersionNames | SyncModule::AppUiFields => {}
            SyncModule::Banners => {
                for banner in payload.banners.iter().flatten() {
                    if blank(&banner.image) {
                        issues.push(ValidationIssue::new(
                            module,
                            banner.id,
                            "image",
                            "banner image is required",
                        ));
                    }
                }
            }
            SyncModule::Identities => {
                for identity in payload.identities.iter().flatten() {
                    check_name_image(module, identity.id, &identity.name, &identity.image, &mut issues);
                }
            }
            SyncModule::Scenes => {
                let scenes = payload.scenes.as_deref().unwrap_or_default();
                if scenes.is_empty() {
                    issues.push(ValidationIssue::new(
                        module,
                        None,
                        "scenes",
                        "at least one scene is required",
                    ));
                }
                for scene in scenes {
                    check_name_image(module, scene.id, &scene.name, &scene.image, &mut issues);
                }
            }
            SyncModule::ClothesCategories => {
                for item in payload.clothes_categories.iter().flatten() {
                    check_name_image(module, item.id, &item.name, &item.image, &mut issues);
                }
            }
            SyncModule::PhotoHobbies => {
                for item in payload.photo_hobbies.iter().flatten() {
                    check_name_image(module, item.id, &item.name, &item.image, &mut issues);
                }
            }
            SyncModule::ConfigExtraSteps => {
                for step in payload.config_extra_steps.iter().flatten() {
                    if step.step_index.is_none() {
                        issues.push(ValidationIssue::new(
                            module,
                            step.id,
                            "step_index",
                            "step_index is required",
                        ));
                    }
                    if blank(&step.field_name) {
                        issues.push(ValidationIssue::new(
                            module,
                            step.id,
                            "field_name",
                            "field_name is required",
                        ));
                    }
                    if blank(&step.label) {
                        issues.push(ValidationIssue::new(
                            module,
                            step.id,
                            "label",
                            "label is required",
                        ));
                    }
                }
            }
        }
    }

    issues
}

fn check_version(payload: &SyncPayload, issues: &mut Vec<ValidationIssue>) {
    let version = &payload.version;
    if blank(&version.app_version_name) {
        issues.push(ValidationIssue::new(
            SyncModule::VersionNames,
            None,
            "app_version_name",
            "version name is required",
        ));
    }
    let parsed: Result<Vec<serde_json::Value>, _> =
        serde_json::from_str(&version.feishu_field_names);
    if parsed.is_err() {
        issues.push(ValidationIssue::new(
            SyncModule::VersionNames,
            None,
            "feishu_field_names",
            "feishu_field_names must be a JSON array",
        ));
    }
}

fn check_name_image(
    module: SyncModule,
    row_id: Option<DbId>,
    name: &str,
    image: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if blank(name) {
        issues.push(ValidationIssue::new(module, row_id, "name", "name is required"));
    }
    if blank(image) {
        issues.push(ValidationIssue::new(module, row_id, "image", "image is required"));
    }
}

/// One-line summary for the draft's `sync_message` column.
pub fn summarize(issues: &[ValidationIssue]) -> String {
    match issues {
        [] => String::new(),
        [only] => format!("{}: {}", only.module, only.message),
        [first, rest @ ..] => format!(
            "{}: {} (and {} more)",
            first.module,
            first.message,
            rest.len()
        ),
    }
}
