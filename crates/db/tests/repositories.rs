use assert_matches::assert_matches;
use draftsync_core::audit::action_types;
use draftsync_core::diff::compute_diff;
use draftsync_core::module::{ModuleScope, SyncModule};
use draftsync_core::payload::{AppUiFieldsItem, BannerItem, CatalogItem, SceneItem};
use draftsync_core::status::{JobStatus, SubmissionStatus, SyncStatus, TaskStatus};
use draftsync_db::models::audit::{AuditQuery, CreateAuditLog};
use draftsync_db::models::draft_version::CreateDraftVersion;
use draftsync_db::models::submission::{CreateSubmission, SubmissionListQuery};
use draftsync_db::models::sync_id_mapping::NewIdMapping;
use draftsync_db::models::task::CreateDraftTask;
use draftsync_db::repositories::{
    AuditLogRepo, DraftContentRepo, DraftVersionRepo, SubmissionRepo, SyncIdMappingRepo,
    SyncJobRepo, TaskRepo,
};
use serde_json::json;
use sqlx::PgPool;

async fn new_draft(pool: &PgPool, name: &str) -> i64 {
    let input = CreateDraftVersion {
        app_version_name: name.to_string(),
        location_name: Some("Harbor".to_string()),
        feishu_field_names: None,
        ai_modal: None,
        status: None,
    };
    DraftVersionRepo::create(pool, &input).await.unwrap().id
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_draft_applies_defaults(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let draft = DraftVersionRepo::find_by_id(&pool, id).await.unwrap().unwrap();

    assert_eq!(draft.feishu_field_names, "[]");
    assert_eq!(draft.ai_modal, "SD");
    assert_eq!(draft.draft_status, "draft");
    assert_eq!(draft.submit_version, 0);
    assert_eq!(draft.sync_status(), Some(SyncStatus::Idle));
    assert!(draft.target_id.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_snapshot_loads_rows_in_sort_order(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    for (sort, name) in [(2, "Dock"), (1, "Pier")] {
        let scene = SceneItem {
            name: name.to_string(),
            image: format!("/local/{name}.png"),
            sort,
            ..SceneItem::default()
        };
        DraftContentRepo::insert_scene(&pool, id, &scene).await.unwrap();
    }
    DraftContentRepo::insert_app_ui_fields(&pool, id, &AppUiFieldsItem::default())
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let snapshot = DraftContentRepo::load_snapshot(&mut conn, id)
        .await
        .unwrap()
        .unwrap();

    let names: Vec<_> = snapshot.scenes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Pier", "Dock"]);
    assert!(snapshot.app_ui_fields.is_some());
    assert!(snapshot.banners.is_empty());

    assert!(DraftContentRepo::load_snapshot(&mut conn, id + 1000)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_app_ui_fields_is_a_singleton(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    DraftContentRepo::insert_app_ui_fields(&pool, id, &AppUiFieldsItem::default())
        .await
        .unwrap();
    let second = DraftContentRepo::insert_app_ui_fields(&pool, id, &AppUiFieldsItem::default()).await;
    assert_matches!(second, Err(sqlx::Error::Database(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_all_modules_only_touches_one_draft(pool: PgPool) {
    let a = new_draft(&pool, "a").await;
    let b = new_draft(&pool, "b").await;
    for draft in [a, b] {
        DraftContentRepo::insert_banner(&pool, draft, &BannerItem::default())
            .await
            .unwrap();
        DraftContentRepo::insert_catalog_entry(
            &pool,
            SyncModule::PhotoHobbies,
            draft,
            &CatalogItem::default(),
        )
        .await
        .unwrap();
    }

    let mut conn = pool.acquire().await.unwrap();
    let removed = DraftContentRepo::delete_all_modules(&mut conn, a).await.unwrap();
    assert_eq!(removed, 2);

    let remaining: i64 = DraftContentRepo::count_rows(&mut conn, b)
        .await
        .unwrap()
        .into_iter()
        .map(|(_, n)| n)
        .sum();
    assert_eq!(remaining, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_catalog_insert_rejects_other_modules(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let result =
        DraftContentRepo::insert_catalog_entry(&pool, SyncModule::Scenes, id, &CatalogItem::default())
            .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_media_path_whitelists_columns(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let scene = SceneItem {
        name: "Pier".into(),
        image: "/local/pier.png".into(),
        ..SceneItem::default()
    };
    let row = DraftContentRepo::insert_scene(&pool, id, &scene).await.unwrap();

    let updated =
        DraftContentRepo::update_media_path(&pool, SyncModule::Scenes, row, "image", "drafts/1/pier.png")
            .await
            .unwrap();
    assert!(updated);

    let rejected =
        DraftContentRepo::update_media_path(&pool, SyncModule::Scenes, row, "name", "x").await;
    assert_matches!(rejected, Err(sqlx::Error::ColumnNotFound(_)));

    let mut conn = pool.acquire().await.unwrap();
    let snapshot = DraftContentRepo::load_snapshot(&mut conn, id).await.unwrap().unwrap();
    assert_eq!(snapshot.scenes[0].image, "drafts/1/pier.png");
    assert_eq!(snapshot.scenes[0].name, "Pier");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_media_references_span_tables_and_drafts(pool: PgPool) {
    let first = new_draft(&pool, "harbor-2024").await;
    let second = new_draft(&pool, "harbor-2025").await;
    let scene = SceneItem {
        name: "Pier".into(),
        music: "/local/wave.mp3".into(),
        ..SceneItem::default()
    };
    DraftContentRepo::insert_scene(&pool, first, &scene).await.unwrap();
    let banner = BannerItem {
        image: "/local/wave.mp3".into(),
        ..BannerItem::default()
    };
    DraftContentRepo::insert_banner(&pool, second, &banner).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let count = DraftContentRepo::count_media_references(&mut conn, "/local/wave.mp3")
        .await
        .unwrap();
    assert_eq!(count, 2);
    let none = DraftContentRepo::count_media_references(&mut conn, "/local/other.png")
        .await
        .unwrap();
    assert_eq!(none, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submission_trail_and_confirm(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let payload = json!({"image": "a.png"});
    let diff = compute_diff(&serde_json::Map::new(), payload.as_object().unwrap());

    let first = SubmissionRepo::insert(
        &pool,
        &CreateSubmission {
            draft_version_id: id,
            module: "banners".into(),
            table_name: "draft_banners".into(),
            entity_id: 12,
            version: 1,
            submitter_id: 7,
            payload: payload.clone(),
            diff: diff.clone(),
            need_confirm: false,
            status: SubmissionStatus::PendingConfirm,
            prev_submission_id: None,
        },
    )
    .await
    .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    SubmissionRepo::insert_field_histories(&mut conn, &first, &diff)
        .await
        .unwrap();

    let history = SubmissionRepo::list_field_histories(&pool, first.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].field, "image");
    assert!(history[0].old_value.is_none());
    assert_eq!(history[0].new_value, Some(json!("a.png")));

    let latest = SubmissionRepo::latest_for_key_for_update(&pool, id, "banners", "draft_banners", 12)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, first.id);

    assert_eq!(SubmissionRepo::count_pending(&pool, id).await.unwrap(), 1);
    let confirmed = SubmissionRepo::mark_confirmed(&pool, first.id, 9).await.unwrap();
    assert_matches!(confirmed, Some(s) if s.status() == Some(SubmissionStatus::Confirmed));
    assert_eq!(SubmissionRepo::count_pending(&pool, id).await.unwrap(), 0);

    // A second confirm is a no-op.
    assert!(SubmissionRepo::mark_confirmed(&pool, first.id, 9)
        .await
        .unwrap()
        .is_none());

    let listed = SubmissionRepo::list_for_draft(
        &pool,
        id,
        &SubmissionListQuery {
            entity_id: Some(12),
            ..SubmissionListQuery::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_submission_version_is_rejected(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let input = CreateSubmission {
        draft_version_id: id,
        module: "scenes".into(),
        table_name: "draft_scenes".into(),
        entity_id: 1,
        version: 1,
        submitter_id: 7,
        payload: json!({}),
        diff: vec![],
        need_confirm: false,
        status: SubmissionStatus::Submitted,
        prev_submission_id: None,
    };
    SubmissionRepo::insert(&pool, &input).await.unwrap();
    let duplicate = SubmissionRepo::insert(&pool, &input).await;
    assert_matches!(duplicate, Err(sqlx::Error::Database(e)) if e.is_unique_violation());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_task_status_follows_module(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    for module in ["banners", "scenes"] {
        TaskRepo::create(
            &pool,
            id,
            &CreateDraftTask {
                module: module.into(),
                assignee_id: Some(7),
            },
        )
        .await
        .unwrap();
    }

    let touched = TaskRepo::set_status_for_module(&pool, id, "banners", TaskStatus::PendingConfirm)
        .await
        .unwrap();
    assert_eq!(touched, 1);

    let tasks = TaskRepo::list_for_draft(&pool, id).await.unwrap();
    let statuses: Vec<_> = tasks.iter().map(|t| (t.module.as_str(), t.status())).collect();
    assert_eq!(
        statuses,
        vec![
            ("banners", Some(TaskStatus::PendingConfirm)),
            ("scenes", Some(TaskStatus::Open)),
        ]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_job_finish_is_guarded(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let mut conn = pool.acquire().await.unwrap();
    let scope = ModuleScope::All.modules();

    let detail = SyncJobRepo::create_with_modules(&mut conn, id, 7, false, &scope)
        .await
        .unwrap();
    assert_eq!(detail.module_jobs.len(), 8);
    assert_eq!(detail.job.status(), Some(JobStatus::Running));

    let finished = SyncJobRepo::finish(&mut conn, detail.job.id, JobStatus::Success, None, Some(41))
        .await
        .unwrap();
    assert!(finished);

    let again = SyncJobRepo::finish(&mut conn, detail.job.id, JobStatus::Failed, Some("late"), None)
        .await
        .unwrap();
    assert!(!again);

    let reloaded = SyncJobRepo::find_detail(&mut conn, detail.job.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.job.status(), Some(JobStatus::Success));
    assert_eq!(reloaded.job.target_id, Some(41));
    assert!(reloaded.job.finished_at.is_some());
    assert!(reloaded
        .module_jobs
        .iter()
        .all(|m| m.status() == Some(JobStatus::Success)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_running_jobs_are_superseded(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let other = new_draft(&pool, "other").await;
    let mut conn = pool.acquire().await.unwrap();

    let stale = SyncJobRepo::create_with_modules(&mut conn, id, 7, false, &[SyncModule::Scenes])
        .await
        .unwrap();
    let unrelated =
        SyncJobRepo::create_with_modules(&mut conn, other, 7, false, &[SyncModule::Scenes])
            .await
            .unwrap();

    let ids = SyncJobRepo::fail_running_for_draft(&mut conn, id, "superseded")
        .await
        .unwrap();
    assert_eq!(ids, vec![stale.job.id]);

    let module_jobs = SyncJobRepo::list_module_jobs(&pool, stale.job.id).await.unwrap();
    assert_eq!(module_jobs[0].status(), Some(JobStatus::Failed));
    assert_eq!(module_jobs[0].message.as_deref(), Some("superseded"));

    let untouched = SyncJobRepo::find_by_id(&pool, unrelated.job.id).await.unwrap().unwrap();
    assert_eq!(untouched.status(), Some(JobStatus::Running));

    let listed = SyncJobRepo::list_for_draft(&pool, id, None).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_id_mappings_replace_and_delete(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let mut conn = pool.acquire().await.unwrap();
    let mapping = NewIdMapping {
        module: SyncModule::Scenes,
        draft_row_id: 3,
        remote_entity_id: 300,
    };

    SyncIdMappingRepo::insert_many(&mut conn, id, &[mapping]).await.unwrap();
    SyncIdMappingRepo::insert_many(
        &mut conn,
        id,
        &[NewIdMapping {
            remote_entity_id: 301,
            ..mapping
        }],
    )
    .await
    .unwrap();

    let rows = SyncIdMappingRepo::list_for_draft(&pool, id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].remote_entity_id, 301);

    assert_eq!(SyncIdMappingRepo::delete_for_draft(&pool, id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_audit_details_are_redacted(pool: PgPool) {
    let id = new_draft(&pool, "harbor-2024").await;
    let entry = CreateAuditLog {
        draft_version_id: Some(id),
        actor_id: Some(7),
        action_type: action_types::SYNC,
        entity_type: None,
        entity_id: None,
        details_json: Some(json!({"modules": ["scenes"], "api_key": "secret-value"})),
    };
    let written = AuditLogRepo::insert(&pool, &entry).await.unwrap();
    let details = written.details_json.unwrap();
    assert_eq!(details["api_key"], "[REDACTED]");
    assert_eq!(details["modules"], json!(["scenes"]));

    let listed = AuditLogRepo::list_for_draft(
        &pool,
        id,
        &AuditQuery {
            action_type: Some(action_types::SYNC.to_string()),
            ..AuditQuery::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);
}
