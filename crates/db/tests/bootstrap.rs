use sqlx::PgPool;

/// Connect, migrate, and verify every table the service writes exists.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    draftsync_db::health_check(&pool).await.unwrap();

    let tables = [
        "draft_versions",
        "draft_banners",
        "draft_identities",
        "draft_scenes",
        "draft_clothes_categories",
        "draft_photo_hobbies",
        "draft_config_extra_steps",
        "draft_app_ui_fields",
        "draft_submissions",
        "draft_field_histories",
        "draft_tasks",
        "sync_jobs",
        "sync_module_jobs",
        "sync_id_mappings",
        "audit_logs",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Status columns reject values outside their CHECK constraint.
#[sqlx::test(migrations = "./migrations")]
async fn test_status_check_constraints(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO draft_versions (app_version_name, sync_status) VALUES ('x', 'archived')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "unknown sync_status must be rejected");

    let result =
        sqlx::query("INSERT INTO draft_versions (app_version_name, ai_modal) VALUES ('x', 'GPT')")
            .execute(&pool)
            .await;
    assert!(result.is_err(), "unknown ai_modal must be rejected");
}
