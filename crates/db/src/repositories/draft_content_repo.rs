//! Repository for the seven per-module draft content tables.
//!
//! Reads assemble a [`DraftSnapshot`]; writes cover what sync and import
//! need: bulk delete for overwrite imports, one insert per wire item, and
//! media path rewrites after upload.

use draftsync_core::module::SyncModule;
use draftsync_core::payload::{
    AppUiFieldsItem, BannerItem, CatalogItem, ExtraStepItem, IdentityItem, SceneItem,
};
use draftsync_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::content::{
    DraftAppUiFields, DraftBanner, DraftCatalogEntry, DraftExtraStep, DraftIdentity, DraftScene,
    DraftSnapshot,
};
use crate::repositories::DraftVersionRepo;

const BANNER_COLUMNS: &str = "id, draft_version_id, title, image, sort, is_active, banner_type";

const IDENTITY_COLUMNS: &str = "id, draft_version_id, name, image, sort, status";

const SCENE_COLUMNS: &str = "\
    id, draft_version_id, name, image, description, music, watermark_path, \
    need_watermark, sort, status, oss_style";

const CATALOG_COLUMNS: &str = "\
    id, draft_version_id, name, image, sort, status, music, description, music_text";

const EXTRA_STEP_COLUMNS: &str = "\
    id, draft_version_id, step_index, field_name, label, music, music_text, status";

const APP_UI_COLUMNS: &str = "\
    id, draft_version_id, home_title_left, home_title_right, home_subtitle, \
    start_experience, step1_music, step1_music_text, step2_music, step2_music_text, \
    step1_title, step2_title, status, print_wait";

/// Tables cleared by [`DraftContentRepo::delete_all_modules`].
const CONTENT_TABLES: [SyncModule; 7] = [
    SyncModule::Banners,
    SyncModule::Identities,
    SyncModule::Scenes,
    SyncModule::ClothesCategories,
    SyncModule::PhotoHobbies,
    SyncModule::ConfigExtraSteps,
    SyncModule::AppUiFields,
];

/// Read/write access to draft module content.
pub struct DraftContentRepo;

impl DraftContentRepo {
    /// Load a draft version with every module's rows, ordered by
    /// `(sort, id)` where the table has a sort column.
    ///
    /// Returns `None` if the draft does not exist.
    pub async fn load_snapshot(
        conn: &mut PgConnection,
        draft_id: DbId,
    ) -> Result<Option<DraftSnapshot>, sqlx::Error> {
        let Some(version) = DraftVersionRepo::find_by_id(&mut *conn, draft_id).await? else {
            return Ok(None);
        };

        let banners = sqlx::query_as::<_, DraftBanner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM draft_banners \
             WHERE draft_version_id = $1 ORDER BY sort, id"
        ))
        .bind(draft_id)
        .fetch_all(&mut *conn)
        .await?;

        let identities = sqlx::query_as::<_, DraftIdentity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM draft_identities \
             WHERE draft_version_id = $1 ORDER BY sort, id"
        ))
        .bind(draft_id)
        .fetch_all(&mut *conn)
        .await?;

        let scenes = sqlx::query_as::<_, DraftScene>(&format!(
            "SELECT {SCENE_COLUMNS} FROM draft_scenes \
             WHERE draft_version_id = $1 ORDER BY sort, id"
        ))
        .bind(draft_id)
        .fetch_all(&mut *conn)
        .await?;

        let clothes_categories =
            Self::load_catalog(&mut *conn, SyncModule::ClothesCategories, draft_id).await?;
        let photo_hobbies =
            Self::load_catalog(&mut *conn, SyncModule::PhotoHobbies, draft_id).await?;

        let config_extra_steps = sqlx::query_as::<_, DraftExtraStep>(&format!(
            "SELECT {EXTRA_STEP_COLUMNS} FROM draft_config_extra_steps \
             WHERE draft_version_id = $1 ORDER BY step_index NULLS LAST, id"
        ))
        .bind(draft_id)
        .fetch_all(&mut *conn)
        .await?;

        let app_ui_fields = sqlx::query_as::<_, DraftAppUiFields>(&format!(
            "SELECT {APP_UI_COLUMNS} FROM draft_app_ui_fields WHERE draft_version_id = $1"
        ))
        .bind(draft_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(Some(DraftSnapshot {
            version,
            banners,
            identities,
            scenes,
            clothes_categories,
            photo_hobbies,
            config_extra_steps,
            app_ui_fields,
        }))
    }

    async fn load_catalog(
        executor: impl PgExecutor<'_>,
        module: SyncModule,
        draft_id: DbId,
    ) -> Result<Vec<DraftCatalogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {CATALOG_COLUMNS} FROM {} \
             WHERE draft_version_id = $1 ORDER BY sort, id",
            module.table_name()
        );
        sqlx::query_as::<_, DraftCatalogEntry>(&query)
            .bind(draft_id)
            .fetch_all(executor)
            .await
    }

    /// Count rows per content table for a draft, in [`CONTENT_TABLES`] order.
    pub async fn count_rows(
        conn: &mut PgConnection,
        draft_id: DbId,
    ) -> Result<Vec<(SyncModule, i64)>, sqlx::Error> {
        let mut counts = Vec::with_capacity(CONTENT_TABLES.len());
        for module in CONTENT_TABLES {
            let query = format!(
                "SELECT COUNT(*)::BIGINT FROM {} WHERE draft_version_id = $1",
                module.table_name()
            );
            let count = sqlx::query_scalar::<_, i64>(&query)
                .bind(draft_id)
                .fetch_one(&mut *conn)
                .await?;
            counts.push((module, count));
        }
        Ok(counts)
    }

    /// Delete every content row of a draft across all seven module tables.
    /// Returns the total number of rows removed.
    pub async fn delete_all_modules(
        conn: &mut PgConnection,
        draft_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let mut removed = 0;
        for module in CONTENT_TABLES {
            let query = format!("DELETE FROM {} WHERE draft_version_id = $1", module.table_name());
            removed += sqlx::query(&query)
                .bind(draft_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();
        }
        Ok(removed)
    }

    /// Point one media column of one row at a new path.
    ///
    /// `column` must be one of [`SyncModule::media_columns`] for `module`;
    /// anything else is rejected before a query is built.
    pub async fn update_media_path(
        executor: impl PgExecutor<'_>,
        module: SyncModule,
        row_id: DbId,
        column: &str,
        path: &str,
    ) -> Result<bool, sqlx::Error> {
        if !module.media_columns().contains(&column) {
            return Err(sqlx::Error::ColumnNotFound(format!(
                "{}.{column}",
                module.table_name()
            )));
        }
        let query = format!("UPDATE {} SET {column} = $2 WHERE id = $1", module.table_name());
        let result = sqlx::query(&query)
            .bind(row_id)
            .bind(path)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count rows, in any draft, whose media columns still hold `path`.
    pub async fn count_media_references(
        conn: &mut PgConnection,
        path: &str,
    ) -> Result<i64, sqlx::Error> {
        let mut total = 0;
        for module in CONTENT_TABLES {
            let predicate = module
                .media_columns()
                .iter()
                .map(|column| format!("{column} = $1"))
                .collect::<Vec<_>>()
                .join(" OR ");
            let query = format!(
                "SELECT COUNT(*)::BIGINT FROM {} WHERE {predicate}",
                module.table_name()
            );
            total += sqlx::query_scalar::<_, i64>(&query)
                .bind(path)
                .fetch_one(&mut *conn)
                .await?;
        }
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Inserts, one per wire item. Each returns the new draft row id.
    // -----------------------------------------------------------------------

    pub async fn insert_banner(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        item: &BannerItem,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO draft_banners \
                 (draft_version_id, title, image, sort, is_active, banner_type) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(draft_id)
        .bind(&item.title)
        .bind(&item.image)
        .bind(item.sort)
        .bind(item.is_active)
        .bind(item.banner_type)
        .fetch_one(executor)
        .await
    }

    pub async fn insert_identity(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        item: &IdentityItem,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO draft_identities (draft_version_id, name, image, sort, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(draft_id)
        .bind(&item.name)
        .bind(&item.image)
        .bind(item.sort)
        .bind(item.status)
        .fetch_one(executor)
        .await
    }

    pub async fn insert_scene(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        item: &SceneItem,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO draft_scenes \
                 (draft_version_id, name, image, description, music, watermark_path, \
                  need_watermark, sort, status, oss_style) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(draft_id)
        .bind(&item.name)
        .bind(&item.image)
        .bind(&item.description)
        .bind(&item.music)
        .bind(&item.watermark_path)
        .bind(item.need_watermark)
        .bind(item.sort)
        .bind(item.status)
        .bind(&item.oss_style)
        .fetch_one(executor)
        .await
    }

    /// Insert into `draft_clothes_categories` or `draft_photo_hobbies`.
    pub async fn insert_catalog_entry(
        executor: impl PgExecutor<'_>,
        module: SyncModule,
        draft_id: DbId,
        item: &CatalogItem,
    ) -> Result<DbId, sqlx::Error> {
        if !matches!(
            module,
            SyncModule::ClothesCategories | SyncModule::PhotoHobbies
        ) {
            return Err(sqlx::Error::Protocol(format!(
                "{module} is not a catalog module"
            )));
        }
        let query = format!(
            "INSERT INTO {} \
                 (draft_version_id, name, image, sort, status, music, description, music_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
            module.table_name()
        );
        sqlx::query_scalar(&query)
            .bind(draft_id)
            .bind(&item.name)
            .bind(&item.image)
            .bind(item.sort)
            .bind(item.status)
            .bind(&item.music)
            .bind(&item.description)
            .bind(&item.music_text)
            .fetch_one(executor)
            .await
    }

    pub async fn insert_extra_step(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        item: &ExtraStepItem,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO draft_config_extra_steps \
                 (draft_version_id, step_index, field_name, label, music, music_text, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(draft_id)
        .bind(item.step_index)
        .bind(&item.field_name)
        .bind(&item.label)
        .bind(&item.music)
        .bind(&item.music_text)
        .bind(item.status)
        .fetch_one(executor)
        .await
    }

    /// Insert the singleton UI-fields row. Fails on the unique constraint if
    /// the draft already has one.
    pub async fn insert_app_ui_fields(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        item: &AppUiFieldsItem,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO draft_app_ui_fields \
                 (draft_version_id, home_title_left, home_title_right, home_subtitle, \
                  start_experience, step1_music, step1_music_text, step2_music, \
                  step2_music_text, step1_title, step2_title, status, print_wait) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING id",
        )
        .bind(draft_id)
        .bind(&item.home_title_left)
        .bind(&item.home_title_right)
        .bind(&item.home_subtitle)
        .bind(&item.start_experience)
        .bind(&item.step1_music)
        .bind(&item.step1_music_text)
        .bind(&item.step2_music)
        .bind(&item.step2_music_text)
        .bind(&item.step1_title)
        .bind(&item.step2_title)
        .bind(item.status)
        .bind(item.print_wait)
        .fetch_one(executor)
        .await
    }
}
