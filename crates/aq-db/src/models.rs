//! Model repository
//!
//! Tables: `models`, `model_templates`, `network_models`

use async_trait::async_trait;
use aq_core::{Id, ModelScope};
use aq_models::{Model, NetworkModel, NewModel};
use aq_store::{ModelStore, StoreError, StoreResult};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
struct ModelRow {
    id: i64,
    name: String,
    description: Option<String>,
    project_id: Option<i64>,
    scope: String,
}

#[derive(Debug, Clone, FromRow)]
struct NetworkModelRow {
    network_id: i64,
    model_id: i64,
    active: bool,
    settings: Option<serde_json::Value>,
}

impl ModelRow {
    fn into_model(self, template_ids: Vec<Id>) -> Model {
        Model {
            id: self.id,
            name: self.name,
            description: self.description,
            project_id: self.project_id,
            scope: ModelScope::parse(&self.scope),
            template_ids,
        }
    }
}

impl From<NetworkModelRow> for NetworkModel {
    fn from(row: NetworkModelRow) -> Self {
        NetworkModel {
            network_id: row.network_id,
            model_id: row.model_id,
            active: row.active,
            settings: row.settings,
        }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Model store backed by PostgreSQL
pub struct PgModelStore {
    pool: PgPool,
}

impl PgModelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn template_ids(&self, model_id: Id) -> StoreResult<Vec<Id>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT template_id FROM model_templates WHERE model_id = $1 ORDER BY template_id",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn hydrate(&self, row: Option<ModelRow>) -> StoreResult<Option<Model>> {
        match row {
            Some(row) => {
                let template_ids = self.template_ids(row.id).await?;
                Ok(Some(row.into_model(template_ids)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ModelStore for PgModelStore {
    async fn get_model(&self, id: Id) -> StoreResult<Option<Model>> {
        let row = sqlx::query_as::<_, ModelRow>(
            "SELECT id, name, description, project_id, scope FROM models WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        self.hydrate(row).await
    }

    async fn find_model(&self, project_id: Option<Id>, name: &str) -> StoreResult<Option<Model>> {
        let row = sqlx::query_as::<_, ModelRow>(
            r#"
            SELECT id, name, description, project_id, scope
            FROM models
            WHERE project_id IS NOT DISTINCT FROM $1 AND name = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        self.hydrate(row).await
    }

    async fn add_model(&self, model: NewModel, template_id: Id) -> StoreResult<Model> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query_as::<_, ModelRow>(
            r#"
            INSERT INTO models (name, description, project_id, scope)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, project_id, scope
            "#,
        )
        .bind(&model.name)
        .bind(&model.description)
        .bind(model.project_id)
        .bind(model.scope.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query(
            "INSERT INTO model_templates (model_id, template_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(row.id)
        .bind(template_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        tracing::info!(model_id = row.id, name = %row.name, template_id, "Model created");
        Ok(row.into_model(vec![template_id]))
    }

    async fn get_network_model(&self, network_id: Id) -> StoreResult<Option<NetworkModel>> {
        let row = sqlx::query_as::<_, NetworkModelRow>(
            r#"
            SELECT network_id, model_id, active, settings
            FROM network_models
            WHERE network_id = $1
            ORDER BY active DESC, model_id ASC
            LIMIT 1
            "#,
        )
        .bind(network_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(NetworkModel::from))
    }

    async fn add_network_model(
        &self,
        model_id: Id,
        network_id: Id,
        settings: Option<serde_json::Value>,
    ) -> StoreResult<NetworkModel> {
        let row = sqlx::query_as::<_, NetworkModelRow>(
            r#"
            INSERT INTO network_models (model_id, network_id, active, settings)
            VALUES ($1, $2,
                    NOT EXISTS (SELECT 1 FROM network_models WHERE network_id = $2),
                    $3)
            ON CONFLICT (model_id, network_id) DO UPDATE SET model_id = EXCLUDED.model_id
            RETURNING network_id, model_id, active, settings
            "#,
        )
        .bind(model_id)
        .bind(network_id)
        .bind(settings)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.into())
    }

    async fn update_network_model(&self, network_id: Id, model_id: Id) -> StoreResult<NetworkModel> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let existing = sqlx::query_as::<_, NetworkModelRow>(
            r#"
            SELECT network_id, model_id, active, settings
            FROM network_models
            WHERE network_id = $1
            ORDER BY active DESC, model_id ASC
            "#,
        )
        .bind(network_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        let row = match existing.first() {
            Some(first) => {
                sqlx::query("DELETE FROM network_models WHERE network_id = $1 AND model_id <> $2")
                    .bind(network_id)
                    .bind(first.model_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?;

                sqlx::query_as::<_, NetworkModelRow>(
                    r#"
                    UPDATE network_models
                    SET model_id = $3, active = TRUE
                    WHERE network_id = $1 AND model_id = $2
                    RETURNING network_id, model_id, active, settings
                    "#,
                )
                .bind(network_id)
                .bind(first.model_id)
                .bind(model_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend)?
            }
            None => sqlx::query_as::<_, NetworkModelRow>(
                r#"
                INSERT INTO network_models (model_id, network_id, active)
                VALUES ($1, $2, TRUE)
                RETURNING network_id, model_id, active, settings
                "#,
            )
            .bind(model_id)
            .bind(network_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?,
        };

        tx.commit().await.map_err(backend)?;
        Ok(row.into())
    }
}
