use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use super::query::{ChildLink, Filter, Query, Sort, SortKey};
use super::{CascadeReport, DocumentStore, StoreError};
use crate::document::model::DocumentRow;
use crate::document::{DocumentId, StoredDocument};

const RETURNING: &str = " RETURNING id, collection, content, created_at, updated_at";

/// PostgreSQL-backed store. All collections share the `documents` table;
/// content is JSONB and filters are `@>` containment queries.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn write_error(collection: &str, err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate {
                collection: collection.to_string(),
                constraint: db_err.constraint().unwrap_or("unique").to_string(),
            };
        }
    }
    StoreError::Database(err)
}

fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, sort: Option<&Sort>) {
    builder.push(" ORDER BY ");
    match sort {
        Some(Sort {
            key: SortKey::Field(field),
            descending,
        }) => {
            builder.push("content -> ");
            builder.push_bind(field.clone());
            builder.push(if *descending {
                " DESC NULLS LAST, "
            } else {
                " ASC NULLS FIRST, "
            });
        }
        Some(Sort {
            key: SortKey::CreatedAt,
            descending,
        }) => {
            builder.push(if *descending {
                "created_at DESC, "
            } else {
                "created_at ASC, "
            });
        }
        None => {}
    }
    builder.push("seq ASC");
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<StoredDocument, StoreError> {
        let sql = format!("INSERT INTO documents (id, collection, content) VALUES ($1, $2, $3){RETURNING}");
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(DocumentId::generate().as_str())
            .bind(collection)
            .bind(Json(&content))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(collection, e))?;
        Ok(row.into())
    }

    async fn insert_many(
        &self,
        collection: &str,
        contents: Vec<Map<String, Value>>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DocumentId> = contents.iter().map(|_| DocumentId::generate()).collect();
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO documents (id, collection, content) ");
        builder.push_values(ids.iter().zip(contents.iter()), |mut row, (id, content)| {
            row.push_bind(id.as_str())
                .push_bind(collection)
                .push_bind(Json(content));
        });
        builder.push(RETURNING);

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| write_error(collection, e))?;

        let mut docs: Vec<StoredDocument> = rows.into_iter().map(Into::into).collect();
        docs.sort_by_key(|doc| ids.iter().position(|id| id == &doc.id));
        Ok(docs)
    }

    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, collection, content, created_at, updated_at \
             FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, collection, content, created_at, updated_at FROM documents WHERE collection = ",
        );
        builder.push_bind(collection);
        if !query.filter.is_empty() {
            builder.push(" AND content @> ");
            builder.push_bind(Json(query.filter.as_containment()));
        }
        push_order_by(&mut builder, query.sort.as_ref());
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(skip) = query.skip {
            builder.push(" OFFSET ").push_bind(i64::try_from(skip).unwrap_or(i64::MAX));
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND content @> $2",
        )
        .bind(collection)
        .bind(Json(filter.as_containment()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        content: Map<String, Value>,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let sql = format!(
            "UPDATE documents SET content = $3, updated_at = now() \
             WHERE collection = $1 AND id = $2{RETURNING}"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(collection)
            .bind(id.as_str())
            .bind(Json(&content))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(collection, e))?;
        Ok(row.map(Into::into))
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_cascade(
        &self,
        collection: &str,
        id: &DocumentId,
        children: &[ChildLink],
    ) -> Result<Option<CascadeReport>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let parent = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        if parent.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let mut report = CascadeReport::default();
        for link in children {
            let removed = sqlx::query(
                "DELETE FROM documents WHERE collection = $1 AND content ->> $2 = $3",
            )
            .bind(link.collection)
            .bind(link.foreign_key)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
            report
                .removed
                .push((link.collection.to_string(), removed.rows_affected()));
        }

        tx.commit().await?;
        Ok(Some(report))
    }
}
