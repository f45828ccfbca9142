//! PostgreSQL database service for the LexIA backend.
//!
//! All quota counters are derived on demand from the conversations table;
//! nothing here keeps separate counter state.

use chrono::{DateTime, Utc};
use lexia_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::models::{Conversation, LegalDocument};

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await?;

    tracing::info!("Successfully connected to PostgreSQL");

    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== Conversation Operations ====================

    /// Insert a new conversation row.
    pub async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, session_id, user_id, question, answer, confidence, sources, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(conversation.id)
        .bind(&conversation.session_id)
        .bind(&conversation.user_id)
        .bind(&conversation.question)
        .bind(&conversation.answer)
        .bind(conversation.confidence)
        .bind(&conversation.sources)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Count a user's messages created at or after `since`.
    pub async fn count_user_messages_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversations WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Count a user's messages within one session.
    pub async fn count_session_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversations WHERE user_id = $1 AND session_id = $2",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Count the distinct sessions a user has.
    pub async fn count_distinct_sessions(&self, user_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT session_id) FROM conversations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Session id of the user's oldest conversation row, if any.
    pub async fn oldest_session(&self, user_id: &str) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT session_id FROM conversations WHERE user_id = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Delete every row of one of the user's sessions. Returns rows removed.
    pub async fn delete_user_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM conversations WHERE user_id = $1 AND session_id = $2")
                .bind(user_id)
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(result.rows_affected())
    }

    /// Delete every row of a session regardless of owner. Returns rows removed.
    pub async fn delete_session(&self, session_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM conversations WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(result.rows_affected())
    }

    /// Delete conversations created before `cutoff`. Returns rows removed.
    pub async fn delete_conversations_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM conversations WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(result.rows_affected())
    }

    /// All conversations, newest first.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// The most recent conversations, newest first.
    pub async fn recent_conversations(&self, limit: i64) -> Result<Vec<Conversation>, AppError> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Total conversation rows.
    pub async fn count_conversations(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Distinct sessions across all users.
    pub async fn count_distinct_sessions_total(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT session_id) FROM conversations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Distinct sessions with activity at or after `since`.
    pub async fn count_distinct_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT session_id) FROM conversations WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Conversation rows created at or after `since`.
    pub async fn count_messages_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversations WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    // ==================== Legal Document Operations ====================

    /// Insert a legal document (used by ingestion tooling and tests).
    pub async fn insert_document(&self, document: &LegalDocument) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO legal_documents (id, title, category, content_preview, source_url, article_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(document.id)
        .bind(&document.title)
        .bind(&document.category)
        .bind(&document.content_preview)
        .bind(&document.source_url)
        .bind(&document.article_number)
        .bind(document.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Total legal documents.
    pub async fn count_documents(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM legal_documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Documents whose title, preview, or category contains any keyword,
    /// case-insensitive, newest first.
    pub async fn find_documents_matching(
        &self,
        keywords: &[String],
    ) -> Result<Vec<LegalDocument>, AppError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(
            "SELECT id, title, category, content_preview, source_url, article_number, created_at \
             FROM legal_documents WHERE ",
        );

        let mut has_condition = false;
        for keyword in keywords {
            let pattern = format!("%{}%", escape_like(keyword));
            for column in ["title", "content_preview", "category"] {
                if has_condition {
                    builder.push(" OR ");
                }
                builder.push(column);
                builder.push(" ILIKE ");
                builder.push_bind(pattern.clone());
                has_condition = true;
            }
        }

        builder.push(" ORDER BY created_at DESC");

        builder
            .build_query_as::<LegalDocument>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }
}

/// Escape LIKE wildcards so keywords match literally.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
