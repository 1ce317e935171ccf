//! Moderation log repository.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

use crate::entities::{moderation_log, ModerationLog};

/// Log listing filter.
#[derive(Debug, Clone, Default)]
pub struct ModerationLogFilter {
    pub module: Option<String>,
    pub actor_id: Option<String>,
}

impl ModerationLogFilter {
    fn apply(&self, mut query: Select<ModerationLog>) -> Select<ModerationLog> {
        if let Some(module) = self.module.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(moderation_log::Column::Module.eq(module));
        }
        if let Some(actor_id) = self.actor_id.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(moderation_log::Column::ActorId.eq(actor_id));
        }
        query
    }
}

/// Repository for the moderation log.
#[derive(Clone)]
pub struct ModerationLogRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationLogRepository {
    /// Create a new moderation log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an entry.
    pub async fn create(
        &self,
        model: moderation_log::ActiveModel,
    ) -> AppResult<moderation_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries, newest first.
    pub async fn find(
        &self,
        filter: &ModerationLogFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<moderation_log::Model>> {
        filter
            .apply(ModerationLog::find())
            .order_by_desc(moderation_log::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count entries matching the filter.
    pub async fn count(&self, filter: &ModerationLogFilter) -> AppResult<u64> {
        filter
            .apply(ModerationLog::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set, Value};
    use serde_json::json;

    fn create_test_entry(id: &str, module: &str) -> moderation_log::Model {
        moderation_log::Model {
            id: id.to_string(),
            actor_id: "o1".to_string(),
            action_type: "approve".to_string(),
            module: module.to_string(),
            description: "Approved donation d1".to_string(),
            related_id: Some("d1".to_string()),
            related_type: Some("food_donation".to_string()),
            metadata: Some(json!({"email_sent": true})),
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_returns_entry() {
        let entry = create_test_entry("m1", "donations");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = ModerationLogRepository::new(db);
        let saved = repo
            .create(moderation_log::ActiveModel {
                id: Set(entry.id.clone()),
                actor_id: Set(entry.actor_id.clone()),
                action_type: Set(entry.action_type.clone()),
                module: Set(entry.module.clone()),
                description: Set(entry.description.clone()),
                related_id: Set(entry.related_id.clone()),
                related_type: Set(entry.related_type.clone()),
                metadata: Set(entry.metadata.clone()),
                ip_address: Set(entry.ip_address.clone()),
                user_agent: Set(None),
                created_at: Set(entry.created_at),
            })
            .await
            .unwrap();

        assert_eq!(saved.module, "donations");
    }

    #[tokio::test]
    async fn test_find_and_count_with_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_entry("m2", "requests"),
                    create_test_entry("m1", "requests"),
                ]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(2)),
                }]])
                .into_connection(),
        );

        let repo = ModerationLogRepository::new(db);
        let filter = ModerationLogFilter {
            module: Some("requests".to_string()),
            actor_id: None,
        };

        let entries = repo.find(&filter, 50, 0).await.unwrap();
        let total = repo.count(&filter).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(total, 2);
    }
}
