//! Moderation log service.

use std::collections::HashMap;

use chrono::Utc;
use foodify_common::{AppResult, IdGenerator};
use foodify_db::{
    entities::moderation_log,
    repositories::{ModerationLogFilter, ModerationLogRepository, UserAccountRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

/// Where a request came from.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// First hop of `X-Forwarded-For`, or the peer address
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One officer action to record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub actor_id: String,
    pub action_type: &'static str,
    pub module: &'static str,
    pub description: String,
    pub related_id: Option<String>,
    pub related_type: Option<&'static str>,
    pub metadata: Option<serde_json::Value>,
}

impl LogEntry {
    /// Entry about a single row.
    #[must_use]
    pub fn new(
        actor_id: &str,
        module: &'static str,
        action_type: &'static str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action_type,
            module,
            description: description.into(),
            related_id: None,
            related_type: None,
            metadata: None,
        }
    }

    /// Attach the affected row.
    #[must_use]
    pub fn related(mut self, related_type: &'static str, related_id: &str) -> Self {
        self.related_type = Some(related_type);
        self.related_id = Some(related_id.to_string());
        self
    }

    /// Attach extra details.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Listing parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationLogQuery {
    pub module: Option<String>,
    pub actor_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A log entry with the actor's name.
#[derive(Debug, Serialize)]
pub struct ModerationLogView {
    #[serde(flatten)]
    pub entry: moderation_log::Model,
    pub actor_name: Option<String>,
}

/// One page of the log.
#[derive(Debug, Serialize)]
pub struct ModerationLogPage {
    pub entries: Vec<ModerationLogView>,
    pub total: u64,
}

/// Service recording and listing officer actions.
#[derive(Clone)]
pub struct ModerationLogService {
    log_repo: ModerationLogRepository,
    user_repo: UserAccountRepository,
    id_gen: IdGenerator,
}

impl ModerationLogService {
    /// Create a new moderation log service.
    #[must_use]
    pub const fn new(log_repo: ModerationLogRepository, user_repo: UserAccountRepository) -> Self {
        Self {
            log_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an entry. A failed write is logged and otherwise ignored.
    pub async fn record(&self, entry: LogEntry, client: &ClientInfo) {
        let model = moderation_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            actor_id: Set(entry.actor_id),
            action_type: Set(entry.action_type.to_string()),
            module: Set(entry.module.to_string()),
            description: Set(entry.description),
            related_id: Set(entry.related_id),
            related_type: Set(entry.related_type.map(String::from)),
            metadata: Set(entry.metadata),
            ip_address: Set(client.ip_address.clone()),
            user_agent: Set(client.user_agent.clone()),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = self.log_repo.create(model).await {
            tracing::warn!(
                module = entry.module,
                action = entry.action_type,
                error = %e,
                "Failed to write moderation log entry"
            );
        }
    }

    /// Entries newest first, with actor names and the total count.
    pub async fn list(&self, query: &ModerationLogQuery) -> AppResult<ModerationLogPage> {
        let filter = ModerationLogFilter {
            module: query.module.clone().filter(|m| !m.trim().is_empty()),
            actor_id: query.actor_id.clone().filter(|a| !a.trim().is_empty()),
        };
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let entries = self.log_repo.find(&filter, limit, offset).await?;
        let total = self.log_repo.count(&filter).await?;

        let mut actor_ids: Vec<String> = entries.iter().map(|e| e.actor_id.clone()).collect();
        actor_ids.sort();
        actor_ids.dedup();
        let names: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&actor_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name))
            .collect();

        let entries = entries
            .into_iter()
            .map(|entry| ModerationLogView {
                actor_name: names.get(&entry.actor_id).cloned(),
                entry,
            })
            .collect();

        Ok(ModerationLogPage { entries, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use foodify_db::entities::user_account::{self, AccountStatus, UserRole};
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use serde_json::json;

    fn service(db: Arc<DatabaseConnection>) -> ModerationLogService {
        ModerationLogService::new(
            ModerationLogRepository::new(Arc::clone(&db)),
            UserAccountRepository::new(db),
        )
    }

    fn entry(id: &str, actor_id: &str) -> moderation_log::Model {
        moderation_log::Model {
            id: id.to_string(),
            actor_id: actor_id.to_string(),
            action_type: "approve".to_string(),
            module: "donations".to_string(),
            description: "Approved donation".to_string(),
            related_id: Some("d1".to_string()),
            related_type: Some("food_donation".to_string()),
            metadata: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now().into(),
        }
    }

    fn officer(id: &str) -> user_account::Model {
        user_account::Model {
            id: id.to_string(),
            full_name: "Olive Officer".to_string(),
            email: "olive@example.org".to_string(),
            phone_number: None,
            address: Some("12 Main St".to_string()),
            role: UserRole::TeamOfficer,
            status: AccountStatus::Approved,
            profile_img: None,
            password_hash: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_swallows_failures() {
        // No query results: the insert fails
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let entry = LogEntry::new("off1", "donations", "approve", "Approved donation")
            .related("food_donation", "d1")
            .metadata(json!({"title": "Bread"}));
        service.record(entry, &ClientInfo::default()).await;
    }

    #[tokio::test]
    async fn test_list_attaches_actor_names() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry("l1", "off1"), entry("l2", "off1")]])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(2i64),
                }]])
                .append_query_results([[officer("off1")]])
                .into_connection(),
        );

        let page = service(db)
            .list(&ModerationLogQuery {
                module: Some("donations".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].actor_name.as_deref(), Some("Olive Officer"));
    }
}
