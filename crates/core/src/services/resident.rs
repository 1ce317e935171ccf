//! Residents sharing the officer's address.
//!
//! Addresses match when they are equal after trimming and lowercasing.
//! Diagnostics additionally report near misses: addresses that only differ
//! in punctuation or runs of whitespace.

use std::{cmp::Ordering, sync::LazyLock};

use foodify_common::{AppError, AppResult};
use foodify_db::{
    entities::user_account::{self, AccountStatus},
    repositories::{AddressCount, FoodDonationRepository, UserAccountRepository},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shown when the officer has no address on file.
pub const ADDRESS_NOT_SET: &str =
    "Team officer address not set. Please update your address in Settings first.";

#[allow(clippy::unwrap_used)]
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Query string of the directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResidentListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

/// Residents at the officer's address.
#[derive(Debug, Serialize)]
pub struct ResidentDirectory {
    pub residents: Vec<user_account::Model>,
    /// All residents at the address, ignoring search and status
    pub total: u64,
    pub officer_address: Option<String>,
    pub message: Option<String>,
}

/// Why residents do or do not show up for an officer.
#[derive(Debug, Serialize)]
pub struct AddressDiagnostics {
    pub officer_id: String,
    pub officer_name: String,
    pub officer_address: Option<String>,
    pub address_set: bool,
    pub matching_residents: Vec<user_account::Model>,
    pub all_addresses: Vec<AddressCount>,
    pub near_misses: Vec<AddressCount>,
}

/// Who a donation can be assigned to.
#[derive(Debug, Serialize)]
pub struct AssignmentCandidates {
    pub residents: Vec<user_account::Model>,
    /// True when no approved resident matched and every status is listed
    pub includes_unapproved: bool,
    pub officer_address: String,
    pub message: String,
}

/// Resident directory service.
#[derive(Clone)]
pub struct ResidentService {
    user_repo: UserAccountRepository,
    donation_repo: FoodDonationRepository,
}

impl ResidentService {
    /// Create a new resident service.
    #[must_use]
    pub const fn new(user_repo: UserAccountRepository, donation_repo: FoodDonationRepository) -> Self {
        Self {
            user_repo,
            donation_repo,
        }
    }

    /// Residents at the officer's address, newest first.
    pub async fn directory(
        &self,
        officer: &user_account::Model,
        query: &ResidentListQuery,
    ) -> AppResult<ResidentDirectory> {
        let Some(address) = officer.trimmed_address() else {
            return Ok(ResidentDirectory {
                residents: vec![],
                total: 0,
                officer_address: None,
                message: Some(ADDRESS_NOT_SET.to_string()),
            });
        };

        let status = query
            .status
            .as_deref()
            .and_then(|s| AccountStatus::parse(s.trim()));
        let residents = self
            .user_repo
            .find_residents_at_address(address, query.search.as_deref(), status)
            .await?;
        let total = self.user_repo.count_residents_at_address(address).await?;

        Ok(ResidentDirectory {
            residents,
            total,
            officer_address: Some(address.to_string()),
            message: None,
        })
    }

    /// Address matching report for the officer.
    pub async fn diagnostics(&self, officer: &user_account::Model) -> AppResult<AddressDiagnostics> {
        let address = officer.trimmed_address();

        let matching_residents = match address {
            Some(address) => {
                self.user_repo
                    .find_residents_at_address(address, None, None)
                    .await?
            }
            None => vec![],
        };
        let all_addresses = self.user_repo.resident_address_counts().await?;
        let near_misses = address
            .map(|address| near_misses(address, &all_addresses))
            .unwrap_or_default();

        Ok(AddressDiagnostics {
            officer_id: officer.id.clone(),
            officer_name: officer.full_name.clone(),
            officer_address: officer.address.clone(),
            address_set: address.is_some(),
            matching_residents,
            all_addresses,
            near_misses,
        })
    }

    /// Residents a donation can go to, never its donor.
    ///
    /// Approved residents come first; when there are none every resident at
    /// the address is listed, approved before pending before the rest.
    pub async fn assignment_candidates(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
    ) -> AppResult<AssignmentCandidates> {
        let address = officer
            .trimmed_address()
            .ok_or_else(|| AppError::BadRequest(ADDRESS_NOT_SET.to_string()))?;

        let donation = self.donation_repo.get_by_id(donation_id).await?;
        let residents = self
            .user_repo
            .find_residents_at_address(address, None, None)
            .await?;

        let (residents, includes_unapproved) = pick_candidates(residents, &donation.user_id);

        let message = if residents.is_empty() {
            format!(
                "No residents found in your area (Address: {address}). Please ensure residents have the same address as you."
            )
        } else {
            format!("Found {} resident(s) in your area.", residents.len())
        };

        Ok(AssignmentCandidates {
            residents,
            includes_unapproved,
            officer_address: address.to_string(),
            message,
        })
    }
}

fn pick_candidates(
    residents: Vec<user_account::Model>,
    donor_id: &str,
) -> (Vec<user_account::Model>, bool) {
    let mut others: Vec<user_account::Model> =
        residents.into_iter().filter(|r| r.id != donor_id).collect();

    let mut approved: Vec<user_account::Model> = others
        .iter()
        .filter(|r| r.status == AccountStatus::Approved)
        .cloned()
        .collect();
    if !approved.is_empty() {
        approved.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        return (approved, false);
    }

    others.sort_by(|a, b| match status_rank(a.status).cmp(&status_rank(b.status)) {
        Ordering::Equal => a.full_name.cmp(&b.full_name),
        other => other,
    });
    (others, true)
}

const fn status_rank(status: AccountStatus) -> u8 {
    match status {
        AccountStatus::Approved => 0,
        AccountStatus::Pending => 1,
        AccountStatus::Rejected => 2,
        AccountStatus::Suspended => 3,
    }
}

/// Lowercased, with every run of non-alphanumerics collapsed to one space.
fn loose_key(address: &str) -> String {
    SEPARATORS
        .replace_all(&address.to_lowercase(), " ")
        .trim()
        .to_string()
}

fn strict_key(address: &str) -> String {
    address.trim().to_lowercase()
}

fn near_misses(address: &str, candidates: &[AddressCount]) -> Vec<AddressCount> {
    let strict = strict_key(address);
    let loose = loose_key(address);

    candidates
        .iter()
        .filter(|c| strict_key(&c.address) != strict && loose_key(&c.address) == loose)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use foodify_db::entities::user_account::UserRole;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};

    fn service(db: Arc<DatabaseConnection>) -> ResidentService {
        ResidentService::new(
            UserAccountRepository::new(Arc::clone(&db)),
            FoodDonationRepository::new(db),
        )
    }

    fn resident(id: &str, name: &str, status: AccountStatus) -> user_account::Model {
        user_account::Model {
            id: id.to_string(),
            full_name: name.to_string(),
            email: format!("{id}@example.org"),
            phone_number: None,
            address: Some("12 Main St".to_string()),
            role: UserRole::Resident,
            status,
            profile_img: None,
            password_hash: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn officer(address: Option<&str>) -> user_account::Model {
        let mut officer = resident("off1", "Olive Officer", AccountStatus::Approved);
        officer.role = UserRole::TeamOfficer;
        officer.address = address.map(String::from);
        officer
    }

    fn count(address: &str, residents: i64) -> AddressCount {
        AddressCount {
            address: address.to_string(),
            residents,
        }
    }

    #[test]
    fn test_candidates_prefer_approved_by_name() {
        let residents = vec![
            resident("r1", "Zed", AccountStatus::Approved),
            resident("r2", "Amy", AccountStatus::Pending),
            resident("r3", "Bob", AccountStatus::Approved),
            resident("donor", "Aaron", AccountStatus::Approved),
        ];

        let (picked, fallback) = pick_candidates(residents, "donor");

        assert!(!fallback);
        let names: Vec<&str> = picked.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Zed"]);
    }

    #[test]
    fn test_candidates_fall_back_to_all_statuses() {
        let residents = vec![
            resident("r1", "Zed", AccountStatus::Rejected),
            resident("r2", "Bob", AccountStatus::Pending),
            resident("r3", "Amy", AccountStatus::Pending),
        ];

        let (picked, fallback) = pick_candidates(residents, "donor");

        assert!(fallback);
        let names: Vec<&str> = picked.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Bob", "Zed"]);
    }

    #[test]
    fn test_near_misses_ignore_exact_matches() {
        let all = vec![
            count("12 main st", 3),
            count("12 main st.", 1),
            count("12  Main, St", 2),
            count("14 main st", 5),
        ];

        let misses = near_misses(" 12 Main St ", &all);
        let addresses: Vec<&str> = misses.iter().map(|m| m.address.as_str()).collect();

        assert_eq!(addresses, vec!["12 main st.", "12  Main, St"]);
    }

    #[tokio::test]
    async fn test_directory_without_address() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let directory = service(db)
            .directory(&officer(Some("   ")), &ResidentListQuery::default())
            .await
            .unwrap();

        assert!(directory.residents.is_empty());
        assert_eq!(directory.message.as_deref(), Some(ADDRESS_NOT_SET));
    }

    #[tokio::test]
    async fn test_directory_reports_total() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[resident("r1", "Amy", AccountStatus::Approved)]])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(4i64),
                }]])
                .into_connection(),
        );

        let directory = service(db)
            .directory(
                &officer(Some(" 12 Main St ")),
                &ResidentListQuery {
                    search: Some("amy".to_string()),
                    status: Some("approved".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(directory.residents.len(), 1);
        assert_eq!(directory.total, 4);
        assert_eq!(directory.officer_address.as_deref(), Some("12 Main St"));
    }

    #[tokio::test]
    async fn test_candidates_need_officer_address() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .assignment_candidates(&officer(None), "d1")
            .await
            .unwrap_err();

        assert_eq!(err.message(), ADDRESS_NOT_SET);
    }
}
