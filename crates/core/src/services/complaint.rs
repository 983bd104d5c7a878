//! Complaint lifecycle service.
//!
//! The engine behind every official action on a complaint. Each operation
//! claims the expected status with a conditional UPDATE, applies the reward
//! policy to the filer's ledger, records notifications, and commits the lot
//! as one transaction. Emails go out on the job channel only after commit.

use std::sync::Arc;

use chrono::Utc;
use civica_common::{AppError, AppResult, IdGenerator};
use civica_db::{
    entities::{
        complaint, complaint::ComplaintStatus, notification, reward_account, user,
    },
    repositories::{
        ComplaintRepository, DepartmentRepository, NotificationRepository,
        RewardAccountRepository, UserRepository,
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

use crate::services::email::EmailMessage;
use crate::services::jobs::JobSender;
use crate::services::reward::{LedgerSnapshot, RewardPolicy};

/// Input for filing a complaint.
#[derive(Debug, Deserialize, Validate)]
pub struct FileComplaintInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1, max = 8192))]
    pub body: String,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    /// Department to route the complaint to, by name.
    pub department: Option<String>,

    /// File as a progress report instead of a complaint.
    #[serde(default)]
    pub progress_report: bool,
}

/// Complaint lifecycle service.
#[derive(Clone)]
pub struct ComplaintService {
    db: Arc<DatabaseConnection>,
    complaint_repo: ComplaintRepository,
    user_repo: UserRepository,
    reward_repo: RewardAccountRepository,
    department_repo: DepartmentRepository,
    policy: RewardPolicy,
    id_gen: IdGenerator,
    job_sender: Option<JobSender>,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        complaint_repo: ComplaintRepository,
        user_repo: UserRepository,
        reward_repo: RewardAccountRepository,
        department_repo: DepartmentRepository,
        policy: RewardPolicy,
    ) -> Self {
        Self {
            db,
            complaint_repo,
            user_repo,
            reward_repo,
            department_repo,
            policy,
            id_gen: IdGenerator::new(),
            job_sender: None,
        }
    }

    /// Set the job sender for email delivery.
    pub fn set_job_sender(&mut self, job_sender: JobSender) {
        self.job_sender = Some(job_sender);
    }

    // ========== Citizen surface ==========

    /// File a new complaint.
    ///
    /// Frozen filers are rejected; the freeze is evaluated lazily against
    /// today's date, so a lapsed freeze needs no unfreeze write.
    pub async fn file(
        &self,
        filer: &user::Model,
        input: FileComplaintInput,
    ) -> AppResult<complaint::Model> {
        input.validate()?;

        let account = self.reward_repo.get_by_user_id(&filer.id).await?;
        let mut ledger = LedgerSnapshot::from(&account);
        let today = Utc::now().date_naive();
        if RewardPolicy::is_frozen(&ledger, today) {
            return Err(AppError::Forbidden(format!(
                "Account is frozen for repeated spamming until {}",
                account
                    .freeze_until
                    .map_or_else(|| "further notice".to_string(), |d| d.to_string())
            )));
        }

        // Resolve routing before opening the transaction
        let department = match input.department.as_deref() {
            Some(name) => Some(self.department_repo.get_by_name(name).await?),
            None => None,
        };
        let member_ids = match &department {
            Some(d) => self.department_repo.member_ids(&d.id).await?,
            None => Vec::new(),
        };

        let complaint_id = self.id_gen.generate();
        let model = complaint::ActiveModel {
            id: Set(complaint_id.clone()),
            token: Set(self.id_gen.generate_token()),
            filer_id: Set(filer.id.clone()),
            department_id: Set(department.map(|d| d.id)),
            title: Set(input.title),
            body: Set(input.body),
            location: Set(input.location),
            status: Set(ComplaintStatus::Filed),
            progress_report: Set(input.progress_report),
            was_travelled: Set(false),
            deleted_at: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let txn = self.db.begin().await.map_err(db_err)?;

        let created = ComplaintRepository::create_in(&txn, model).await?;
        for official_id in &member_ids {
            ComplaintRepository::assign(&txn, &complaint_id, official_id).await?;
        }

        ledger.contributions += 1;
        persist_ledger(&txn, account, &ledger).await?;

        txn.commit().await.map_err(db_err)?;

        Ok(created)
    }

    /// A citizen's own complaints, newest first.
    pub async fn for_filer(&self, filer_id: &str) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo.find_by_filer(filer_id).await
    }

    // ========== Official surface ==========

    /// Decline a complaint. No ledger or notification side effect.
    pub async fn decline(&self, complaint_id: &str) -> AppResult<()> {
        self.complaint_repo.get_active_by_id(complaint_id).await?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = ComplaintRepository::transition(
            &txn,
            complaint_id,
            ComplaintStatus::Filed,
            ComplaintStatus::Declined,
        )
        .await?;
        if !claimed {
            // Dropping the transaction rolls it back
            return Err(AppError::Conflict(format!(
                "Complaint is not awaiting triage: {complaint_id}"
            )));
        }

        txn.commit().await.map_err(db_err)?;

        tracing::info!(complaint_id = %complaint_id, "Complaint declined");
        Ok(())
    }

    /// Decline a complaint and email the filer the official's reason.
    pub async fn ignore(&self, complaint_id: &str, reason: &str) -> AppResult<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest(
                "A reason is required to close a report".to_string(),
            ));
        }

        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        let filer = self.user_repo.get_by_id(&complaint.filer_id).await?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = ComplaintRepository::transition(
            &txn,
            complaint_id,
            ComplaintStatus::Filed,
            ComplaintStatus::Declined,
        )
        .await?;
        if !claimed {
            return Err(AppError::Conflict(format!(
                "Complaint is not awaiting triage: {complaint_id}"
            )));
        }

        txn.commit().await.map_err(db_err)?;

        self.enqueue_email(EmailMessage::report_closed(
            &filer.email,
            &complaint.token,
            complaint.created_at,
            reason,
        ))
        .await;

        tracing::info!(complaint_id = %complaint_id, "Complaint closed with reason");
        Ok(())
    }

    /// Mark a complaint as spam.
    ///
    /// Tombstones the record, bumps the filer's spam-count, deducts points on
    /// every fifth crossing, freezes the account at the configured threshold,
    /// and notifies the filer.
    pub async fn mark_spam(&self, complaint_id: &str) -> AppResult<()> {
        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        let filer = self.user_repo.get_by_id(&complaint.filer_id).await?;
        let short = short_token(&complaint.token);

        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = ComplaintRepository::transition(
            &txn,
            complaint_id,
            ComplaintStatus::Filed,
            ComplaintStatus::Spam,
        )
        .await?;
        if !claimed {
            return Err(AppError::Conflict(format!(
                "Complaint is not awaiting triage: {complaint_id}"
            )));
        }
        ComplaintRepository::tombstone(&txn, complaint_id).await?;

        self.notify(
            &txn,
            &filer.id,
            format!(
                "Your complaint with ID {short} is marked as spam, this is a warning that \
                 you should file truthful complaints"
            ),
        )
        .await?;

        let account = RewardAccountRepository::get_in(&txn, &filer.id).await?;
        let mut ledger = LedgerSnapshot::from(&account);
        let today = Utc::now().date_naive();
        let outcome = self.policy.apply_spam(&mut ledger, today);

        if outcome.deducted {
            self.notify(
                &txn,
                &filer.id,
                format!(
                    "Your complaint with ID {short} is marked as spam, and due to continuous \
                     spamming, a reward of {} is deducted from your account",
                    self.policy.spam_penalty_points
                ),
            )
            .await?;
        }

        persist_ledger(&txn, account, &ledger).await?;

        txn.commit().await.map_err(db_err)?;

        self.enqueue_email(EmailMessage::report_spammed(
            &filer.email,
            &complaint.token,
            complaint.created_at,
        ))
        .await;

        tracing::info!(
            complaint_id = %complaint_id,
            filer_id = %filer.id,
            spam_count = ledger.spam_count,
            deducted = outcome.deducted,
            froze = outcome.froze,
            "Complaint marked as spam"
        );
        Ok(())
    }

    /// Approve a complaint as genuine and credit the filer.
    ///
    /// The status claim doubles as the re-entrancy guard: a second approval
    /// finds the complaint already `Verified` and fails without crediting.
    pub async fn approve(&self, complaint_id: &str) -> AppResult<i32> {
        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        let filer = self.user_repo.get_by_id(&complaint.filer_id).await?;
        let short = short_token(&complaint.token);

        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = ComplaintRepository::transition(
            &txn,
            complaint_id,
            ComplaintStatus::Filed,
            ComplaintStatus::Verified,
        )
        .await?;
        if !claimed {
            return Err(AppError::Conflict(format!(
                "Complaint is already verified or closed: {complaint_id}"
            )));
        }

        let account = RewardAccountRepository::get_in(&txn, &filer.id).await?;
        let mut ledger = LedgerSnapshot::from(&account);
        let credited = self.policy.apply_approval(&mut ledger);
        persist_ledger(&txn, account, &ledger).await?;

        self.notify(
            &txn,
            &filer.id,
            format!(
                "Your complaint with ID {short} is approved and reward of {credited} is \
                 credited to your account. Thanks for bringing this to our notice."
            ),
        )
        .await?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(complaint_id = %complaint_id, credited, "Complaint approved");
        Ok(credited)
    }

    /// Settle a verified complaint.
    ///
    /// Settling an unverified complaint is a policy error; approval must come
    /// first.
    pub async fn mark_solved(&self, complaint_id: &str) -> AppResult<()> {
        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        let short = short_token(&complaint.token);

        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = ComplaintRepository::transition(
            &txn,
            complaint_id,
            ComplaintStatus::Verified,
            ComplaintStatus::Settled,
        )
        .await?;
        if !claimed {
            return Err(AppError::Conflict(format!(
                "Complaint must be verified before it can be settled: {complaint_id}"
            )));
        }

        self.notify(
            &txn,
            &complaint.filer_id,
            format!("Your complaint with ID {short} is settled, Keep helping us ahead."),
        )
        .await?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(complaint_id = %complaint_id, "Complaint settled");
        Ok(())
    }

    /// Resolve a complaint and credit the filer.
    ///
    /// Reachable from `Filed` or `Verified`. The reward doubles when an
    /// official travelled to the site.
    pub async fn resolve(&self, complaint_id: &str) -> AppResult<i32> {
        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        let filer = self.user_repo.get_by_id(&complaint.filer_id).await?;
        let short = short_token(&complaint.token);

        let txn = self.db.begin().await.map_err(db_err)?;

        let mut claimed = ComplaintRepository::transition(
            &txn,
            complaint_id,
            ComplaintStatus::Filed,
            ComplaintStatus::Resolved,
        )
        .await?;
        if !claimed {
            claimed = ComplaintRepository::transition(
                &txn,
                complaint_id,
                ComplaintStatus::Verified,
                ComplaintStatus::Resolved,
            )
            .await?;
        }
        if !claimed {
            return Err(AppError::Conflict(format!(
                "Complaint cannot be resolved from its current state: {complaint_id}"
            )));
        }

        let account = RewardAccountRepository::get_in(&txn, &filer.id).await?;
        let mut ledger = LedgerSnapshot::from(&account);
        let credited = self.policy.apply_resolution(&mut ledger, complaint.was_travelled);
        persist_ledger(&txn, account, &ledger).await?;

        self.notify(
            &txn,
            &filer.id,
            format!(
                "Your complaint with ID {short} is resolved, a reward of {credited} is \
                 credited to your account."
            ),
        )
        .await?;

        txn.commit().await.map_err(db_err)?;

        self.enqueue_email(EmailMessage::report_resolved(
            &filer.email,
            &complaint.token,
            complaint.created_at,
            credited,
        ))
        .await;

        tracing::info!(complaint_id = %complaint_id, credited, "Complaint resolved");
        Ok(credited)
    }

    /// Record a site visit on a complaint.
    ///
    /// The flag doubles the filer's reward if the complaint is later
    /// resolved. Only meaningful while the complaint is still under review.
    pub async fn mark_travelled(&self, complaint_id: &str) -> AppResult<()> {
        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        if complaint.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Complaint is already closed: {complaint_id}"
            )));
        }

        ComplaintRepository::set_travelled(self.db.as_ref(), complaint_id).await?;

        tracing::info!(complaint_id = %complaint_id, "Site visit recorded");
        Ok(())
    }

    /// Forward a complaint to another department.
    ///
    /// Replaces the acting official in the assignment set with the target
    /// department's membership; the acting official survives only if they
    /// also belong to that department.
    pub async fn forward(
        &self,
        official_id: &str,
        complaint_id: &str,
        department_name: &str,
    ) -> AppResult<()> {
        let complaint = self.complaint_repo.get_active_by_id(complaint_id).await?;
        if complaint.status != ComplaintStatus::Filed {
            return Err(AppError::Conflict(format!(
                "Only filed complaints can be forwarded: {complaint_id}"
            )));
        }

        let department = self.department_repo.get_by_name(department_name).await?;
        let member_ids = self.department_repo.member_ids(&department.id).await?;

        let txn = self.db.begin().await.map_err(db_err)?;

        ComplaintRepository::set_department(&txn, complaint_id, &department.id).await?;
        ComplaintRepository::unassign(&txn, complaint_id, official_id).await?;
        for member_id in &member_ids {
            ComplaintRepository::assign(&txn, complaint_id, member_id).await?;
        }

        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            complaint_id = %complaint_id,
            department = %department.name,
            officials = member_ids.len(),
            "Complaint forwarded"
        );
        Ok(())
    }

    // ========== Dashboards ==========

    /// A live complaint by ID.
    pub async fn get(&self, complaint_id: &str) -> AppResult<complaint::Model> {
        self.complaint_repo.get_active_by_id(complaint_id).await
    }

    /// Complaints assigned to an official, awaiting triage.
    pub async fn assigned(
        &self,
        official_id: &str,
        progress_report: bool,
    ) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo
            .find_assigned(official_id, progress_report)
            .await
    }

    /// Verified complaints, newest first.
    pub async fn verified(&self) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo.find_by_status(ComplaintStatus::Verified).await
    }

    /// Settled complaints, newest first.
    pub async fn solved(&self) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo.find_by_status(ComplaintStatus::Settled).await
    }

    // ========== Helpers ==========

    /// Record an in-app notification inside the operation's transaction.
    async fn notify<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        body: String,
    ) -> AppResult<()> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            body: Set(body),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };
        NotificationRepository::create_in(conn, model).await?;
        Ok(())
    }

    /// Hand an email to the delivery worker. Best-effort: the transition has
    /// already committed, so a full queue is only logged.
    async fn enqueue_email(&self, message: EmailMessage) {
        if let Some(sender) = &self.job_sender {
            if let Err(e) = sender.email(message).await {
                tracing::warn!(error = %e, "Failed to enqueue lifecycle email");
            }
        }
    }
}

/// Persist a ledger snapshot over its account row.
async fn persist_ledger<C: ConnectionTrait>(
    conn: &C,
    account: reward_account::Model,
    ledger: &LedgerSnapshot,
) -> AppResult<reward_account::Model> {
    let mut active: reward_account::ActiveModel = account.into();
    active.points = Set(ledger.points);
    active.spam_count = Set(ledger.spam_count);
    active.contributions = Set(ledger.contributions);
    active.frozen = Set(ledger.frozen);
    active.freeze_until = Set(ledger.freeze_until);
    active.updated_at = Set(Utc::now().into());
    RewardAccountRepository::update_in(conn, active).await
}

/// The truncated reference quoted in notification texts.
fn short_token(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

fn db_err(e: sea_orm::DbErr) -> AppError {
    AppError::Database(e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_complaint(id: &str, status: ComplaintStatus) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            token: "abcd1234efgh5678ijkl9012mnop3456".to_string(),
            filer_id: "filer1".to_string(),
            department_id: None,
            title: "Streetlight out".to_string(),
            body: "Dark for a week".to_string(),
            location: None,
            status,
            progress_report: false,
            was_travelled: false,
            deleted_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<DatabaseConnection>) -> ComplaintService {
        ComplaintService::new(
            Arc::clone(&db),
            ComplaintRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            RewardAccountRepository::new(Arc::clone(&db)),
            DepartmentRepository::new(db),
            RewardPolicy::default(),
        )
    }

    #[test]
    fn test_short_token() {
        assert_eq!(short_token("abcd1234efgh5678"), "abcd1234");
        assert_eq!(short_token("abc"), "abc");
    }

    #[test]
    fn test_file_input_validation() {
        let input = FileComplaintInput {
            title: String::new(),
            body: String::new(),
            location: None,
            department: None,
            progress_report: false,
        };

        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_decline_missing_complaint() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.decline("missing").await;

        assert!(matches!(result, Err(AppError::ComplaintNotFound(_))));
    }

    #[tokio::test]
    async fn test_decline_claims_filed_complaint() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_complaint("c1", ComplaintStatus::Filed)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        service.decline("c1").await.unwrap();
    }

    #[tokio::test]
    async fn test_decline_lost_race_is_conflict() {
        // The read sees Filed but the guard UPDATE touches zero rows.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_complaint("c1", ComplaintStatus::Filed)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.decline("c1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_ignore_requires_reason() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db);
        let result = service.ignore("c1", "   ").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    fn create_test_filer() -> civica_db::entities::user::Model {
        civica_db::entities::user::Model {
            id: "filer1".to_string(),
            username: "citizen".to_string(),
            username_lower: "citizen".to_string(),
            email: "citizen@example.com".to_string(),
            password: None,
            token: None,
            name: None,
            is_official: false,
            is_admin: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_approve_twice_never_credits_again() {
        // The complaint is already Verified; the guard UPDATE from Filed
        // touches zero rows, so no credit and no notification happen.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_complaint("c1", ComplaintStatus::Verified)]])
                .append_query_results([[create_test_filer()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.approve("c1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_mark_solved_requires_verified() {
        // Settling a complaint that was never approved is a policy error.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_complaint("c1", ComplaintStatus::Filed)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.mark_solved("c1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_forward_rejects_non_filed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_complaint("c1", ComplaintStatus::Verified)]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.forward("official1", "c1", "Sanitation").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
