//! Reward policy.
//!
//! The rules that map official actions onto a filer's reward account:
//! point credits on approval and resolution, spam-count increments with
//! periodic deductions, and freeze activation. Everything here is pure; the
//! lifecycle engine loads a [`LedgerSnapshot`], applies one of these
//! functions, and persists the result inside its transaction.

use chrono::{Duration, NaiveDate};
use civica_common::config::PolicyConfig;
use civica_db::entities::reward_account;

/// Configured reward policy values, injected into the lifecycle engine at
/// construction.
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    /// Spam-count at which a filer's account freezes.
    pub spam_threshold: i32,
    /// Days a frozen account stays frozen.
    pub spam_tolerance_days: i64,
    /// Points credited when a complaint is approved.
    pub approval_points: i32,
    /// Points deducted on a repeated-spamming crossing.
    pub spam_penalty_points: i32,
    /// Points credited when a complaint is resolved.
    pub resolution_points: i32,
}

impl RewardPolicy {
    /// Build the policy from configuration.
    #[must_use]
    pub const fn from_config(config: &PolicyConfig) -> Self {
        Self {
            spam_threshold: config.spam_threshold,
            spam_tolerance_days: config.spam_tolerance_days,
            approval_points: config.approval_points,
            spam_penalty_points: config.spam_penalty_points,
            resolution_points: config.resolution_points,
        }
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

/// In-memory view of one reward account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub points: i32,
    pub spam_count: i32,
    pub contributions: i32,
    pub frozen: bool,
    pub freeze_until: Option<NaiveDate>,
}

impl From<&reward_account::Model> for LedgerSnapshot {
    fn from(model: &reward_account::Model) -> Self {
        Self {
            points: model.points,
            spam_count: model.spam_count,
            contributions: model.contributions,
            frozen: model.frozen,
            freeze_until: model.freeze_until,
        }
    }
}

/// What a spam-marking did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamOutcome {
    /// A penalty was deducted on this crossing.
    pub deducted: bool,
    /// The account is frozen as of this call.
    pub froze: bool,
}

impl RewardPolicy {
    /// Apply one spam-marking to the ledger.
    ///
    /// The deduction cadence is `count > 4 && count % 5 == 0` — every fifth
    /// spam-marking past the fourth, independent of `spam_threshold`. This
    /// matches the deployed behavior and is kept even though the freeze
    /// threshold is configurable.
    pub fn apply_spam(&self, ledger: &mut LedgerSnapshot, today: NaiveDate) -> SpamOutcome {
        ledger.spam_count += 1;

        let deducted = ledger.spam_count > 4 && ledger.spam_count % 5 == 0;
        if deducted {
            ledger.points -= self.spam_penalty_points;
        }

        let froze = ledger.spam_count >= self.spam_threshold;
        if froze {
            ledger.frozen = true;
            ledger.contributions = 0;
            ledger.freeze_until = Some(today + Duration::days(self.spam_tolerance_days));
        }

        SpamOutcome { deducted, froze }
    }

    /// Credit an approval. Returns the credited amount.
    pub fn apply_approval(&self, ledger: &mut LedgerSnapshot) -> i32 {
        ledger.points += self.approval_points;
        self.approval_points
    }

    /// Credit a resolution. The reward doubles when an official travelled to
    /// the site. Returns the credited amount.
    pub fn apply_resolution(&self, ledger: &mut LedgerSnapshot, was_travelled: bool) -> i32 {
        let mut credit = self.resolution_points;
        if was_travelled {
            credit += self.resolution_points;
        }
        ledger.points += credit;
        credit
    }

    /// Whether the account is effectively frozen today.
    ///
    /// The freeze lapses by date comparison alone; no write ever clears the
    /// flag.
    #[must_use]
    pub fn is_frozen(ledger: &LedgerSnapshot, today: NaiveDate) -> bool {
        ledger.frozen && ledger.freeze_until.is_some_and(|until| today < until)
    }
}
