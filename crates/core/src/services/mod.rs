//! Business logic services.

#![allow(missing_docs)]

pub mod complaint;
pub mod department;
pub mod email;
pub mod jobs;
pub mod notification;
pub mod reward;
pub mod user;

pub use complaint::{ComplaintService, FileComplaintInput};
pub use department::{CreateDepartmentInput, DepartmentService};
pub use email::{EmailMessage, EmailService};
pub use jobs::{Job, JobSender, JobService, JobWorkerContext};
pub use notification::NotificationService;
pub use reward::{LedgerSnapshot, RewardPolicy, SpamOutcome};
pub use user::{LoginInput, RegisterInput, UserService};
