//! Database repositories.

mod complaint;
mod department;
mod notification;
mod reward_account;
mod user;

pub use complaint::ComplaintRepository;
pub use department::DepartmentRepository;
pub use notification::NotificationRepository;
pub use reward_account::RewardAccountRepository;
pub use user::UserRepository;
