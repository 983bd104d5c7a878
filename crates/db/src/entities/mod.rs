//! Database entities.

pub mod complaint;
pub mod complaint_assignment;
pub mod department;
pub mod department_member;
pub mod notification;
pub mod reward_account;
pub mod user;

pub use complaint::Entity as Complaint;
pub use complaint_assignment::Entity as ComplaintAssignment;
pub use department::Entity as Department;
pub use department_member::Entity as DepartmentMember;
pub use notification::Entity as Notification;
pub use reward_account::Entity as RewardAccount;
pub use user::Entity as User;
