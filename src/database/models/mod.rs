pub mod group;
pub mod profession;
pub mod student;
pub mod student_card;
pub mod teacher;
pub mod user;

pub use group::{GroupPayload, GroupView, Groups};
pub use profession::{ProfessionPayload, ProfessionView, Professions};
pub use student::{StudentPayload, StudentView, Students};
pub use student_card::{StudentCardPayload, StudentCardView, StudentCards};
pub use teacher::{TeacherPayload, TeacherView, Teachers};
pub use user::{NewUser, User};
