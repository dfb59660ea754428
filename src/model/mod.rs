pub mod student_certification;
pub mod student_education;
pub mod student_experience;
pub mod student_profile;
pub mod student_skill;
pub mod user;
pub mod user_profile;
