use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.student_skill";

#[derive(Clone, Debug, Default, Deserialize, FromRow, PartialEq)]
pub struct StudentSkill {
    pub id: i32,
    pub student_profile_id: i32,
    pub name: String,
    pub level: Option<String>,
}
