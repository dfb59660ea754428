use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.student_experience";

#[derive(Clone, Debug, Default, Deserialize, FromRow, PartialEq)]
pub struct StudentExperience {
    pub id: i32,
    pub student_profile_id: i32,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
}
