use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.student_education";

#[derive(Clone, Debug, Default, Deserialize, FromRow, PartialEq)]
pub struct StudentEducation {
    pub id: i32,
    pub student_profile_id: i32,
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}
