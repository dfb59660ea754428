use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::FromRow;

pub const TABLE_NAME: &str = "public.student_certification";

#[derive(Clone, Debug, Default, Deserialize, FromRow, PartialEq)]
pub struct StudentCertification {
    pub id: i32,
    pub student_profile_id: i32,
    pub name: String,
    pub issuing_organization: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub credential_url: Option<String>,
}
