use chrono::{DateTime, FixedOffset};
use sqlx::{postgres::PgRow, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    core::sqlx_utils::{binds_query_as, query_builder, SqlxBinds},
    model::{
        student_certification::{StudentCertification, TABLE_NAME as CERTIFICATION_TABLE_NAME},
        student_education::{StudentEducation, TABLE_NAME as EDUCATION_TABLE_NAME},
        student_experience::{StudentExperience, TABLE_NAME as EXPERIENCE_TABLE_NAME},
        student_profile::{ProfileAggregate, StudentProfile, TABLE_NAME},
        student_skill::{StudentSkill, TABLE_NAME as SKILL_TABLE_NAME},
        user_profile::TABLE_NAME as USER_PROFILE_TABLE_NAME,
    },
};

const CHILD_TABLES: [&str; 4] = [
    EDUCATION_TABLE_NAME,
    SKILL_TABLE_NAME,
    CERTIFICATION_TABLE_NAME,
    EXPERIENCE_TABLE_NAME,
];

async fn get_children<T>(
    tx: &mut Transaction<'_, Postgres>,
    table_name: &str,
    profile_id: i32,
) -> anyhow::Result<Vec<T>>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let stmt = query_builder(
        None,
        table_name,
        &["student_profile_id = $1".to_string()],
        vec!["id ASC".to_string()],
        None,
    );
    let data = binds_query_as::<T>(&stmt, vec![SqlxBinds::Int(profile_id)])
        .fetch_all(&mut **tx)
        .await?;
    Ok(data)
}

async fn get_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    filter: String,
    bind: SqlxBinds,
) -> anyhow::Result<Option<ProfileAggregate>> {
    let stmt = query_builder(None, TABLE_NAME, &[filter], vec![], Some(1));
    let profile = binds_query_as::<StudentProfile>(&stmt, vec![bind])
        .fetch_optional(&mut **tx)
        .await?;
    let Some(profile) = profile else {
        return Ok(None);
    };
    let educations: Vec<StudentEducation> =
        get_children(tx, EDUCATION_TABLE_NAME, profile.id).await?;
    let skills: Vec<StudentSkill> = get_children(tx, SKILL_TABLE_NAME, profile.id).await?;
    let certifications: Vec<StudentCertification> =
        get_children(tx, CERTIFICATION_TABLE_NAME, profile.id).await?;
    let experiences: Vec<StudentExperience> =
        get_children(tx, EXPERIENCE_TABLE_NAME, profile.id).await?;
    Ok(Some(ProfileAggregate {
        profile,
        educations,
        skills,
        certifications,
        experiences,
    }))
}

pub async fn get_profile_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> anyhow::Result<Option<ProfileAggregate>> {
    get_aggregate(tx, "id = $1".to_string(), SqlxBinds::Int(id)).await
}

pub async fn get_profile_by_user_id(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &Uuid,
) -> anyhow::Result<Option<ProfileAggregate>> {
    get_aggregate(tx, "user_id = $1".to_string(), SqlxBinds::Uuid(*user_id)).await
}

pub async fn get_profile_by_user_email(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> anyhow::Result<Option<ProfileAggregate>> {
    get_aggregate(
        tx,
        format!(
            "user_id = (SELECT user_id FROM {} WHERE email = $1)",
            USER_PROFILE_TABLE_NAME
        ),
        SqlxBinds::String(email.to_string()),
    )
    .await
}

pub async fn profile_exists(tx: &mut Transaction<'_, Postgres>, id: i32) -> anyhow::Result<bool> {
    let res: (bool,) = sqlx::query_as(
        format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", TABLE_NAME).as_str(),
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(res.0)
}

/// Insert-or-update of the whole aggregate. Existing child rows are deleted and
/// the aggregate's collections are inserted again, so the stored children are
/// exactly the ones held in memory. Generated ids are written back.
pub async fn save_profile(
    tx: &mut Transaction<'_, Postgres>,
    aggregate: &mut ProfileAggregate,
    now: &DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    let profile = &mut aggregate.profile;
    profile.updated_date = Some(*now);
    if profile.is_persisted() {
        sqlx::query(
            format!(
                r#"UPDATE {}
                SET headline = $1, summary = $2, location = $3, phone = $4, cv_path = $5,
                motivation_letter_path = $6, profile_picture = $7, cover_photo = $8,
                updated_date = $9
                WHERE id = $10"#,
                TABLE_NAME
            )
            .as_str(),
        )
        .bind(&profile.headline)
        .bind(&profile.summary)
        .bind(&profile.location)
        .bind(&profile.phone)
        .bind(&profile.cv_path)
        .bind(&profile.motivation_letter_path)
        .bind(&profile.profile_picture)
        .bind(&profile.cover_photo)
        .bind(profile.updated_date)
        .bind(profile.id)
        .execute(&mut **tx)
        .await?;

        for table_name in CHILD_TABLES {
            sqlx::query(format!("DELETE FROM {} WHERE student_profile_id = $1", table_name).as_str())
                .bind(profile.id)
                .execute(&mut **tx)
                .await?;
        }
    } else {
        profile.created_date = Some(*now);
        let (id,): (i32,) = sqlx::query_as(
            format!(
                r#"INSERT INTO {} (user_id, headline, summary, location, phone, cv_path,
                motivation_letter_path, profile_picture, cover_photo, created_date, updated_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING id"#,
                TABLE_NAME
            )
            .as_str(),
        )
        .bind(profile.user_id)
        .bind(&profile.headline)
        .bind(&profile.summary)
        .bind(&profile.location)
        .bind(&profile.phone)
        .bind(&profile.cv_path)
        .bind(&profile.motivation_letter_path)
        .bind(&profile.profile_picture)
        .bind(&profile.cover_photo)
        .bind(profile.created_date)
        .bind(profile.updated_date)
        .fetch_one(&mut **tx)
        .await?;
        profile.id = id;
    }

    aggregate.link_children();
    for item in aggregate.educations.iter_mut() {
        insert_education(tx, item).await?;
    }
    for item in aggregate.skills.iter_mut() {
        insert_skill(tx, item).await?;
    }
    for item in aggregate.certifications.iter_mut() {
        insert_certification(tx, item).await?;
    }
    for item in aggregate.experiences.iter_mut() {
        insert_experience(tx, item).await?;
    }
    Ok(())
}

async fn insert_education(
    tx: &mut Transaction<'_, Postgres>,
    item: &mut StudentEducation,
) -> anyhow::Result<()> {
    let (id,): (i32,) = sqlx::query_as(
        format!(
            r#"INSERT INTO {} (student_profile_id, school, degree, field_of_study, start_date,
            end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id"#,
            EDUCATION_TABLE_NAME
        )
        .as_str(),
    )
    .bind(item.student_profile_id)
    .bind(&item.school)
    .bind(&item.degree)
    .bind(&item.field_of_study)
    .bind(item.start_date)
    .bind(item.end_date)
    .bind(&item.description)
    .fetch_one(&mut **tx)
    .await?;
    item.id = id;
    Ok(())
}

async fn insert_skill(
    tx: &mut Transaction<'_, Postgres>,
    item: &mut StudentSkill,
) -> anyhow::Result<()> {
    let (id,): (i32,) = sqlx::query_as(
        format!(
            r#"INSERT INTO {} (student_profile_id, name, level)
            VALUES ($1, $2, $3)
            RETURNING id"#,
            SKILL_TABLE_NAME
        )
        .as_str(),
    )
    .bind(item.student_profile_id)
    .bind(&item.name)
    .bind(&item.level)
    .fetch_one(&mut **tx)
    .await?;
    item.id = id;
    Ok(())
}

async fn insert_certification(
    tx: &mut Transaction<'_, Postgres>,
    item: &mut StudentCertification,
) -> anyhow::Result<()> {
    let (id,): (i32,) = sqlx::query_as(
        format!(
            r#"INSERT INTO {} (student_profile_id, name, issuing_organization, issue_date,
            expiration_date, credential_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id"#,
            CERTIFICATION_TABLE_NAME
        )
        .as_str(),
    )
    .bind(item.student_profile_id)
    .bind(&item.name)
    .bind(&item.issuing_organization)
    .bind(item.issue_date)
    .bind(item.expiration_date)
    .bind(&item.credential_url)
    .fetch_one(&mut **tx)
    .await?;
    item.id = id;
    Ok(())
}

async fn insert_experience(
    tx: &mut Transaction<'_, Postgres>,
    item: &mut StudentExperience,
) -> anyhow::Result<()> {
    let (id,): (i32,) = sqlx::query_as(
        format!(
            r#"INSERT INTO {} (student_profile_id, title, company, location, start_date,
            end_date, is_current, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id"#,
            EXPERIENCE_TABLE_NAME
        )
        .as_str(),
    )
    .bind(item.student_profile_id)
    .bind(&item.title)
    .bind(&item.company)
    .bind(&item.location)
    .bind(item.start_date)
    .bind(item.end_date)
    .bind(item.is_current)
    .bind(&item.description)
    .fetch_one(&mut **tx)
    .await?;
    item.id = id;
    Ok(())
}

/// Delete a profile; child rows go with it through `ON DELETE CASCADE`.
/// Returns the number of profile rows removed.
pub async fn delete_profile(tx: &mut Transaction<'_, Postgres>, id: i32) -> anyhow::Result<u64> {
    let res = sqlx::query(format!("DELETE FROM {} WHERE id = $1", TABLE_NAME).as_str())
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected())
}
