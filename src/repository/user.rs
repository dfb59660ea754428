use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    core::sqlx_utils::{binds_query_as, query_builder, SqlxBinds},
    model::{
        user::{User, TABLE_NAME},
        user_profile::{UserProfile, TABLE_NAME as USER_PROFILE_TABLE_NAME},
    },
};

pub async fn get_user_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: &Uuid,
) -> anyhow::Result<(Option<User>, Option<UserProfile>)> {
    let binds: Vec<SqlxBinds> = vec![SqlxBinds::Uuid(*id)];
    let user_filters: Vec<String> = vec![
        "id = $1".to_string(),
        "deleted_date IS NULL".to_string(),
    ];
    let user_profile_filters: Vec<String> = vec!["user_id = $1".to_string()];
    let user_stmt = query_builder(None, TABLE_NAME, &user_filters, vec![], None);
    let user_profile_stmt = query_builder(
        None,
        USER_PROFILE_TABLE_NAME,
        &user_profile_filters,
        vec![],
        None,
    );
    let user = binds_query_as::<User>(&user_stmt, binds.clone())
        .fetch_optional(&mut **tx)
        .await?;
    if user.is_none() {
        return Ok((None, None));
    }
    let user_profile = binds_query_as::<UserProfile>(&user_profile_stmt, binds)
        .fetch_optional(&mut **tx)
        .await?;
    Ok((user, user_profile))
}

/// Resolve an active user through the email stored on its user profile.
pub async fn get_user_by_email(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> anyhow::Result<Option<User>> {
    let res_user: Option<User> = sqlx::query_as(
        format!(
            r#"SELECT u.*
            FROM {} u
            JOIN {} p ON p.user_id = u.id
            WHERE p.email = $1 AND u.deleted_date IS NULL
            "#,
            TABLE_NAME, USER_PROFILE_TABLE_NAME
        )
        .as_str(),
    )
    .bind(email)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(res_user)
}

pub async fn get_user_by_username(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> anyhow::Result<(Option<User>, Option<UserProfile>)> {
    let res_user: Option<User> = sqlx::query_as(
        format!(
            r#"SELECT *
            FROM {}
            WHERE user_name = $1 AND deleted_date IS NULL
            "#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(username)
    .fetch_optional(&mut **tx)
    .await?;
    let Some(user) = res_user else {
        return Ok((None, None));
    };

    let res_user_profile: Option<UserProfile> = sqlx::query_as(
        format!(
            r#"SELECT *
            FROM {}
            WHERE user_id = $1
            "#,
            USER_PROFILE_TABLE_NAME
        )
        .as_str(),
    )
    .bind(user.id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok((Some(user), res_user_profile))
}

pub async fn create_user(
    tx: &mut Transaction<'_, Postgres>,
    user: &User,
    user_profile: &UserProfile,
) -> anyhow::Result<()> {
    sqlx::query(
        format!(r#"
        INSERT INTO {} (id, user_name, password, is_active, is_2faenabled, created_date, updated_date, deleted_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#, TABLE_NAME).as_str(),
    )
    .bind(user.id)
    .bind(&user.user_name)
    .bind(&user.password)
    .bind(user.is_active)
    .bind(user.is_2faenabled)
    .bind(user.created_date)
    .bind(user.updated_date)
    .bind(user.deleted_date)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        format!(
            r#"
        INSERT INTO {} (id, user_id, first_name, last_name, address, email)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
            USER_PROFILE_TABLE_NAME
        )
        .as_str(),
    )
    .bind(user_profile.id)
    .bind(user.id)
    .bind(&user_profile.first_name)
    .bind(&user_profile.last_name)
    .bind(&user_profile.address)
    .bind(&user_profile.email)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
