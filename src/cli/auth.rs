use anyhow::anyhow;
use chrono::Local;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    core::security::hash_password,
    model::{user::User, user_profile::UserProfile},
    repository,
};

/// Create an active user. The email is what profile ownership is resolved by.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password: &str,
    email: &str,
) -> anyhow::Result<User> {
    let mut tx = pool.begin().await?;
    if repository::user::get_user_by_email(&mut tx, email)
        .await?
        .is_some()
    {
        return Err(anyhow!("user with email = {} already exists", email));
    }

    let hashed_password = hash_password(password).map_err(|err| anyhow!(err.to_string()))?;
    let now = Local::now().fixed_offset();
    let user = User {
        id: Uuid::now_v7(),
        user_name: username.to_string(),
        password: hashed_password,
        is_active: Some(true),
        is_2faenabled: Some(false),
        created_date: Some(now),
        updated_date: Some(now),
        deleted_date: None,
    };
    let user_profile = UserProfile {
        id: user.id,
        user_id: user.id,
        first_name: None,
        last_name: None,
        email: Some(email.to_string()),
        address: None,
    };
    repository::user::create_user(&mut tx, &user, &user_profile).await?;
    tx.commit().await?;
    tracing::info!("created user {}", user.user_name);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{cli::auth::create_user, core::security::verify_hash_password};

    #[sqlx::test]
    async fn test_create_user(pool: PgPool) -> anyhow::Result<()> {
        // When
        let user = create_user(&pool, "test", "secret", "test@local.test").await?;

        // Expect
        let db_res: Option<(String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT u.user_name, u.password, p.email
            FROM public.user u
            JOIN public.user_profile p ON p.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(user.id)
        .fetch_optional(&pool)
        .await?;
        let (user_name, password, email) = db_res.unwrap();
        assert_eq!(user_name, "test");
        assert!(verify_hash_password("secret", &password).unwrap());
        assert_eq!(email, Some("test@local.test".to_string()));
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_user_duplicate_email(pool: PgPool) -> anyhow::Result<()> {
        create_user(&pool, "first", "secret", "dup@local.test").await?;
        let res = create_user(&pool, "second", "secret", "dup@local.test").await;
        assert!(res.is_err());
        Ok(())
    }
}
