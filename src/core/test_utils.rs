use redis::ConnectionLike;
use sqlx::PgPool;

use super::{security::generate_token_from_user, session::add_session};
use crate::{
    factory::user::UserFactory,
    model::{user::User, user_profile::UserProfile},
    settings::Config,
};

pub struct TestUser {
    pub user: User,
    pub user_profile: UserProfile,
    pub token: String,
}

impl TestUser {
    pub fn email(&self) -> &str {
        self.user_profile.email.as_deref().unwrap_or_default()
    }
}

/// Seed a user with an email and log it in.
pub async fn generate_test_user<C: ConnectionLike>(
    db: &PgPool,
    redis_conn: &mut C,
    config: &Config,
) -> anyhow::Result<TestUser> {
    let (user, user_profile) = UserFactory::new().generate_one(db, ()).await?;
    let token = generate_token_from_user(&user, config)?;
    add_session(redis_conn, &user, config, token.clone())?;
    Ok(TestUser {
        user,
        user_profile,
        token,
    })
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{
        core::{security::get_principal_from_token, test_utils::generate_test_user},
        settings::get_config,
    };

    #[sqlx::test]
    async fn test_generate_test_user(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let config = get_config();
        let client = redis::Client::open(config.redis_url.clone())?;
        let mut redis_conn = client.get_connection()?;

        // When
        let res = generate_test_user(&pool, &mut redis_conn, &config).await?;

        // Expect
        let mut tx = pool.begin().await?;
        let principal =
            get_principal_from_token(&mut tx, &mut redis_conn, Some(res.token.clone())).await?;
        assert_eq!(principal.map(|x| x.email), res.user_profile.email.clone());
        assert!(res.email().ends_with("@local.test"));
        Ok(())
    }
}
