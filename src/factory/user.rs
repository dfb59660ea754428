use chrono::{DateTime, FixedOffset};
use fake::{faker::internet::en::Username, Dummy, Fake, Faker};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::model::{
    user::{User, TABLE_NAME},
    user_profile::{UserProfile, TABLE_NAME as USER_PROFILE_TABLE_NAME},
};

/// Seeds `public.user` together with a `public.user_profile` carrying a unique
/// email, since profile ownership is resolved by email.
pub struct UserFactory<T: Clone> {
    modifier_one: fn(x: &User, ext: T) -> User,
}

impl<T: Clone> Default for UserFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> UserFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &User, ext: T) -> User) {
        self.modifier_one = modifier
    }

    pub async fn generate_one(
        &mut self,
        db: &PgPool,
        ext: T,
    ) -> anyhow::Result<(User, UserProfile)> {
        let data = UserDummy::new().generate_one();
        let data = (self.modifier_one)(&data, ext);
        let user_profile = UserProfile {
            id: data.id,
            user_id: data.id,
            first_name: None,
            last_name: None,
            address: None,
            email: Some(format!("{}@local.test", data.id.simple())),
        };
        let mut tx = db.begin().await?;
        sqlx::query(
            format!(
                r#"
        INSERT INTO {} (id, user_name, password, is_active, is_2faenabled, created_date, updated_date, deleted_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
                TABLE_NAME
            )
            .as_str(),
        )
        .bind(data.id)
        .bind(&data.user_name)
        .bind(&data.password)
        .bind(data.is_active)
        .bind(data.is_2faenabled)
        .bind(data.created_date)
        .bind(data.updated_date)
        .bind(data.deleted_date)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            format!(
                r#"
        INSERT INTO {} (id, user_id, first_name, last_name, address, email)
        VALUES ($1, $2, $3, $4, $5, $6)"#,
                USER_PROFILE_TABLE_NAME
            )
            .as_str(),
        )
        .bind(user_profile.id)
        .bind(user_profile.user_id)
        .bind(&user_profile.first_name)
        .bind(&user_profile.last_name)
        .bind(&user_profile.address)
        .bind(&user_profile.email)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok((data, user_profile))
    }
}

#[derive(Debug, Default, Deserialize, Dummy, Clone)]
struct UserDummy {
    pub id: Uuid,
    #[dummy(faker = "Username()")]
    pub user_name: String,
    pub password: String,
    pub created_date: Option<DateTime<FixedOffset>>,
    pub updated_date: Option<DateTime<FixedOffset>>,
}

impl UserDummy {
    pub fn new() -> Self {
        Faker.fake::<Self>()
    }

    pub fn generate_one(&self) -> User {
        let dummy = Faker.fake::<UserDummy>();
        User {
            id: dummy.id,
            user_name: format!("{}_{}", dummy.user_name, dummy.id.simple()),
            password: dummy.password,
            is_active: Some(true),
            is_2faenabled: Some(false),
            created_date: dummy.created_date,
            updated_date: dummy.updated_date,
            deleted_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use crate::{factory::user::UserFactory, model::user::User};

    #[sqlx::test]
    async fn test_generate_one(pool: PgPool) -> anyhow::Result<()> {
        // When
        let mut factory = UserFactory::new();
        let (user, user_profile) = factory.generate_one(&pool, ()).await?;

        // Expect
        let num_data: (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM public.user"#)
            .fetch_one(&pool)
            .await?;
        assert_eq!(num_data.0, 1);
        let email: (Option<String>,) =
            sqlx::query_as(r#"SELECT email FROM public.user_profile WHERE user_id = $1"#)
                .bind(user.id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(email.0, user_profile.email);
        Ok(())
    }

    #[sqlx::test]
    async fn test_generate_one_modified(pool: PgPool) -> anyhow::Result<()> {
        // When
        let mut factory = UserFactory::<Uuid>::new();
        factory.modified_one(|data, ext| User {
            id: ext,
            user_name: "test_user".to_string(),
            ..data.clone()
        });
        let id = Uuid::now_v7();
        factory.generate_one(&pool, id).await?;

        // Expect
        let res: (Uuid, String) =
            sqlx::query_as(r#"SELECT id, user_name FROM public.user"#)
                .fetch_one(&pool)
                .await?;
        assert_eq!(res.0, id);
        assert_eq!(res.1, "test_user".to_string());
        Ok(())
    }
}
