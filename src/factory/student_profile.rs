use fake::{
    faker::{address::en::CityName, lorem::en::Sentence, phone_number::en::PhoneNumber},
    Dummy, Fake, Faker,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::model::student_profile::{StudentProfile, TABLE_NAME};

/// Seeds `public.student_profile` rows without children or stored files.
pub struct StudentProfileFactory<T: Clone> {
    modifier_one: fn(x: &StudentProfile, ext: T) -> StudentProfile,
}

impl<T: Clone> Default for StudentProfileFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> StudentProfileFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &StudentProfile, ext: T) -> StudentProfile) {
        self.modifier_one = modifier
    }

    /// Insert a profile owned by `user_id`. The generated id is returned in
    /// the result.
    pub async fn generate_one(
        &mut self,
        db: &PgPool,
        user_id: Uuid,
        ext: T,
    ) -> anyhow::Result<StudentProfile> {
        let data = StudentProfileDummy::new().generate_one(user_id);
        let mut data = (self.modifier_one)(&data, ext);
        let (id,): (i32,) = sqlx::query_as(
            format!(
                r#"
        INSERT INTO {} (user_id, headline, summary, location, phone, cv_path, motivation_letter_path, profile_picture, cover_photo, created_date, updated_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id"#,
                TABLE_NAME
            )
            .as_str(),
        )
        .bind(data.user_id)
        .bind(&data.headline)
        .bind(&data.summary)
        .bind(&data.location)
        .bind(&data.phone)
        .bind(&data.cv_path)
        .bind(&data.motivation_letter_path)
        .bind(&data.profile_picture)
        .bind(&data.cover_photo)
        .bind(data.created_date)
        .bind(data.updated_date)
        .fetch_one(db)
        .await?;
        data.id = id;
        Ok(data)
    }
}

#[derive(Debug, Default, Deserialize, Dummy, Clone)]
struct StudentProfileDummy {
    #[dummy(faker = "Sentence(2..5)")]
    pub headline: String,
    #[dummy(faker = "Sentence(5..12)")]
    pub summary: String,
    #[dummy(faker = "CityName()")]
    pub location: String,
    #[dummy(faker = "PhoneNumber()")]
    pub phone: String,
}

impl StudentProfileDummy {
    pub fn new() -> Self {
        Faker.fake::<Self>()
    }

    pub fn generate_one(&self, user_id: Uuid) -> StudentProfile {
        let dummy = Faker.fake::<StudentProfileDummy>();
        let token = user_id.simple();
        StudentProfile {
            id: 0,
            user_id,
            headline: Some(dummy.headline),
            summary: Some(dummy.summary),
            location: Some(dummy.location),
            phone: Some(dummy.phone),
            cv_path: Some(format!("/tmp/student/cv_0_{}.pdf", token)),
            motivation_letter_path: Some(format!("/tmp/student/letter_0_{}.pdf", token)),
            profile_picture: None,
            cover_photo: None,
            created_date: None,
            updated_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{
        factory::{student_profile::StudentProfileFactory, user::UserFactory},
        model::student_profile::StudentProfile,
    };

    #[sqlx::test]
    async fn test_generate_one(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let (user, _) = UserFactory::new().generate_one(&pool, ()).await?;

        // When
        let mut factory = StudentProfileFactory::new();
        let profile = factory.generate_one(&pool, user.id, ()).await?;

        // Expect
        assert!(profile.is_persisted());
        let res: (i32, uuid::Uuid) =
            sqlx::query_as(r#"SELECT id, user_id FROM public.student_profile"#)
                .fetch_one(&pool)
                .await?;
        assert_eq!(res, (profile.id, user.id));
        Ok(())
    }

    #[sqlx::test]
    async fn test_generate_one_modified(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let (user, _) = UserFactory::new().generate_one(&pool, ()).await?;

        // When
        let mut factory = StudentProfileFactory::<String>::new();
        factory.modified_one(|data, ext| StudentProfile {
            headline: Some(ext),
            ..data.clone()
        });
        factory
            .generate_one(&pool, user.id, "Data engineer".to_string())
            .await?;

        // Expect
        let res: (Option<String>,) =
            sqlx::query_as(r#"SELECT headline FROM public.student_profile"#)
                .fetch_one(&pool)
                .await?;
        assert_eq!(res.0, Some("Data engineer".to_string()));
        Ok(())
    }
}
