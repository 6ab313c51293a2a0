use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use courseloom_common::{AppError, PurchaseStatus};
use courseloom_database::{Course, Purchase, User};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

// The document store the handlers reconcile into, as an opaque
// capability: point reads and point writes, nothing else.
#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<(), AppError>;
    async fn update_user(&self, user_id: &str, profile: UserProfile) -> Result<(), AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError>;
    async fn find_course(&self, course_id: Uuid) -> Result<Option<Course>, AppError>;
    async fn find_purchase(&self, purchase_id: Uuid) -> Result<Option<Purchase>, AppError>;

    async fn add_course_student(&self, course_id: Uuid, user_id: &str) -> Result<(), AppError>;
    async fn add_user_course(&self, user_id: &str, course_id: Uuid) -> Result<(), AppError>;
    async fn set_purchase_status(
        &self,
        purchase_id: Uuid,
        status: PurchaseStatus,
    ) -> Result<(), AppError>;
}

pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn create_user(&self, user: NewUser) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, name, image_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn update_user(&self, user_id: &str, profile: UserProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, name = $3, image_url = $4, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.image_url)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_course(&self, course_id: Uuid) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE course_id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_purchase(&self, purchase_id: Uuid) -> Result<Option<Purchase>, AppError> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE purchase_id = $1")
            .bind(purchase_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn add_course_student(&self, course_id: Uuid, user_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE courses
            SET enrolled_students = array_append(enrolled_students, $2), updated_at = now()
            WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn add_user_course(&self, user_id: &str, course_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET enrolled_courses = array_append(enrolled_courses, $2), updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn set_purchase_status(
        &self,
        purchase_id: Uuid,
        status: PurchaseStatus,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE purchases
            SET status = $2, updated_at = now()
            WHERE purchase_id = $1
            "#,
        )
        .bind(purchase_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
