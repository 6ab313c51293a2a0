use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use courseloom_common::PurchaseStatus;

// A platform user. The primary key is the identity provider's subject id,
// not a locally minted uuid, so lifecycle events can address records
// directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub enrolled_courses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub course_id: Uuid,
    pub title: String,
    pub enrolled_students: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub purchase_id: Uuid,
    pub user_id: String,
    pub course_id: Uuid,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
