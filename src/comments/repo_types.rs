use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String, // author name at posting time
    pub recipe_id: Uuid,
    pub text: String,
    pub created_at: OffsetDateTime,
}
