use lingo_core::model::{AnswerRecord, CategoryId, ProgressUpdate, UserId, mastery_percent};
use sqlx::Sqlite;

use super::{
    SqliteRepository,
    mapping::{conn, count_from_i64, id_to_i64},
};
use crate::repository::{ProgressStore, StorageError};

async fn mastery_in<'e, E>(executor: E, user: i64, category: i64) -> Result<u8, StorageError>
where
    E: sqlx::Executor<'e, Database = Sqlite> + Copy,
{
    let (mastered,): (i64,) = sqlx::query_as(
        r"
            SELECT COUNT(DISTINCT a.item_id)
            FROM answer_records a
            JOIN learning_items i ON i.id = a.item_id AND i.category_id = a.category_id
            WHERE a.user_id = ?1 AND a.category_id = ?2 AND a.correct = 1
        ",
    )
    .bind(user)
    .bind(category)
    .fetch_one(executor)
    .await
    .map_err(conn)?;

    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM learning_items WHERE category_id = ?1")
            .bind(category)
            .fetch_one(executor)
            .await
            .map_err(conn)?;

    Ok(mastery_percent(
        count_from_i64("mastered", mastered)?,
        count_from_i64("total", total)?,
    ))
}

async fn experience_in<'e, E>(executor: E, user: i64) -> Result<u64, StorageError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(experience), 0) FROM answer_records WHERE user_id = ?1",
    )
    .bind(user)
    .fetch_one(executor)
    .await
    .map_err(conn)?;
    count_from_i64("experience", total)
}

#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn record_answer(&self, record: &AnswerRecord) -> Result<ProgressUpdate, StorageError> {
        let user = id_to_i64("user_id", record.user_id.value())?;
        let item = id_to_i64("item_id", record.item_id.value())?;
        let category = id_to_i64("category_id", record.category_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO answer_records (
                    user_id, item_id, category_id, correct, experience, answered_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user)
        .bind(item)
        .bind(category)
        .bind(record.correct)
        .bind(i64::from(record.experience()))
        .bind(record.answered_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let total_experience = experience_in(&mut *tx, user).await?;
        tx.commit().await.map_err(conn)?;

        let mastery = mastery_in(&self.pool, user, category).await?;

        Ok(ProgressUpdate {
            item_id: record.item_id,
            mastery_percent: mastery,
            experience_delta: record.experience(),
            total_experience,
        })
    }

    async fn mastery(&self, user_id: UserId, category_id: CategoryId) -> Result<u8, StorageError> {
        let user = id_to_i64("user_id", user_id.value())?;
        let category = id_to_i64("category_id", category_id.value())?;
        mastery_in(&self.pool, user, category).await
    }

    async fn total_experience(&self, user_id: UserId) -> Result<u64, StorageError> {
        let user = id_to_i64("user_id", user_id.value())?;
        experience_in(&self.pool, user).await
    }
}
