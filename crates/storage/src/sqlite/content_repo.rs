use lingo_core::model::{CategoryId, LearningItem};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{category_id_from_i64, conn, count_from_i64, id_to_i64, map_item_row, ser},
};
use crate::repository::{
    CatalogRepository, CategoryInfo, ContentProvider, ContentRequest, StorageError,
};

#[async_trait::async_trait]
impl ContentProvider for SqliteRepository {
    async fn fetch_items(&self, request: ContentRequest) -> Result<Vec<LearningItem>, StorageError> {
        let category = id_to_i64("category_id", request.category_id.value())?;

        let exists = sqlx::query("SELECT 1 FROM categories WHERE id = ?1")
            .bind(category)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let rows = sqlx::query(
            r"
                SELECT
                    id, category_id, term, definition, pronunciation, part_of_speech,
                    audio_url, image_url, video_url, example_sentence
                FROM learning_items
                WHERE category_id = ?1
                ORDER BY id ASC
                LIMIT ?2
            ",
        )
        .bind(category)
        .bind(i64::from(request.desired_count))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_item_row(&row)?);
        }
        Ok(out)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryInfo>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT c.id, c.name, COUNT(i.id) AS item_count
                FROM categories c
                LEFT JOIN learning_items i ON i.category_id = c.id
                GROUP BY c.id, c.name
                ORDER BY c.id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                Ok(CategoryInfo {
                    id: category_id_from_i64(row.try_get("id").map_err(ser)?)?,
                    name: row.try_get("name").map_err(ser)?,
                    item_count: count_from_i64("item_count", row.try_get("item_count").map_err(ser)?)?,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn upsert_category(&self, id: CategoryId, name: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO categories (id, name) VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET name = excluded.name
            ",
        )
        .bind(id_to_i64("category_id", id.value())?)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn upsert_item(&self, item: &LearningItem) -> Result<(), StorageError> {
        let draft = item.to_draft();
        let res = sqlx::query(
            r"
                INSERT INTO learning_items (
                    id, category_id, term, definition, pronunciation, part_of_speech,
                    audio_url, image_url, video_url, example_sentence
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(id) DO UPDATE SET
                    category_id = excluded.category_id,
                    term = excluded.term,
                    definition = excluded.definition,
                    pronunciation = excluded.pronunciation,
                    part_of_speech = excluded.part_of_speech,
                    audio_url = excluded.audio_url,
                    image_url = excluded.image_url,
                    video_url = excluded.video_url,
                    example_sentence = excluded.example_sentence
            ",
        )
        .bind(id_to_i64("item_id", draft.id)?)
        .bind(id_to_i64("category_id", draft.category_id)?)
        .bind(draft.term)
        .bind(draft.definition)
        .bind(draft.pronunciation)
        .bind(draft.part_of_speech)
        .bind(draft.audio_url)
        .bind(draft.image_url)
        .bind(draft.video_url)
        .bind(draft.example_sentence)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            // Missing category trips the foreign key.
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StorageError::NotFound)
            }
            Err(e) => Err(conn(e)),
        }
    }
}
