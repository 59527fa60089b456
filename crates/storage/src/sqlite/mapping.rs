use lingo_core::model::{CategoryId, ItemDraft, ItemId, LearningItem};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn category_id_from_i64(v: i64) -> Result<CategoryId, StorageError> {
    Ok(CategoryId::new(i64_to_u64("category_id", v)?))
}

pub(crate) fn item_id_from_i64(v: i64) -> Result<ItemId, StorageError> {
    Ok(ItemId::new(i64_to_u64("item_id", v)?))
}

pub(crate) fn count_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    i64_to_u64(field, v)
}

pub(crate) fn map_item_row(row: &sqlx::sqlite::SqliteRow) -> Result<LearningItem, StorageError> {
    let id = item_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let category_id = category_id_from_i64(row.try_get("category_id").map_err(ser)?)?;

    ItemDraft {
        id: id.value(),
        category_id: category_id.value(),
        term: row.try_get("term").map_err(ser)?,
        definition: row.try_get("definition").map_err(ser)?,
        pronunciation: row.try_get("pronunciation").map_err(ser)?,
        part_of_speech: row.try_get("part_of_speech").map_err(ser)?,
        audio_url: row.try_get("audio_url").map_err(ser)?,
        image_url: row.try_get("image_url").map_err(ser)?,
        video_url: row.try_get("video_url").map_err(ser)?,
        example_sentence: row.try_get("example_sentence").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}
