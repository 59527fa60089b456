use lingo_core::model::{AnswerRecord, CategoryId, ItemDraft, ItemId, LearningItem, UserId};
use lingo_core::time::fixed_now;
use storage::repository::{
    CatalogRepository, ContentProvider, ContentRequest, ProgressStore, StorageError,
};
use storage::sqlite::SqliteRepository;

fn build_item(id: u64, category: u64) -> LearningItem {
    ItemDraft {
        id,
        category_id: category,
        term: format!("Wort{id}"),
        definition: format!("word {id}"),
        audio_url: Some(format!("/media/audio/{id}.mp3")),
        example_sentence: Some("Das ist ein ____.".into()),
        ..ItemDraft::default()
    }
    .validate()
    .unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn answer(user: u64, item: u64, correct: bool) -> AnswerRecord {
    AnswerRecord {
        user_id: UserId::new(user),
        item_id: ItemId::new(item),
        category_id: CategoryId::new(1),
        correct,
        answered_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_roundtrips_items_in_id_order() {
    let repo = connect("memdb_items").await;
    repo.upsert_category(CategoryId::new(1), "Basics").await.unwrap();
    for id in [3, 1, 2] {
        repo.upsert_item(&build_item(id, 1)).await.unwrap();
    }

    let items = repo
        .fetch_items(ContentRequest {
            category_id: CategoryId::new(1),
            desired_count: 2,
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], build_item(1, 1));
    assert_eq!(items[1].id(), ItemId::new(2));
    assert_eq!(
        items[0].rendered_example().as_deref(),
        Some("Das ist ein Wort1.")
    );

    let cats = repo.list_categories().await.unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].item_count, 3);
}

#[tokio::test]
async fn sqlite_rejects_unknown_category() {
    let repo = connect("memdb_unknown").await;
    let err = repo.upsert_item(&build_item(1, 9)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = repo
        .fetch_items(ContentRequest {
            category_id: CategoryId::new(9),
            desired_count: 5,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_tracks_mastery_and_experience_per_user() {
    let repo = connect("memdb_progress").await;
    repo.upsert_category(CategoryId::new(1), "Basics").await.unwrap();
    for id in 1..=4 {
        repo.upsert_item(&build_item(id, 1)).await.unwrap();
    }

    let update = repo.record_answer(&answer(1, 1, true)).await.unwrap();
    assert_eq!(update.mastery_percent, 25);
    assert_eq!(update.experience_delta, 10);
    assert_eq!(update.total_experience, 10);

    repo.record_answer(&answer(1, 1, true)).await.unwrap();
    let update = repo.record_answer(&answer(1, 2, false)).await.unwrap();
    assert_eq!(update.mastery_percent, 25);
    assert_eq!(update.experience_delta, 0);
    assert_eq!(update.total_experience, 20);

    let update = repo.record_answer(&answer(2, 3, true)).await.unwrap();
    assert_eq!(update.mastery_percent, 25);
    assert_eq!(update.total_experience, 10);

    assert_eq!(
        repo.mastery(UserId::new(1), CategoryId::new(1)).await.unwrap(),
        25
    );
    assert_eq!(repo.total_experience(UserId::new(1)).await.unwrap(), 20);
    assert_eq!(repo.total_experience(UserId::new(3)).await.unwrap(), 0);
}
