use apod::{Database, ImageRecord, InsertError, MediaType};
use tempfile::TempDir;

fn sample(date: &str, title: &str) -> ImageRecord {
    ImageRecord {
        id: None,
        title: title.to_string(),
        date: date.to_string(),
        explanation: "A test entry".to_string(),
        url: format!("https://example.com/{date}.jpg"),
        hd_url: format!("https://example.com/{date}-hd.jpg"),
        media_type: MediaType::Image,
        copyright: "Example Observatory".to_string(),
    }
}

fn open_db(dir: &TempDir) -> Database {
    Database::new(dir.path().join("favorites.sqlite3")).expect("open database")
}

#[tokio::test]
async fn insert_assigns_id_and_round_trips() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    let record = sample("2023-05-01", "Galactic Center");
    let id = db.insert_favorite(&record).await.expect("insert");
    assert!(id > 0);

    let stored = db
        .get_favorite_by_date("2023-05-01")
        .await
        .expect("query")
        .expect("favorite present");
    assert_eq!(stored, ImageRecord { id: Some(id), ..record });
}

#[tokio::test]
async fn duplicate_date_is_rejected_and_count_unchanged() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    db.insert_favorite(&sample("2023-05-01", "First"))
        .await
        .expect("first insert");
    let before = db.favorites_count().await.expect("count");

    let result = db.insert_favorite(&sample("2023-05-01", "Second")).await;
    match result {
        Err(InsertError::DuplicateDate(date)) => assert_eq!(date, "2023-05-01"),
        other => panic!("expected DuplicateDate, got {other:?}"),
    }

    let after = db.favorites_count().await.expect("count");
    assert_eq!(before, after);
}

#[tokio::test]
async fn exists_tracks_insert_and_delete() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    assert!(!db.is_favorite("2023-05-01").await.expect("exists"));

    db.insert_favorite(&sample("2023-05-01", "Aurora"))
        .await
        .expect("insert");
    assert!(db.is_favorite("2023-05-01").await.expect("exists"));

    let removed = db
        .delete_favorite_by_date("2023-05-01")
        .await
        .expect("delete");
    assert_eq!(removed, 1);
    assert!(!db.is_favorite("2023-05-01").await.expect("exists"));

    let removed_again = db
        .delete_favorite_by_date("2023-05-01")
        .await
        .expect("delete");
    assert_eq!(removed_again, 0);
}

#[tokio::test]
async fn delete_by_id_removes_exactly_one_row() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    let id = db
        .insert_favorite(&sample("2023-05-01", "Pillars"))
        .await
        .expect("insert");
    db.insert_favorite(&sample("2023-05-02", "Nebula"))
        .await
        .expect("insert");

    assert_eq!(db.delete_favorite(id).await.expect("delete"), 1);
    assert_eq!(db.delete_favorite(id).await.expect("delete"), 0);
    assert_eq!(db.favorites_count().await.expect("count"), 1);
}

#[tokio::test]
async fn list_is_date_descending_and_matches_count() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    for date in ["2023-05-02", "2023-04-30", "2023-05-01"] {
        db.insert_favorite(&sample(date, "Entry")).await.expect("insert");
    }

    let favorites = db.get_all_favorites().await.expect("list");
    let dates: Vec<&str> = favorites.iter().map(|image| image.date.as_str()).collect();
    assert_eq!(dates, vec!["2023-05-02", "2023-05-01", "2023-04-30"]);

    let count = db.favorites_count().await.expect("count");
    assert_eq!(favorites.len() as i64, count);
}

#[tokio::test]
async fn empty_store_yields_empty_results() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    assert!(db.get_all_favorites().await.expect("list").is_empty());
    assert_eq!(db.favorites_count().await.expect("count"), 0);
    assert!(db
        .get_favorite_by_date("2023-05-01")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn favorites_survive_reopen() {
    let dir = TempDir::new().expect("temp dir");

    {
        let db = open_db(&dir);
        db.insert_favorite(&sample("2023-05-01", "Kept"))
            .await
            .expect("insert");
    }

    let db = open_db(&dir);
    let stored = db
        .get_favorite_by_date("2023-05-01")
        .await
        .expect("query")
        .expect("favorite survived reopen");
    assert_eq!(stored.title, "Kept");
}
