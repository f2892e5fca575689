use movie_sync::models::{Genre, Movie, MoviePatch, NewMovie};
use movie_sync::sqlite_store::SqliteStore;
use movie_sync::store::{MovieStore, StoreError};
use movie_sync::{db, migrate};
use tempfile::TempDir;

async fn open(tmp: &TempDir) -> SqliteStore {
    let pool = db::connect_path(&tmp.path().join("movies.sqlite"))
        .await
        .unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn movie(tmdb_id: i64, title: &str) -> Movie {
    NewMovie {
        tmdb_id,
        title: title.to_string(),
        overview: format!("{} overview", title),
        popularity: 12.25,
        vote_average: 8.7,
        vote_count: 3100,
        release_date: "1972-03-14".to_string(),
        genres: vec![
            Genre {
                id: 18,
                name: "Drama".to_string(),
            },
            Genre {
                id: 80,
                name: "Crime".to_string(),
            },
        ],
    }
    .into_movie()
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    migrate::run_migrations(store.pool()).await.unwrap();
    migrate::run_migrations(store.pool()).await.unwrap();
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_and_read_back() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    let m = movie(238, "The Godfather");
    store.insert_one(&m).await.unwrap();

    let fetched = store.find_by_id(&m.id).await.unwrap().unwrap();
    assert_eq!(fetched, m);
    assert!(store.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_external_ids() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    store
        .insert_many(&[movie(1, "A"), movie(2, "B"), movie(3, "C")])
        .await
        .unwrap();

    let mut found: Vec<i64> = store
        .find_by_external_ids(&[2, 3, 4])
        .await
        .unwrap()
        .iter()
        .map(|m| m.tmdb_id)
        .collect();
    found.sort();
    assert_eq!(found, vec![2, 3]);
    assert!(store.find_by_external_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_all_keeps_insertion_order() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    store
        .insert_many(&[movie(3, "C"), movie(1, "A"), movie(2, "B")])
        .await
        .unwrap();
    let titles: Vec<String> = store
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_duplicate_tmdb_id_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    store.insert_one(&movie(238, "The Godfather")).await.unwrap();

    let err = store
        .insert_one(&movie(238, "The Godfather (copy)"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[tokio::test]
async fn test_insert_many_rolls_back_on_conflict() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    store.insert_one(&movie(2, "B")).await.unwrap();

    let err = store
        .insert_many(&[movie(1, "A"), movie(2, "B again"), movie(3, "C")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
    assert_eq!(store.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_by_id() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    let a = movie(1, "A");
    let b = movie(2, "B");
    store.insert_many(&[a.clone(), b.clone()]).await.unwrap();

    let patch = MoviePatch {
        title: Some("A (restored)".to_string()),
        genres: Some(vec![]),
        ..Default::default()
    };
    let updated = store.update_by_id(&a.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.title, "A (restored)");
    assert!(updated.genres.is_empty());
    assert_eq!(store.find_by_id(&a.id).await.unwrap().unwrap(), updated);

    let clash = MoviePatch {
        tmdb_id: Some(2),
        ..Default::default()
    };
    assert!(matches!(
        store.update_by_id(&a.id, &clash).await.unwrap_err(),
        StoreError::Duplicate(_)
    ));
    assert!(store.update_by_id("missing", &patch).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_by_id_returns_record() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    let m = movie(1, "A");
    store.insert_one(&m).await.unwrap();

    assert_eq!(store.delete_by_id(&m.id).await.unwrap(), Some(m.clone()));
    assert!(store.delete_by_id(&m.id).await.unwrap().is_none());
    assert!(store.find_by_id(&m.id).await.unwrap().is_none());
}
