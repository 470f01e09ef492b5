use super::*;
use crate::types::StationFamily;
use tempfile::NamedTempFile;


/// Helper to create a Database backed by a scratch file
async fn create_test_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

fn sample_product(name: &str) -> NewProduct {
    NewProduct {
        product_id: format!("id-{}", name),
        name: name.to_string(),
        available_at: 1_700_000_000,
    }
}

#[tokio::test]
async fn migrations_create_both_family_tables() {
    let (db, _file) = create_test_db().await;

    for family in StationFamily::all() {
        // An empty list proves the table exists and is queryable
        let rows = db.list_products(family).await.unwrap();
        assert!(rows.is_empty());
    }

    db.close().await;
}

#[tokio::test]
async fn migrations_are_idempotent_across_reopens() {
    let temp_file = NamedTempFile::new().unwrap();

    let db = Database::new(temp_file.path()).await.unwrap();
    db.insert_product(StationFamily::Adgs, &sample_product("A"))
        .await
        .unwrap();
    db.close().await;

    // Reopening must not re-run migration v1 (table already exists)
    let db = Database::new(temp_file.path()).await.unwrap();
    let rows = db.list_products(StationFamily::Adgs).await.unwrap();
    assert_eq!(rows.len(), 1);
    db.close().await;
}
