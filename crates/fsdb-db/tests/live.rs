//! Live integration tests for fsdb-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/fsdb-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use fsdb_core::NormalizedEatery;
use fsdb_db::{
    complete_crawl_run, count_eateries, create_crawl_run, fail_crawl_run,
    find_eatery_by_external_id, get_crawl_run, insert_eatery, list_crawl_runs, start_crawl_run,
    update_eatery, upsert_eatery, CrawlRunCounts, DbError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_eatery(external_id: &str, name: &str) -> NormalizedEatery {
    NormalizedEatery {
        external_id: external_id.to_string(),
        name: Some(name.to_string()),
        avatar_url: Some(format!("https://cdn.example.com/{external_id}.jpg")),
        phone: None,
        slug: Some(format!("eatery-{external_id}")),
        street: Some("12 Lê Lợi".to_string()),
        district: Some("Quận 1".to_string()),
        city: Some("Hồ Chí Minh".to_string()),
        full_address: None,
        latitude: Some(10.7765),
        longitude: Some(106.7009),
        rating: Some(4.2),
        is_opening: true,
        is_opening_24h: false,
        minutes_until_next_status: Some(120),
        is_active: true,
        is_closed: false,
        operating_time_count: 7,
        promotion_count: 1,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Eateries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_inserts_then_updates_in_place(pool: sqlx::PgPool) {
    let first = make_eatery("42", "A");
    let is_new = upsert_eatery(&pool, &first, None).await.expect("first upsert");
    assert!(is_new, "first sighting should insert");

    let before = find_eatery_by_external_id(&pool, "42")
        .await
        .expect("find failed")
        .expect("row should exist");

    let mut second = make_eatery("42", "B");
    second.rating = None;
    let is_new = upsert_eatery(&pool, &second, None).await.expect("second upsert");
    assert!(!is_new, "second sighting should update");

    let after = find_eatery_by_external_id(&pool, "42")
        .await
        .expect("find failed")
        .expect("row should exist");

    assert_eq!(after.id, before.id, "update must be in place");
    assert_eq!(after.public_id, before.public_id);
    assert_eq!(after.name.as_deref(), Some("B"));
    assert!(after.rating.is_none(), "update is a full replace");
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(count_eateries(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn repeated_upserts_are_idempotent(pool: sqlx::PgPool) {
    let eatery = make_eatery("7", "Cơm Tấm");
    for _ in 0..3 {
        upsert_eatery(&pool, &eatery, None).await.expect("upsert failed");
    }

    assert_eq!(count_eateries(&pool).await.unwrap(), 1);
    let stored: NormalizedEatery = find_eatery_by_external_id(&pool, "7")
        .await
        .unwrap()
        .expect("row should exist")
        .into();
    assert_eq!(stored, eatery);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_upserts_of_one_id_leave_one_row(pool: sqlx::PgPool) {
    let a = make_eatery("99", "A");
    let b = make_eatery("99", "B");
    let (ra, rb) = tokio::join!(
        upsert_eatery(&pool, &a, None),
        upsert_eatery(&pool, &b, None)
    );
    let inserted = [ra.expect("upsert a"), rb.expect("upsert b")];

    assert_eq!(inserted.iter().filter(|&&new| new).count(), 1);
    assert_eq!(count_eateries(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn find_unknown_external_id_returns_none(pool: sqlx::PgPool) {
    let found = find_eatery_by_external_id(&pool, "does-not-exist")
        .await
        .expect("query should succeed");
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn external_id_match_is_exact(pool: sqlx::PgPool) {
    insert_eatery(&pool, &make_eatery("42", "A"), None).await.unwrap();

    assert!(find_eatery_by_external_id(&pool, "042")
        .await
        .unwrap()
        .is_none());
    assert!(find_eatery_by_external_id(&pool, "42 ")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_then_update_replaces_fields(pool: sqlx::PgPool) {
    insert_eatery(&pool, &make_eatery("5", "Old"), None)
        .await
        .expect("insert failed");

    let mut replacement = make_eatery("5", "New");
    replacement.is_closed = true;
    replacement.promotion_count = 0;
    update_eatery(&pool, &replacement, None)
        .await
        .expect("update failed");

    let stored: NormalizedEatery = find_eatery_by_external_id(&pool, "5")
        .await
        .unwrap()
        .unwrap()
        .into();
    assert_eq!(stored, replacement);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_insert_is_rejected(pool: sqlx::PgPool) {
    insert_eatery(&pool, &make_eatery("5", "A"), None).await.unwrap();
    let err = insert_eatery(&pool, &make_eatery("5", "B"), None)
        .await
        .expect_err("unique constraint should reject duplicate external_id");
    assert!(matches!(err, DbError::Sqlx(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_of_missing_row_is_not_found(pool: sqlx::PgPool) {
    let err = update_eatery(&pool, &make_eatery("404", "Nope"), None)
        .await
        .expect_err("update of a missing row should fail");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_stamps_the_run_that_last_saw_the_row(pool: sqlx::PgPool) {
    let first_run = create_crawl_run(&pool, "cli").await.unwrap();
    let second_run = create_crawl_run(&pool, "cli").await.unwrap();
    let eatery = make_eatery("42", "A");

    upsert_eatery(&pool, &eatery, Some(first_run.id))
        .await
        .expect("first upsert");
    let stored = find_eatery_by_external_id(&pool, "42")
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(stored.last_seen_run_id, Some(first_run.id));

    upsert_eatery(&pool, &eatery, Some(second_run.id))
        .await
        .expect("second upsert");
    let stored = find_eatery_by_external_id(&pool, "42")
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(stored.last_seen_run_id, Some(second_run.id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_stamps_the_run_that_last_saw_the_row(pool: sqlx::PgPool) {
    let run = create_crawl_run(&pool, "cli").await.unwrap();
    insert_eatery(&pool, &make_eatery("8", "A"), None)
        .await
        .unwrap();

    update_eatery(&pool, &make_eatery("8", "B"), Some(run.id))
        .await
        .expect("update failed");

    let stored = find_eatery_by_external_id(&pool, "8")
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(stored.last_seen_run_id, Some(run.id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_run_id_is_rejected(pool: sqlx::PgPool) {
    let err = upsert_eatery(&pool, &make_eatery("8", "A"), Some(777_777))
        .await
        .expect_err("foreign key should reject an unknown run");
    assert!(matches!(err, DbError::Sqlx(_)));
    assert_eq!(count_eateries(&pool).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Section 2: Crawl run lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn crawl_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_crawl_run(&pool, "cli")
        .await
        .expect("create_crawl_run failed");

    assert_eq!(run.status, "queued");
    assert!(run.started_at.is_none());
    assert!(run.completed_at.is_none());

    start_crawl_run(&pool, run.id)
        .await
        .expect("start_crawl_run failed");

    let counts = CrawlRunCounts {
        pages_planned: 10,
        pages_succeeded: 9,
        pages_failed: 1,
        records_inserted: 200,
        records_updated: 16,
        records_rejected: 2,
        records_failed: 0,
    };
    complete_crawl_run(&pool, run.id, counts)
        .await
        .expect("complete_crawl_run failed");

    let fetched = get_crawl_run(&pool, run.id)
        .await
        .expect("get_crawl_run failed");

    assert_eq!(fetched.status, "succeeded");
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());
    assert_eq!(fetched.pages_planned, 10);
    assert_eq!(fetched.pages_failed, 1);
    assert_eq!(fetched.records_inserted, 200);
    assert_eq!(fetched.records_updated, 16);
    assert!(fetched.error_message.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn crawl_run_lifecycle_queued_to_failed(pool: sqlx::PgPool) {
    let run = create_crawl_run(&pool, "cli").await.unwrap();
    start_crawl_run(&pool, run.id).await.unwrap();

    fail_crawl_run(
        &pool,
        run.id,
        CrawlRunCounts::default(),
        "planning failed: probe request failed",
    )
    .await
    .expect("fail_crawl_run failed");

    let fetched = get_crawl_run(&pool, run.id).await.unwrap();
    assert_eq!(fetched.status, "failed");
    assert_eq!(
        fetched.error_message.as_deref(),
        Some("planning failed: probe request failed")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn crawl_run_cannot_complete_directly_from_queued(pool: sqlx::PgPool) {
    let run = create_crawl_run(&pool, "cli").await.unwrap();

    let err = complete_crawl_run(&pool, run.id, CrawlRunCounts::default())
        .await
        .expect_err("completing a queued run should fail");

    assert!(matches!(
        err,
        DbError::InvalidCrawlRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn crawl_run_start_fails_for_unknown_id(pool: sqlx::PgPool) {
    let err = start_crawl_run(&pool, 999_999)
        .await
        .expect_err("starting an unknown run should fail");

    assert!(matches!(
        err,
        DbError::InvalidCrawlRunTransition {
            expected_status: "queued",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_crawl_run_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let err = get_crawl_run(&pool, 12_345).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_crawl_runs_returns_newest_first(pool: sqlx::PgPool) {
    let first = create_crawl_run(&pool, "cli").await.unwrap();
    let second = create_crawl_run(&pool, "cli").await.unwrap();

    let runs = list_crawl_runs(&pool, 10).await.unwrap();
    let ids: Vec<i64> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let limited = list_crawl_runs(&pool, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}
