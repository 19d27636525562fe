//! Live integration tests for dealflow-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/dealflow-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Duration, Utc};
use dealflow_db::{
    create_source, get_pending_deal, get_source, insert_feed_deal_if_new,
    insert_pending_deal_if_new, insert_published_deal, list_active_feed_deals, list_due_sources,
    list_pending_deals, list_published_deals, lock_pending_deal, mark_crawl_failure,
    mark_crawl_success, mark_pending_approved, mark_pending_rejected, purge_expired_feed_deals,
    update_published_prices, update_source, NewFeedDeal, NewFeedSource, NewPendingDeal,
    NewPublishedDeal, PendingStatus, UpdateFeedSource,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

async fn insert_test_source(pool: &sqlx::PgPool, name: &str, interval_minutes: i32) -> i64 {
    let source = create_source(
        pool,
        &NewFeedSource {
            name: name.to_string(),
            url: format!("https://{name}.example.com/rss"),
            category: "general".to_string(),
            crawl_interval_minutes: interval_minutes,
            priority: 0,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("insert_test_source failed for '{name}': {e}"));
    source.id
}

/// Backdates `last_crawled_at` so due-ness can be tested without sleeping.
async fn set_last_crawled_minutes_ago(pool: &sqlx::PgPool, source_id: i64, minutes: i64) {
    sqlx::query("UPDATE feed_sources SET last_crawled_at = $2 WHERE id = $1")
        .bind(source_id)
        .bind(Utc::now() - Duration::minutes(minutes))
        .execute(pool)
        .await
        .expect("backdate last_crawled_at");
}

fn make_feed_deal(guid: &str, source_id: i64) -> NewFeedDeal {
    NewFeedDeal {
        guid: guid.to_string(),
        title: "Test Deal".to_string(),
        description: "A deal for testing".to_string(),
        link: format!("https://deals.example.com/{guid}"),
        image_url: None,
        category: "general".to_string(),
        price: Some(dec("19.99")),
        original_price: Some(dec("39.99")),
        discount_percent: Some(dec("50.01")),
        store_name: Some("Walmart".to_string()),
        coupon_code: None,
        published_at: Utc::now(),
        expires_at: None,
        source_id,
    }
}

fn make_pending_deal(asin: &str) -> NewPendingDeal {
    NewPendingDeal {
        asin: asin.to_string(),
        title: "Wireless Earbuds".to_string(),
        description: Some("Noise cancelling".to_string()),
        price: dec("29.99"),
        original_price: dec("59.99"),
        discount_percent: dec("50.01"),
        image_url: None,
        product_url: format!("https://www.amazon.com/dp/{asin}"),
        category: "electronics".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Source registry and due-ness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn never_crawled_source_is_due(pool: sqlx::PgPool) {
    let id = insert_test_source(&pool, "fresh-source", 30).await;

    let due = list_due_sources(&pool).await.expect("list_due_sources");
    assert!(
        due.iter().any(|s| s.id == id),
        "source with NULL last_crawled_at must be due"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn due_ness_respects_per_source_interval(pool: sqlx::PgPool) {
    let overdue = insert_test_source(&pool, "overdue-source", 30).await;
    let recent = insert_test_source(&pool, "recent-source", 30).await;
    set_last_crawled_minutes_ago(&pool, overdue, 45).await;
    set_last_crawled_minutes_ago(&pool, recent, 10).await;

    let due = list_due_sources(&pool).await.expect("list_due_sources");
    assert!(due.iter().any(|s| s.id == overdue), "45min > 30min interval");
    assert!(!due.iter().any(|s| s.id == recent), "10min < 30min interval");
}

#[sqlx::test(migrations = "../../migrations")]
async fn inactive_sources_are_never_due(pool: sqlx::PgPool) {
    let id = insert_test_source(&pool, "paused-source", 30).await;
    let source = sqlx::query_scalar::<_, uuid::Uuid>(
        "SELECT public_id FROM feed_sources WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .expect("fetch public_id");

    update_source(
        &pool,
        source,
        &UpdateFeedSource {
            is_active: Some(false),
            ..UpdateFeedSource::default()
        },
    )
    .await
    .expect("update_source")
    .expect("source exists");

    let due = list_due_sources(&pool).await.expect("list_due_sources");
    assert!(!due.iter().any(|s| s.id == id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn crawl_success_stamps_time_and_resets_errors(pool: sqlx::PgPool) {
    let id = insert_test_source(&pool, "success-source", 30).await;
    mark_crawl_failure(&pool, id, "connect timeout")
        .await
        .expect("mark_crawl_failure");

    mark_crawl_success(&pool, id, 7, None)
        .await
        .expect("mark_crawl_success");

    let public_id = sqlx::query_scalar::<_, uuid::Uuid>(
        "SELECT public_id FROM feed_sources WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .expect("fetch public_id");
    let source = get_source(&pool, public_id)
        .await
        .expect("get_source")
        .expect("source exists");

    assert!(source.last_crawled_at.is_some());
    assert_eq!(source.total_items_crawled, 7);
    assert_eq!(source.error_count, 0, "clean crawl resets the counter");
}

#[sqlx::test(migrations = "../../migrations")]
async fn crawl_failure_leaves_source_due(pool: sqlx::PgPool) {
    let id = insert_test_source(&pool, "failing-source", 30).await;
    mark_crawl_failure(&pool, id, "dns lookup failed")
        .await
        .expect("mark_crawl_failure");
    mark_crawl_failure(&pool, id, "dns lookup failed")
        .await
        .expect("mark_crawl_failure");

    let due = list_due_sources(&pool).await.expect("list_due_sources");
    let source = due
        .iter()
        .find(|s| s.id == id)
        .expect("failed source must stay due for retry on the next tick");
    assert!(source.last_crawled_at.is_none());
    assert_eq!(source.error_count, 2);
    assert_eq!(source.last_error.as_deref(), Some("dns lookup failed"));
}

// ---------------------------------------------------------------------------
// Section 2: Feed deal dedup and purge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_guid_is_inserted_once(pool: sqlx::PgPool) {
    let source_id = insert_test_source(&pool, "dedup-source", 30).await;
    let deal = make_feed_deal("guid-abc123", source_id);

    let first = insert_feed_deal_if_new(&pool, &deal)
        .await
        .expect("first insert");
    let second = insert_feed_deal_if_new(&pool, &deal)
        .await
        .expect("second insert");

    assert!(first, "first sighting creates a row");
    assert!(!second, "re-crawl of the same guid is a no-op");

    let deals = list_active_feed_deals(&pool, 50, 0)
        .await
        .expect("list_active_feed_deals");
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].guid, "guid-abc123");
}

#[sqlx::test(migrations = "../../migrations")]
async fn purge_removes_only_expired_deals(pool: sqlx::PgPool) {
    let source_id = insert_test_source(&pool, "purge-source", 30).await;

    let mut expired = make_feed_deal("guid-expired", source_id);
    expired.expires_at = Some(Utc::now() - Duration::hours(1));
    let mut current = make_feed_deal("guid-current", source_id);
    current.expires_at = Some(Utc::now() + Duration::hours(1));
    let open_ended = make_feed_deal("guid-open", source_id);

    for deal in [&expired, &current, &open_ended] {
        assert!(insert_feed_deal_if_new(&pool, deal).await.expect("insert"));
    }

    let purged = purge_expired_feed_deals(&pool).await.expect("purge");
    assert_eq!(purged, 1);

    let remaining = list_active_feed_deals(&pool, 50, 0).await.expect("list");
    let guids: Vec<&str> = remaining.iter().map(|d| d.guid.as_str()).collect();
    assert!(guids.contains(&"guid-current"));
    assert!(guids.contains(&"guid-open"), "NULL expiry never purges");
    assert!(!guids.contains(&"guid-expired"));
}

// ---------------------------------------------------------------------------
// Section 3: Pending queue and moderation transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_asin_is_inserted_once(pool: sqlx::PgPool) {
    let deal = make_pending_deal("B0DUPE0001");

    assert!(insert_pending_deal_if_new(&pool, &deal).await.expect("first"));
    assert!(!insert_pending_deal_if_new(&pool, &deal).await.expect("second"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rejected_asin_is_not_resurrected_by_resync(pool: sqlx::PgPool) {
    let deal = make_pending_deal("B0REJECT01");
    insert_pending_deal_if_new(&pool, &deal).await.expect("insert");

    let pending = list_pending_deals(&pool, Some(PendingStatus::Pending), None, 10, 0)
        .await
        .expect("list");
    let id = pending[0].id;

    let mut tx = pool.begin().await.expect("begin");
    lock_pending_deal(&mut tx, id).await.expect("lock");
    mark_pending_rejected(&mut tx, id, "mod-alice", "price error in listing")
        .await
        .expect("reject");
    tx.commit().await.expect("commit");

    // The same asin coming back from a later sync must not reopen review.
    assert!(!insert_pending_deal_if_new(&pool, &deal).await.expect("resync"));

    let row = get_pending_deal(&pool, id)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(row.status, "rejected");
    assert_eq!(row.reviewed_by.as_deref(), Some("mod-alice"));
    assert_eq!(
        row.rejection_reason.as_deref(),
        Some("price error in listing")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn approval_transition_is_recorded(pool: sqlx::PgPool) {
    insert_pending_deal_if_new(&pool, &make_pending_deal("B0APPROVE1"))
        .await
        .expect("insert");
    let pending = list_pending_deals(&pool, Some(PendingStatus::Pending), None, 10, 0)
        .await
        .expect("list");
    let id = pending[0].id;

    let mut tx = pool.begin().await.expect("begin");
    let locked = lock_pending_deal(&mut tx, id).await.expect("lock");
    assert_eq!(locked.status, "pending");
    mark_pending_approved(&mut tx, id, "mod-bob")
        .await
        .expect("approve");
    tx.commit().await.expect("commit");

    let row = get_pending_deal(&pool, id)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(row.status, "approved");
    assert_eq!(row.reviewed_by.as_deref(), Some("mod-bob"));
    assert!(row.reviewed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_pending_filters_by_status_and_category(pool: sqlx::PgPool) {
    let mut electronics = make_pending_deal("B0FILTER01");
    electronics.category = "electronics".to_string();
    let mut home = make_pending_deal("B0FILTER02");
    home.category = "home".to_string();
    insert_pending_deal_if_new(&pool, &electronics).await.expect("insert");
    insert_pending_deal_if_new(&pool, &home).await.expect("insert");

    let only_home = list_pending_deals(&pool, Some(PendingStatus::Pending), Some("home"), 10, 0)
        .await
        .expect("list");
    assert_eq!(only_home.len(), 1);
    assert_eq!(only_home[0].asin, "B0FILTER02");

    let all = list_pending_deals(&pool, None, None, 10, 0).await.expect("list");
    assert_eq!(all.len(), 2);
}

// ---------------------------------------------------------------------------
// Section 4: Published deals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn publish_and_update_prices(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire");
    let published = insert_published_deal(
        &mut conn,
        &NewPublishedDeal {
            title: "Wireless Earbuds".to_string(),
            price: dec("29.99"),
            original_price: dec("59.99"),
            discount_percent: dec("50.01"),
            image_url: None,
            link: "https://www.amazon.com/dp/B0PUB00001?tag=dealflow-20".to_string(),
            category: "electronics".to_string(),
            is_hot: true,
            is_featured: false,
            coupon_code: None,
            promo_text: None,
            pending_deal_id: None,
            asin: Some("B0PUB00001".to_string()),
        },
    )
    .await
    .expect("insert_published_deal");
    drop(conn);

    assert_eq!(published.discount_percent, dec("50.01"));
    assert!(published.is_hot);

    let updated = update_published_prices(&pool, published.public_id, dec("24.99"), dec("49.99"))
        .await
        .expect("update_published_prices")
        .expect("row exists");
    assert_eq!(updated.price, dec("24.99"));
    assert_eq!(updated.discount_percent, dec("50.01"));

    let listed = list_published_deals(&pool, Some("electronics"), 10, 0)
        .await
        .expect("list_published_deals");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].public_id, published.public_id);
}
