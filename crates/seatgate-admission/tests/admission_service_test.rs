//! Integration tests for the admission controller.

use seatgate_admission::AdmissionController;
use seatgate_core::directory::Directory;
use seatgate_core::error::SeatgateError;
use seatgate_core::license::SeatLimit;
use seatgate_core::models::key::{SubscriptionKey, SubscriptionMap};
use seatgate_core::models::organization::{Feed, FeedAccess, LicenseTier, UpsertOrganization};
use seatgate_core::models::subscriber::CreateSubscriber;
use seatgate_core::repository::{OrganizationSource, SubscriberRepository};
use seatgate_core::snapshot::OrganizationSnapshot;
use seatgate_db::repository::{SurrealOrganizationSource, SurrealSubscriberRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type Db = surrealdb::engine::local::Db;

fn map(entries: &[(&str, &str, bool)]) -> SubscriptionMap {
    entries
        .iter()
        .map(|(org, feed, active)| (SubscriptionKey::new(*org, *feed), *active))
        .collect()
}

fn feed(id: &str, name: &str) -> Feed {
    Feed {
        id: id.into(),
        name: name.into(),
        access: FeedAccess::Open,
        paused: false,
    }
}

/// Spin up in-memory DB with two organizations: "acme" (Professional,
/// capped at 3) and "globex" (Organization, unbounded).
async fn setup() -> (
    SurrealSubscriberRepository<Db>,
    SurrealOrganizationSource<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    seatgate_db::run_migrations(&db).await.unwrap();

    let source = SurrealOrganizationSource::new(db.clone());
    source
        .upsert(UpsertOrganization {
            id: "acme".into(),
            name: "ACME Corp".into(),
            license: LicenseTier::Professional,
            feeds: vec![
                feed("daily", "Daily"),
                feed("weekly", "Weekly"),
                feed("monthly", "Monthly"),
            ],
        })
        .await
        .unwrap();
    source
        .upsert(UpsertOrganization {
            id: "globex".into(),
            name: "Globex".into(),
            license: LicenseTier::Organization,
            feeds: vec![feed("news", "News")],
        })
        .await
        .unwrap();

    (SurrealSubscriberRepository::new(db), source)
}

async fn create(
    repo: &SurrealSubscriberRepository<Db>,
    id: &str,
    email: &str,
    subscriptions: SubscriptionMap,
) {
    repo.create(CreateSubscriber {
        id: id.into(),
        email: Some(email.into()),
        subscriptions,
        metadata: None,
    })
    .await
    .unwrap();
}

async fn views(
    repo: &SurrealSubscriberRepository<Db>,
    source: &SurrealOrganizationSource<Db>,
) -> (Directory, OrganizationSnapshot) {
    let subscribers = repo.list_all().await.unwrap();
    let snapshot = source.load().await.unwrap();
    (Directory::new(subscribers, vec![]), snapshot)
}

/// Fill acme to its Professional cap of 3 distinct subscribers.
async fn fill_acme(repo: &SurrealSubscriberRepository<Db>) {
    create(repo, "u1", "u1@x.io", map(&[("acme", "daily", true)])).await;
    create(repo, "u2", "u2@x.io", map(&[("acme", "daily", true)])).await;
    create(repo, "u3", "u3@x.io", map(&[("acme", "weekly", true)])).await;
}

#[tokio::test]
async fn quota_boundary_scenario() {
    let (repo, source) = setup().await;
    fill_acme(&repo).await;
    create(&repo, "u4", "u4@x.io", map(&[])).await;

    let (directory, snapshot) = views(&repo, &source).await;
    let controller = AdmissionController::new(&directory, &snapshot);

    // A 4th distinct subscriber is denied, with the tier and the
    // numeric limit in the displayable reason.
    let fourth = directory.subscriber("u4");
    let decision = controller.can_grant("acme", fourth).unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.limit, SeatLimit::Limited(3));
    assert_eq!(decision.current, 3);
    assert_eq!(decision.remaining, Some(0));
    let reason = decision.reason.expect("denial must carry a reason");
    assert!(reason.contains("Professional"), "reason: {reason}");
    assert!(reason.contains('3'), "reason: {reason}");

    // One of the 3 gets a second feed: already counted, always allowed.
    let second_feed = controller
        .can_grant("acme", directory.subscriber("u1"))
        .unwrap();
    assert!(second_feed.allowed);
    assert!(second_feed.reason.is_none());
}

#[tokio::test]
async fn unbounded_tier_always_admits() {
    let (repo, source) = setup().await;
    for i in 0..10 {
        create(
            &repo,
            &format!("g{i}"),
            &format!("g{i}@x.io"),
            map(&[("globex", "news", true)]),
        )
        .await;
    }

    let (directory, snapshot) = views(&repo, &source).await;
    let controller = AdmissionController::new(&directory, &snapshot);

    let decision = controller.can_grant("globex", None).unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.limit, SeatLimit::Unbounded);
    assert_eq!(decision.current, 10);
    assert_eq!(decision.remaining, None);
}

#[tokio::test]
async fn noop_toggle_never_violates() {
    let (repo, source) = setup().await;
    fill_acme(&repo).await;

    let (directory, snapshot) = views(&repo, &source).await;
    let controller = AdmissionController::new(&directory, &snapshot);

    // acme is full, but re-asserting u1's already-active key is not an
    // admission.
    let u1 = directory.subscriber("u1").unwrap();
    let decision = controller
        .validate_change_set(Some(u1), &u1.subscriptions, &u1.subscriptions)
        .unwrap();
    assert!(decision.allowed);
    assert!(decision.violations.is_empty());
}

#[tokio::test]
async fn clearing_subscriptions_needs_no_admission() {
    let (repo, source) = setup().await;
    fill_acme(&repo).await;

    let (directory, snapshot) = views(&repo, &source).await;
    let controller = AdmissionController::new(&directory, &snapshot);

    let u1 = directory.subscriber("u1").unwrap();
    let decision = controller
        .validate_change_set(Some(u1), &u1.subscriptions, &map(&[]))
        .unwrap();
    assert!(decision.allowed);
}

#[tokio::test]
async fn change_set_collects_every_violation() {
    let (repo, source) = setup().await;
    // Second capped organization, also full.
    source
        .upsert(UpsertOrganization {
            id: "initech".into(),
            name: "Initech".into(),
            license: LicenseTier::Professional,
            feeds: vec![feed("memo", "Memo")],
        })
        .await
        .unwrap();
    fill_acme(&repo).await;
    for i in 0..3 {
        create(
            &repo,
            &format!("i{i}"),
            &format!("i{i}@x.io"),
            map(&[("initech", "memo", true)]),
        )
        .await;
    }
    create(&repo, "new", "new@x.io", map(&[])).await;

    let (directory, snapshot) = views(&repo, &source).await;
    let controller = AdmissionController::new(&directory, &snapshot);

    let after = map(&[
        ("acme", "daily", true),
        ("initech", "memo", true),
        ("globex", "news", true),
    ]);
    let newcomer = directory.subscriber("new").unwrap();
    let decision = controller
        .validate_change_set(Some(newcomer), &newcomer.subscriptions, &after)
        .unwrap();

    // Both capped organizations are reported at once; the unbounded
    // one is not.
    assert!(!decision.allowed);
    let mut violated: Vec<_> = decision
        .violations
        .iter()
        .map(|v| v.organization_id.clone())
        .collect();
    violated.sort();
    assert_eq!(violated, vec!["acme".to_string(), "initech".to_string()]);
}

#[tokio::test]
async fn unknown_organization_is_an_error() {
    let (repo, source) = setup().await;
    let (directory, snapshot) = views(&repo, &source).await;
    let controller = AdmissionController::new(&directory, &snapshot);

    let err = controller.can_grant("nonexistent", None).unwrap_err();
    assert!(matches!(err, SeatgateError::NotFound { .. }));
}
