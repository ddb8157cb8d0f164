//! Integration tests for the reconciliation audit engine, driving the
//! in-memory SurrealDB store with a scripted identity source.

use std::collections::HashSet;
use std::time::Duration;

use seatgate_audit::{AuditConfig, AuditOutcome, CancelToken, ReconciliationAudit};
use seatgate_core::error::{SeatgateError, SeatgateResult};
use seatgate_core::models::key::{SubscriptionKey, SubscriptionMap};
use seatgate_core::models::organization::{Feed, FeedAccess, LicenseTier, UpsertOrganization};
use seatgate_core::models::subscriber::CreateSubscriber;
use seatgate_core::repository::{IdentityProvider, SubscriberRepository};
use seatgate_db::repository::{SurrealOrganizationSource, SurrealSubscriberRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type Db = surrealdb::engine::local::Db;

const OPERATOR: &str = "ops@example.com";

/// Scripted identity source: addresses in `known` have a sign-in
/// method, addresses in `failing` error out, everything else does not
/// exist.
#[derive(Clone, Default)]
struct ScriptedIdentity {
    known: HashSet<String>,
    failing: HashSet<String>,
}

impl ScriptedIdentity {
    fn knowing(emails: &[&str]) -> Self {
        Self {
            known: emails.iter().map(|e| e.to_string()).collect(),
            failing: HashSet::new(),
        }
    }

    fn failing_for(mut self, emails: &[&str]) -> Self {
        self.failing = emails.iter().map(|e| e.to_string()).collect();
        self
    }
}

impl IdentityProvider for ScriptedIdentity {
    async fn exists(&self, email: &str) -> SeatgateResult<Vec<String>> {
        if self.failing.contains(email) {
            return Err(SeatgateError::Identity("upstream returned 500".into()));
        }
        if self.known.contains(email) {
            Ok(vec!["password".into()])
        } else {
            Ok(vec![])
        }
    }
}

fn map(entries: &[(&str, &str, bool)]) -> SubscriptionMap {
    entries
        .iter()
        .map(|(org, feed, active)| (SubscriptionKey::new(*org, *feed), *active))
        .collect()
}

/// In-memory DB with one organization, "acme", carrying a single
/// "daily" feed.
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
            license: LicenseTier::Organization,
            feeds: vec![Feed {
                id: "daily".into(),
                name: "Daily".into(),
                access: FeedAccess::Open,
                paused: false,
            }],
        })
        .await
        .unwrap();

    (SurrealSubscriberRepository::new(db), source)
}

async fn create(
    repo: &SurrealSubscriberRepository<Db>,
    id: &str,
    email: Option<&str>,
    subscriptions: SubscriptionMap,
) {
    repo.create(CreateSubscriber {
        id: id.into(),
        email: email.map(Into::into),
        subscriptions,
        metadata: None,
    })
    .await
    .unwrap();
}

fn engine(
    identity: ScriptedIdentity,
    repo: SurrealSubscriberRepository<Db>,
    source: SurrealOrganizationSource<Db>,
) -> ReconciliationAudit<ScriptedIdentity, SurrealSubscriberRepository<Db>, SurrealOrganizationSource<Db>>
{
    ReconciliationAudit::new(
        identity,
        repo,
        source,
        AuditConfig::new(OPERATOR).with_item_delay(Duration::ZERO),
    )
}

#[tokio::test]
async fn aborts_when_self_check_finds_nothing() {
    let (repo, source) = setup().await;
    create(&repo, "u1", Some("u1@x.io"), map(&[("acme", "daily", true)])).await;

    // The identity source knows nobody, not even the operator: that is
    // enumeration protection, not a registry full of orphans.
    let audit = engine(ScriptedIdentity::default(), repo, source);
    let outcome = audit.run(&CancelToken::new(), |_| {}).await.unwrap();

    let AuditOutcome::Aborted { diagnostic } = outcome else {
        panic!("self-check failure must abort the run");
    };
    assert!(diagnostic.contains(OPERATOR), "diagnostic: {diagnostic}");
}

#[tokio::test]
async fn aborts_when_self_check_errors() {
    let (repo, source) = setup().await;
    create(&repo, "u1", Some("u1@x.io"), map(&[])).await;

    let identity = ScriptedIdentity::knowing(&[OPERATOR]).failing_for(&[OPERATOR]);
    let audit = engine(identity, repo, source);
    let outcome = audit.run(&CancelToken::new(), |_| {}).await.unwrap();

    assert!(matches!(outcome, AuditOutcome::Aborted { .. }));
}

#[tokio::test]
async fn detects_orphans() {
    let (repo, source) = setup().await;
    create(&repo, "u1", Some("u1@x.io"), map(&[("acme", "daily", true)])).await;
    create(&repo, "u2", Some("gone@x.io"), map(&[("acme", "daily", true)])).await;
    // A record with no email can never be an orphan.
    create(&repo, "u3", None, map(&[("acme", "daily", true)])).await;

    let identity = ScriptedIdentity::knowing(&[OPERATOR, "u1@x.io"]);
    let audit = engine(identity, repo, source);
    let outcome = audit.run(&CancelToken::new(), |_| {}).await.unwrap();

    let AuditOutcome::Completed(report) = outcome else {
        panic!("run must complete");
    };
    assert_eq!(report.scanned, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].subscriber_id, "u2");
    assert_eq!(report.orphans[0].email, "gone@x.io");
}

#[tokio::test]
async fn detects_stale_keys_from_a_single_snapshot() {
    let (repo, source) = setup().await;
    create(
        &repo,
        "u1",
        Some("u1@x.io"),
        map(&[
            ("acme", "daily", true),
            ("acme", "retired", true),
            ("ghost-org", "news", false),
        ]),
    )
    .await;
    create(&repo, "u2", Some("u2@x.io"), map(&[("acme", "daily", true)])).await;

    let identity = ScriptedIdentity::knowing(&[OPERATOR, "u1@x.io", "u2@x.io"]);
    let audit = engine(identity, repo, source);
    let outcome = audit.run(&CancelToken::new(), |_| {}).await.unwrap();

    let AuditOutcome::Completed(report) = outcome else {
        panic!("run must complete");
    };
    // Only u1 has dangling keys; the inactive ghost-org entry counts
    // too.
    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.stale[0].subscriber_id, "u1");
    let keys = &report.stale[0].stale_keys;
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&SubscriptionKey::new("acme", "retired")));
    assert!(keys.contains(&SubscriptionKey::new("ghost-org", "news")));
    assert!(report.orphans.is_empty());
}

#[tokio::test]
async fn transient_failure_skips_subscriber_from_both_lists() {
    let (repo, source) = setup().await;
    // u2 would be both an orphan and stale, but its lookup fails.
    create(
        &repo,
        "u2",
        Some("flaky@x.io"),
        map(&[("acme", "retired", true)]),
    )
    .await;
    create(&repo, "u1", Some("u1@x.io"), map(&[("acme", "daily", true)])).await;

    let identity = ScriptedIdentity::knowing(&[OPERATOR, "u1@x.io"]).failing_for(&["flaky@x.io"]);
    let audit = engine(identity, repo, source);
    let outcome = audit.run(&CancelToken::new(), |_| {}).await.unwrap();

    let AuditOutcome::Completed(report) = outcome else {
        panic!("run must complete");
    };
    assert_eq!(report.skipped, 1);
    assert!(report.orphans.is_empty());
    assert!(report.stale.is_empty());
}

#[tokio::test]
async fn cancellation_discards_findings() {
    let (repo, source) = setup().await;
    create(&repo, "u1", Some("gone@x.io"), map(&[("acme", "daily", true)])).await;

    let cancel = CancelToken::new();
    cancel.cancel();

    let identity = ScriptedIdentity::knowing(&[OPERATOR]);
    let audit = engine(identity, repo, source);
    let outcome = audit.run(&cancel, |_| {}).await.unwrap();

    assert!(matches!(outcome, AuditOutcome::Canceled));
}

#[tokio::test]
async fn progress_counts_every_subscriber() {
    let (repo, source) = setup().await;
    for i in 0..4 {
        create(
            &repo,
            &format!("u{i}"),
            Some(&format!("u{i}@x.io")),
            map(&[("acme", "daily", true)]),
        )
        .await;
    }

    let identity =
        ScriptedIdentity::knowing(&[OPERATOR, "u0@x.io", "u1@x.io", "u2@x.io", "u3@x.io"]);
    let audit = engine(identity, repo, source);

    let mut seen = Vec::new();
    let outcome = audit
        .run(&CancelToken::new(), |progress| seen.push(progress))
        .await
        .unwrap();

    assert!(matches!(outcome, AuditOutcome::Completed(_)));
    let currents: Vec<usize> = seen.iter().map(|p| p.current).collect();
    assert_eq!(currents, vec![1, 2, 3, 4]);
    assert!(seen.iter().all(|p| p.total == 4));
}
