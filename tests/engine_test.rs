use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use quill::engine::ReplyEngine;
use quill::error::ReplyError;
use quill::events::Event;
use quill::generator::mock::MockGenerator;
use quill::generator::{GenerationRequest, ReplyGenerator};
use quill::review::{Language, ReplyState, ReviewId, ReviewItem, ReviewStatus, Tone};
use quill::session::{BusinessProfile, Session};
use quill::source::RemoteReview;
use quill::source::mock::MockSource;

fn profile() -> BusinessProfile {
    BusinessProfile {
        display_name: "Pho 24".to_string(),
        account_ref: "accounts/1".to_string(),
        location_ref: "locations/2".to_string(),
        credential: "ya29.token".to_string(),
        connected: false,
        business_type: Some("Vietnamese restaurant".to_string()),
        signature: None,
    }
}

fn remote(id: &str, rating: i32, content: &str) -> RemoteReview {
    RemoteReview {
        id: ReviewId::from(id),
        reviewer_name: format!("reviewer {id}"),
        rating,
        content: content.to_string(),
        created_at: "2026-03-03T10:15:00Z".to_string(),
        existing_reply: None,
        avatar_url: None,
    }
}

fn id(s: &str) -> ReviewId {
    ReviewId::from(s)
}

/// Connected engine with `reviews` loaded.
async fn build_engine(
    generator: Arc<dyn ReplyGenerator>,
    reviews: Vec<RemoteReview>,
) -> (ReplyEngine, Arc<MockSource>) {
    let source = Arc::new(MockSource::new(reviews));
    let engine = ReplyEngine::new(Arc::new(Session::new()), generator, source.clone());
    engine.connect(profile());
    engine.reload().await.unwrap();
    (engine, source)
}

async fn item(engine: &ReplyEngine, s: &str) -> ReviewItem {
    engine.store().get(&id(s)).await.unwrap()
}

/// Every item satisfies the status/content pairing.
async fn assert_invariants(engine: &ReplyEngine) {
    for item in engine.store().snapshot().await {
        match (&item.state, item.reply_content()) {
            (ReplyState::Pending, None) => {}
            (ReplyState::Drafted(_), Some(_)) | (ReplyState::Replied(_), Some(_)) => {}
            other => panic!("broken invariant on {}: {:?}", item.id, other),
        }
    }
}

/// A generator that parks until released, to hold the processing lock.
struct GatedGenerator {
    entered: Notify,
    release: Notify,
}

impl GatedGenerator {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for GatedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, ReplyError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("Thanks for waiting!".to_string())
    }
}

/// Parks on its first call only, so a test can act mid-batch.
struct FirstCallGate {
    parked: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl FirstCallGate {
    fn new() -> Self {
        Self {
            parked: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for FirstCallGate {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ReplyError> {
        if !self.parked.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(format!("Thanks, {}", request.reviewer_name))
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────

#[tokio::test]
async fn pending_to_drafted_to_replied() {
    let generator = Arc::new(MockGenerator::always("Thanks so much!"));
    let (engine, source) =
        build_engine(generator.clone(), vec![remote("r1", 5, "Great food!")]).await;

    let r1 = item(&engine, "r1").await;
    assert_eq!(r1.status(), ReviewStatus::Pending);
    assert!(r1.reply_content().is_none());

    let text = engine
        .generate(&id("r1"), Tone::Grateful, Language::English)
        .await
        .unwrap();
    assert_eq!(text, "Thanks so much!");
    let r1 = item(&engine, "r1").await;
    assert_eq!(r1.status(), ReviewStatus::Drafted);
    assert_eq!(r1.reply_content(), Some("Thanks so much!"));

    let request = &generator.requests()[0];
    assert_eq!(request.rating, 5);
    assert_eq!(request.content, "Great food!");
    assert_eq!(request.tone, Tone::Grateful);
    assert_eq!(request.language, Language::English);
    assert_eq!(request.business.display_name, "Pho 24");

    engine.publish(&id("r1"), "Thanks so much!").await.unwrap();
    let r1 = item(&engine, "r1").await;
    assert_eq!(r1.status(), ReviewStatus::Replied);
    assert_eq!(r1.reply_content(), Some("Thanks so much!"));
    assert_eq!(
        source.published(),
        vec![(id("r1"), "Thanks so much!".to_string())]
    );
    assert_invariants(&engine).await;
}

#[tokio::test]
async fn regenerate_replaces_draft() {
    let generator = Arc::new(MockGenerator::new(vec![
        Ok("First try".to_string()),
        Ok("Second try".to_string()),
    ]));
    let (engine, _) = build_engine(generator, vec![remote("r1", 4, "Nice")]).await;

    engine
        .generate(&id("r1"), Tone::Friendly, Language::English)
        .await
        .unwrap();
    engine
        .generate(&id("r1"), Tone::Witty, Language::French)
        .await
        .unwrap();

    assert_eq!(item(&engine, "r1").await.reply_content(), Some("Second try"));
}

#[tokio::test]
async fn edit_replaces_text_and_keeps_status() {
    let generator = Arc::new(MockGenerator::always("Generated"));
    let (engine, _) = build_engine(generator, vec![remote("r1", 4, "Nice")]).await;
    engine
        .generate(&id("r1"), Tone::Friendly, Language::English)
        .await
        .unwrap();

    let edited = engine.edit(&id("r1"), "Hand-written").await.unwrap();
    assert_eq!(edited.status(), ReviewStatus::Drafted);
    assert_eq!(edited.reply_content(), Some("Hand-written"));
}

#[tokio::test]
async fn existing_reply_loads_as_replied() {
    let mut answered = remote("r1", 5, "Great food!");
    answered.existing_reply = Some("We loved having you".to_string());
    let generator = Arc::new(MockGenerator::always("unused"));
    let (engine, _) = build_engine(generator, vec![answered, remote("r2", 3, "Ok")]).await;

    let r1 = item(&engine, "r1").await;
    assert_eq!(r1.status(), ReviewStatus::Replied);
    assert_eq!(r1.reply_content(), Some("We loved having you"));
    assert_eq!(engine.store().pending_ids().await, vec![id("r2")]);
}

// ── Replied is terminal ───────────────────────────────────────────

#[tokio::test]
async fn replied_rejects_every_operation() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, source) = build_engine(generator.clone(), vec![remote("r1", 5, "Great")]).await;
    engine
        .generate(&id("r1"), Tone::Grateful, Language::English)
        .await
        .unwrap();
    engine.publish(&id("r1"), "Thanks").await.unwrap();

    let err = engine
        .generate(&id("r1"), Tone::Grateful, Language::English)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReplyError::InvalidState {
            status: ReviewStatus::Replied,
            operation: "generate",
            ..
        }
    ));
    assert!(matches!(
        engine.edit(&id("r1"), "changed").await,
        Err(ReplyError::InvalidState { .. })
    ));
    assert!(matches!(
        engine.publish(&id("r1"), "again").await,
        Err(ReplyError::InvalidState { .. })
    ));

    assert_eq!(generator.calls(), 1);
    assert_eq!(source.published().len(), 1);
    assert_eq!(item(&engine, "r1").await.reply_content(), Some("Thanks"));
}

#[tokio::test]
async fn pending_cannot_be_published_or_edited() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, source) = build_engine(generator, vec![remote("r1", 5, "Great")]).await;

    let err = engine.publish(&id("r1"), "hello").await.unwrap_err();
    assert!(err.is_contract_violation());
    assert!(matches!(
        engine.edit(&id("r1"), "hello").await,
        Err(ReplyError::InvalidState { .. })
    ));
    assert!(source.published().is_empty());
    assert_eq!(item(&engine, "r1").await.status(), ReviewStatus::Pending);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, _) = build_engine(generator, vec![remote("r1", 5, "Great")]).await;

    let err = engine
        .generate(&id("nope"), Tone::Friendly, Language::English)
        .await
        .unwrap_err();
    assert_eq!(err, ReplyError::NotFound(id("nope")));
}

// ── Failure isolation ─────────────────────────────────────────────

#[tokio::test]
async fn failed_generation_leaves_pending() {
    let generator = Arc::new(MockGenerator::failing("rate limited"));
    let (engine, _) = build_engine(generator, vec![remote("r1", 2, "Slow")]).await;

    let err = engine
        .generate(&id("r1"), Tone::Empathetic, Language::English)
        .await
        .unwrap_err();
    assert!(matches!(err, ReplyError::GenerationFailed(_)));

    let r1 = item(&engine, "r1").await;
    assert_eq!(r1.status(), ReviewStatus::Pending);
    assert!(r1.reply_content().is_none());
    assert!(engine.in_flight().is_none());
}

#[tokio::test]
async fn failed_regeneration_keeps_old_draft() {
    let generator = Arc::new(MockGenerator::new(vec![
        Ok("Keep me".to_string()),
        Err("overloaded".to_string()),
    ]));
    let (engine, _) = build_engine(generator, vec![remote("r1", 2, "Slow")]).await;
    engine
        .generate(&id("r1"), Tone::Empathetic, Language::English)
        .await
        .unwrap();

    assert!(
        engine
            .generate(&id("r1"), Tone::Empathetic, Language::English)
            .await
            .is_err()
    );
    assert_eq!(item(&engine, "r1").await.reply_content(), Some("Keep me"));
}

#[tokio::test]
async fn blank_generation_is_a_failure() {
    let generator = Arc::new(MockGenerator::always("   \n "));
    let (engine, _) = build_engine(generator, vec![remote("r1", 4, "Nice")]).await;

    let err = engine
        .generate(&id("r1"), Tone::Friendly, Language::English)
        .await
        .unwrap_err();
    assert!(matches!(err, ReplyError::GenerationFailed(_)));
    assert_eq!(item(&engine, "r1").await.status(), ReviewStatus::Pending);
}

#[tokio::test]
async fn failed_publish_keeps_submitted_text() {
    let generator = Arc::new(MockGenerator::always("Generated"));
    let (engine, source) = build_engine(generator, vec![remote("r1", 5, "Great")]).await;
    engine
        .generate(&id("r1"), Tone::Grateful, Language::English)
        .await
        .unwrap();

    source.fail_publish(true);
    let err = engine.publish(&id("r1"), "Edited before sending").await.unwrap_err();
    assert!(matches!(err, ReplyError::PublishFailed(_)));

    let r1 = item(&engine, "r1").await;
    assert_eq!(r1.status(), ReviewStatus::Drafted);
    assert_eq!(r1.reply_content(), Some("Edited before sending"));

    // And the retry goes through with the same text.
    source.fail_publish(false);
    engine.publish(&id("r1"), "Edited before sending").await.unwrap();
    assert_eq!(item(&engine, "r1").await.status(), ReviewStatus::Replied);
}

// ── Batch ─────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_records_failures_and_continues() {
    let generator = Arc::new(MockGenerator::new(vec![
        Ok("Thanks A".to_string()),
        Err("overloaded".to_string()),
    ]));
    let (engine, _) =
        build_engine(generator.clone(), vec![remote("a", 5, "Good"), remote("b", 1, "Bad")]).await;

    let report = engine
        .draft_all(Tone::Professional, Language::English)
        .await
        .unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, &id("b"));
    assert!(matches!(failures[0].1, ReplyError::GenerationFailed(_)));

    assert_eq!(item(&engine, "a").await.reply_content(), Some("Thanks A"));
    assert_eq!(item(&engine, "b").await.status(), ReviewStatus::Pending);
    assert_eq!(generator.calls(), 2);
    assert_invariants(&engine).await;
}

#[tokio::test]
async fn batch_only_touches_pending_snapshot() {
    let mut answered = remote("done", 5, "Loved it");
    answered.existing_reply = Some("Thank you".to_string());
    let generator = Arc::new(MockGenerator::new(vec![
        Ok("Draft one".to_string()),
        Ok("Batch".to_string()),
    ]));
    let (engine, _) = build_engine(
        generator.clone(),
        vec![answered, remote("drafted", 4, "Nice"), remote("new", 3, "Ok")],
    )
    .await;
    engine
        .generate(&id("drafted"), Tone::Friendly, Language::English)
        .await
        .unwrap();

    let report = engine
        .draft_all(Tone::Friendly, Language::English)
        .await
        .unwrap();

    assert_eq!(report.attempted(), 1);
    assert_eq!(report.outcomes[0].id, id("new"));
    assert_eq!(item(&engine, "drafted").await.reply_content(), Some("Draft one"));
    assert_eq!(item(&engine, "done").await.reply_content(), Some("Thank you"));
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn batch_ignores_reviews_that_arrive_mid_run() {
    let gate = Arc::new(FirstCallGate::new());
    let (engine, source) =
        build_engine(gate.clone(), vec![remote("a", 5, "Good"), remote("b", 4, "Fine")]).await;

    let batch = engine.draft_all(Tone::Grateful, Language::English);
    let reload_during_first_item = async {
        gate.entered.notified().await;
        source.set_reviews(vec![
            remote("a", 5, "Good"),
            remote("b", 4, "Fine"),
            remote("late", 2, "Slow service"),
        ]);
        engine.reload().await.unwrap();
        gate.release.notify_one();
    };
    let (report, ()) = tokio::join!(batch, reload_during_first_item);
    let report = report.unwrap();

    assert_eq!(report.attempted(), 2);
    let attempted: Vec<_> = report.outcomes.iter().map(|o| o.id.clone()).collect();
    assert_eq!(attempted, vec![id("a"), id("b")]);
    assert_eq!(item(&engine, "late").await.status(), ReviewStatus::Pending);
    assert_eq!(item(&engine, "b").await.status(), ReviewStatus::Drafted);
    assert_invariants(&engine).await;
}

#[tokio::test]
async fn batch_reports_each_outcome_in_order() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, _) = build_engine(
        generator,
        vec![remote("a", 5, "x"), remote("b", 4, "y"), remote("c", 3, "z")],
    )
    .await;

    let mut seen = Vec::new();
    let report = engine
        .draft_all_with(Tone::Friendly, Language::Japanese, |outcome| {
            seen.push(outcome.id.clone())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec![id("a"), id("b"), id("c")]);
    assert_eq!(report.succeeded(), 3);
}

#[tokio::test]
async fn batch_with_nothing_pending_is_empty() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, _) = build_engine(generator.clone(), vec![]).await;

    let report = engine
        .draft_all(Tone::Friendly, Language::English)
        .await
        .unwrap();
    assert_eq!(report.attempted(), 0);
    assert_eq!(generator.calls(), 0);
}

// ── Processing lock ───────────────────────────────────────────────

#[tokio::test]
async fn second_operation_is_busy_while_one_is_in_flight() {
    let gated = Arc::new(GatedGenerator::new());
    let (engine, _) = build_engine(
        gated.clone(),
        vec![remote("r1", 5, "Great"), remote("r2", 4, "Good")],
    )
    .await;
    let engine = Arc::new(engine);

    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .generate(&id("r1"), Tone::Grateful, Language::English)
                .await
        })
    };
    gated.entered.notified().await;
    assert_eq!(engine.in_flight(), Some(id("r1")));

    let err = engine
        .generate(&id("r2"), Tone::Grateful, Language::English)
        .await
        .unwrap_err();
    assert_eq!(err, ReplyError::Busy { holder: id("r1") });
    assert!(matches!(
        engine.draft_all(Tone::Grateful, Language::English).await,
        Err(ReplyError::Busy { .. })
    ));

    gated.release.notify_one();
    assert_eq!(running.await.unwrap().unwrap(), "Thanks for waiting!");
    assert!(engine.in_flight().is_none());
    assert_eq!(item(&engine, "r2").await.status(), ReviewStatus::Pending);
}

#[tokio::test]
async fn editing_the_in_flight_item_is_busy() {
    let gated = Arc::new(GatedGenerator::new());
    let (engine, _) = build_engine(
        gated.clone(),
        vec![remote("r1", 5, "Great"), remote("r2", 4, "Good")],
    )
    .await;

    // let r2's draft through, then clear the stale "entered" permit
    gated.release.notify_one();
    engine
        .generate(&id("r2"), Tone::Friendly, Language::English)
        .await
        .unwrap();
    gated.entered.notified().await;
    gated.release.notify_one();
    engine
        .generate(&id("r1"), Tone::Friendly, Language::English)
        .await
        .unwrap();
    gated.entered.notified().await;

    let engine = Arc::new(engine);
    let regenerating = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .generate(&id("r1"), Tone::Witty, Language::English)
                .await
        })
    };
    gated.entered.notified().await;

    assert_eq!(
        engine.edit(&id("r1"), "my words").await.unwrap_err(),
        ReplyError::Busy { holder: id("r1") }
    );
    let other = engine.edit(&id("r2"), "still editable").await.unwrap();
    assert_eq!(other.reply_content(), Some("still editable"));

    gated.release.notify_one();
    regenerating.await.unwrap().unwrap();
    assert_eq!(
        item(&engine, "r1").await.reply_content(),
        Some("Thanks for waiting!")
    );
}

// ── Loading ───────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_rating_is_flagged_not_fatal() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, _) = build_engine(
        generator,
        vec![remote("good", 4, "Nice"), remote("odd", -1, "???")],
    )
    .await;

    assert_eq!(engine.store().len().await, 2);
    let flagged = engine.store().flagged().await;
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].id, id("odd"));
    assert_eq!(flagged[0].rating(), -1);
}

#[tokio::test]
async fn failed_reload_keeps_previous_snapshot() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, source) = build_engine(generator, vec![remote("r1", 5, "Great")]).await;
    engine
        .generate(&id("r1"), Tone::Grateful, Language::English)
        .await
        .unwrap();

    source.fail_list(true);
    assert!(matches!(
        engine.reload().await,
        Err(ReplyError::SourceUnavailable(_))
    ));
    assert_eq!(item(&engine, "r1").await.reply_content(), Some("Thanks"));
}

#[tokio::test]
async fn reload_uses_profile_location_and_credential() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, source) = build_engine(generator, vec![]).await;

    engine.session().set_credential("refreshed".to_string());
    engine.reload().await.unwrap();

    let calls = source.list_calls();
    assert_eq!(
        calls.last().unwrap(),
        &(
            "accounts/1/locations/2".to_string(),
            "refreshed".to_string()
        )
    );
}

// ── Session ───────────────────────────────────────────────────────

#[tokio::test]
async fn operations_need_a_session() {
    let source = Arc::new(MockSource::new(vec![remote("r1", 5, "Great")]));
    let engine = ReplyEngine::new(
        Arc::new(Session::new()),
        Arc::new(MockGenerator::always("Thanks")),
        source.clone(),
    );

    assert_eq!(engine.reload().await.unwrap_err(), ReplyError::NotConnected);
    assert_eq!(
        engine
            .draft_all(Tone::Friendly, Language::English)
            .await
            .unwrap_err(),
        ReplyError::NotConnected
    );
    assert!(source.list_calls().is_empty());
}

#[tokio::test]
async fn disconnect_clears_reviews_and_notifies() {
    let generator = Arc::new(MockGenerator::always("Thanks"));
    let (engine, _) = build_engine(generator, vec![remote("r1", 5, "Great")]).await;
    let mut events = engine.session().subscribe();

    engine.disconnect().await;

    assert!(engine.store().is_empty().await);
    assert!(!engine.session().is_connected());
    assert!(matches!(events.recv().await.unwrap(), Event::Disconnected));
    assert_eq!(
        engine
            .generate(&id("r1"), Tone::Friendly, Language::English)
            .await
            .unwrap_err(),
        ReplyError::NotConnected
    );
}
