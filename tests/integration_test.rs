mod helpers;

use chrono::{Duration, Utc};
use helpers::*;
use nebula_backend::config::RewardPolicy;
use nebula_backend::error::AppError;
use nebula_backend::models::*;
use nebula_backend::services::devlog_service::DevlogInput;
use nebula_backend::services::quest_service::QuestClaim;
use nebula_backend::services::review_service::ReviewOutcome;
use nebula_backend::store::Operation;
use rust_decimal::Decimal;

// =========================================================================
// Review queue
// =========================================================================

#[tokio::test]
async fn test_two_crazygood_votes_award_top_rate() {
    let app = TestApp::new();
    let owner = app.user("maker", UserRole::User, 0).await;
    let alice = app.user("alice", UserRole::Reviewer, 0).await;
    let bob = app.user("bob", UserRole::Reviewer, 0).await;
    let project = app.submitted_project(&owner, 4, 1).await;
    assert!(project.awaiting_review);

    let reviews = &app.state.reviews;
    let first = reviews
        .submit_basic_vote(&project.id, &alice.id, BasicVote::Crazygood)
        .await
        .expect("first vote");
    assert_eq!(first.outcome, ReviewOutcome::Pending);

    let second = reviews
        .submit_basic_vote(&project.id, &bob.id, BasicVote::Crazygood)
        .await
        .expect("second vote");
    assert_eq!(
        second.outcome,
        ReviewOutcome::Awarded {
            coins: 50,
            rate: Decimal::from(10)
        }
    );

    let owner = app.reload_user(&owner.id).await;
    assert_eq!(owner.coins, 50);

    let project = app.reload_project(&project.id).await;
    assert_eq!(project.status, ProjectStatus::Submitted);
    assert!(!project.awaiting_review);
    assert_eq!(project.coins_awarded, Some(50));
    assert_eq!(project.review_outcome.as_deref(), Some("award10"));

    let submission_id = project.ysws_submission_id.expect("linked submission");
    let submission = app
        .state
        .ysws_repo
        .find_by_id(&submission_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submission.coins_awarded, Some(50));
    assert_eq!(submission.hours_awarded, Some(Decimal::from(5)));
}

#[tokio::test]
async fn test_repeated_votes_never_award_twice() {
    let app = TestApp::new();
    let owner = app.user("maker", UserRole::User, 0).await;
    let reviewers = [
        app.user("r1", UserRole::Reviewer, 0).await,
        app.user("r2", UserRole::Reviewer, 0).await,
        app.user("r3", UserRole::Reviewer, 0).await,
    ];
    let project = app.submitted_project(&owner, 2, 0).await;

    let reviews = &app.state.reviews;
    reviews
        .submit_basic_vote(&project.id, &reviewers[0].id, BasicVote::Good)
        .await
        .unwrap();

    let repeat = reviews
        .submit_basic_vote(&project.id, &reviewers[0].id, BasicVote::Good)
        .await;
    assert!(matches!(repeat, Err(AppError::Conflict(_))));

    let awarded = reviews
        .submit_basic_vote(&project.id, &reviewers[1].id, BasicVote::Good)
        .await
        .unwrap();
    assert_eq!(
        awarded.outcome,
        ReviewOutcome::Awarded {
            coins: 18,
            rate: Decimal::from(9)
        }
    );

    // Marker is cleared, so later votes are refused
    let late = reviews
        .submit_basic_vote(&project.id, &reviewers[2].id, BasicVote::Crazygood)
        .await;
    assert!(matches!(late, Err(AppError::Conflict(_))));

    assert_eq!(app.reload_user(&owner.id).await.coins, 18);
}

#[tokio::test]
async fn test_reviewer_cannot_vote_on_own_project() {
    let app = TestApp::new();
    let reviewer = app.user("rev", UserRole::Reviewer, 0).await;
    let project = app.submitted_project(&reviewer, 3, 0).await;

    let result = app
        .state
        .reviews
        .submit_basic_vote(&project.id, &reviewer.id, BasicVote::Crazygood)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let queue = app.state.reviews.basic_queue(&reviewer.id).await.unwrap();
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_unsure_votes_escalate_to_second_review() {
    let app = TestApp::new();
    let owner = app.user("maker", UserRole::User, 0).await;
    let r1 = app.user("r1", UserRole::Reviewer, 0).await;
    let r2 = app.user("r2", UserRole::Reviewer, 0).await;
    let lead = app.user("lead", UserRole::Admin, 0).await;
    let project = app.submitted_project(&owner, 3, 0).await;

    let reviews = &app.state.reviews;
    reviews
        .submit_basic_vote(&project.id, &r1.id, BasicVote::Unsure)
        .await
        .unwrap();
    let escalated = reviews
        .submit_basic_vote(&project.id, &r2.id, BasicVote::Nothours)
        .await
        .unwrap();
    assert_eq!(escalated.outcome, ReviewOutcome::Escalated);
    assert_eq!(escalated.project.status, ProjectStatus::Second);

    let queue = reviews.second_queue().await.unwrap();
    assert_eq!(queue.len(), 1);

    let decided = reviews
        .submit_second_decision(&project.id, &lead.id, SecondDecision::Award9)
        .await
        .unwrap();
    assert_eq!(
        decided.outcome,
        ReviewOutcome::Awarded {
            coins: 27,
            rate: Decimal::from(9)
        }
    );
    assert_eq!(decided.project.status, ProjectStatus::Submitted);
    assert_eq!(app.reload_user(&owner.id).await.coins, 27);

    // Single decision per round
    let again = reviews
        .submit_second_decision(&project.id, &lead.id, SecondDecision::Award10)
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_back_to_wip_resets_review_state() {
    let app = TestApp::new();
    let owner = app.user("maker", UserRole::User, 0).await;
    let r1 = app.user("r1", UserRole::Reviewer, 0).await;
    let r2 = app.user("r2", UserRole::Reviewer, 0).await;
    let lead = app.user("lead", UserRole::Reviewer, 0).await;
    let project = app.submitted_project(&owner, 3, 0).await;

    let reviews = &app.state.reviews;
    for r in [&r1, &r2] {
        reviews
            .submit_basic_vote(&project.id, &r.id, BasicVote::Nothours)
            .await
            .unwrap();
    }

    let result = reviews
        .submit_second_decision(&project.id, &lead.id, SecondDecision::BackToWip)
        .await
        .unwrap();
    assert_eq!(result.outcome, ReviewOutcome::ReturnedToWip);

    let project = app.reload_project(&project.id).await;
    assert_eq!(project.status, ProjectStatus::Wip);
    let first_round = project.ysws_submission_id.clone().unwrap();
    assert_eq!(project.nothours, 0);
    assert!(project.reviewers.is_empty());
    assert!(!project.awaiting_review);
    assert_eq!(app.reload_user(&owner.id).await.coins, 0);

    // Resubmitting opens a fresh round
    let resubmitted = app
        .state
        .projects
        .submit_for_review(&owner.id, &project.id)
        .await
        .unwrap();
    assert!(resubmitted.awaiting_review);
    assert!(resubmitted.second_decision.is_none());

    let current_round = resubmitted.ysws_submission_id.clone().unwrap();
    assert_ne!(current_round, first_round);
    let ysws = &app.state.ysws_repo;
    let stale = ysws.find_by_id(&first_round).await.unwrap().unwrap();
    assert_eq!(stale.status, "superseded");
    let fresh = ysws.find_by_id(&current_round).await.unwrap().unwrap();
    assert_eq!(fresh.status, "pending");
}

#[tokio::test]
async fn test_award_without_ysws_record_writes_nothing() {
    let app = TestApp::new();
    let owner = app.user("maker", UserRole::User, 0).await;
    let r1 = app.user("r1", UserRole::Reviewer, 0).await;
    let r2 = app.user("r2", UserRole::Reviewer, 0).await;
    let project = app.submitted_project(&owner, 3, 0).await;

    let submission_id = project.ysws_submission_id.clone().unwrap();
    app.state.ysws_repo.delete(&submission_id).await.unwrap();

    let reviews = &app.state.reviews;
    reviews
        .submit_basic_vote(&project.id, &r1.id, BasicVote::Crazygood)
        .await
        .unwrap();
    let result = reviews
        .submit_basic_vote(&project.id, &r2.id, BasicVote::Crazygood)
        .await;
    assert!(matches!(result, Err(AppError::Message(_))));

    let project = app.reload_project(&project.id).await;
    assert_eq!(project.crazygood, 1);
    assert!(project.awaiting_review);
    assert_eq!(app.reload_user(&owner.id).await.coins, 0);
}

#[tokio::test]
async fn test_award_rolls_back_when_payout_record_fails() {
    let app = TestApp::new();
    let owner = app.user("maker", UserRole::User, 0).await;
    let r1 = app.user("r1", UserRole::Reviewer, 0).await;
    let r2 = app.user("r2", UserRole::Reviewer, 0).await;
    let project = app.submitted_project(&owner, 2, 0).await;

    let reviews = &app.state.reviews;
    reviews
        .submit_basic_vote(&project.id, &r1.id, BasicVote::Crazygood)
        .await
        .unwrap();

    app.store.fail_next(YSWS_TABLE, Operation::Update, 1).await;
    let result = reviews
        .submit_basic_vote(&project.id, &r2.id, BasicVote::Crazygood)
        .await;
    assert!(result.is_err());

    assert_eq!(app.reload_user(&owner.id).await.coins, 0);
    let project = app.reload_project(&project.id).await;
    assert!(project.awaiting_review);
    assert_eq!(project.crazygood, 1);
    assert_eq!(project.coins_awarded, None);
}

// =========================================================================
// Blackhole
// =========================================================================

#[tokio::test]
async fn test_blackhole_submission_debits_cost() {
    let app = TestApp::new();
    let user = app.user("maker", UserRole::User, 30).await;
    let project = app.project(&user, 12, 0).await;

    let submission = app
        .state
        .blackhole
        .submit_to_blackhole("maker", &project.id)
        .await
        .unwrap();

    assert_eq!(submission.status, SubmissionStatus::Pending);
    assert_eq!(submission.coin_cost, 10);
    assert_eq!(submission.hours, Decimal::from(12));
    assert_eq!(app.reload_user(&user.id).await.coins, 20);
}

#[tokio::test]
async fn test_blackhole_validation_order() {
    let app = TestApp::new();
    let poor = app.user("poor", UserRole::User, 5).await;
    let rich = app.user("rich", UserRole::User, 50).await;
    let small = app.project(&rich, 3, 0).await;
    let theirs = app.project(&poor, 20, 0).await;
    let blackhole = &app.state.blackhole;

    let err = blackhole.submit_to_blackhole("ghost", &small.id).await.unwrap_err();
    assert!(err.is_not_found());

    // Funds are checked before the project is even loaded
    let err = blackhole.submit_to_blackhole("poor", "recMissing").await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));

    let err = blackhole.submit_to_blackhole("rich", "recMissing").await.unwrap_err();
    assert!(err.is_not_found());

    let err = blackhole.submit_to_blackhole("rich", &theirs.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = blackhole.submit_to_blackhole("rich", &small.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(app.reload_user(&rich.id).await.coins, 50);
}

#[tokio::test]
async fn test_blackhole_create_failure_refunds_coins() {
    let app = TestApp::new();
    let user = app.user("maker", UserRole::User, 30).await;
    let project = app.project(&user, 10, 0).await;

    app.store.fail_next(BLACKHOLE_TABLE, Operation::Create, 1).await;
    let result = app
        .state
        .blackhole
        .submit_to_blackhole("maker", &project.id)
        .await;
    assert!(result.is_err());

    assert_eq!(app.reload_user(&user.id).await.coins, 30);
    assert_eq!(app.store.count(BLACKHOLE_TABLE).await, 0);
}

#[tokio::test]
async fn test_blackhole_rejects_duplicate_pending_submission() {
    let app = TestApp::new();
    let user = app.user("maker", UserRole::User, 30).await;
    let project = app.project(&user, 10, 0).await;
    let blackhole = &app.state.blackhole;

    blackhole.submit_to_blackhole("maker", &project.id).await.unwrap();
    let second = blackhole.submit_to_blackhole("maker", &project.id).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(app.reload_user(&user.id).await.coins, 20);
}

#[tokio::test]
async fn test_blackhole_decisions_are_idempotent() {
    let app = TestApp::new();
    let user = app.user("maker", UserRole::User, 30).await;
    let project = app.project(&user, 10, 0).await;
    let blackhole = &app.state.blackhole;
    let submission = blackhole.submit_to_blackhole("maker", &project.id).await.unwrap();

    let approved = blackhole
        .approve_blackhole_submission(&submission.id, "judge")
        .await
        .unwrap();
    assert_eq!(approved.status, SubmissionStatus::Approved);
    assert_eq!(approved.reviewer.as_deref(), Some("judge"));

    let again = blackhole
        .approve_blackhole_submission(&submission.id, "judge")
        .await
        .unwrap();
    assert_eq!(again.status, SubmissionStatus::Approved);
    assert_eq!(app.reload_user(&user.id).await.stellarships, 1);

    let reject = blackhole
        .reject_blackhole_submission(&submission.id, "judge", Some("changed my mind"))
        .await;
    assert!(matches!(reject, Err(AppError::Conflict(_))));

    assert!(blackhole.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blackhole_rejection_keeps_cost() {
    let app = TestApp::new();
    let user = app.user("maker", UserRole::User, 30).await;
    let project = app.project(&user, 10, 0).await;
    let blackhole = &app.state.blackhole;
    let submission = blackhole.submit_to_blackhole("maker", &project.id).await.unwrap();

    let empty = blackhole
        .reject_blackhole_submission(&submission.id, "  ", None)
        .await;
    assert!(matches!(empty, Err(AppError::Unauthorized(_))));

    let rejected = blackhole
        .reject_blackhole_submission(&submission.id, "judge", Some("not enough"))
        .await
        .unwrap();
    assert_eq!(rejected.status, SubmissionStatus::Rejected);
    assert_eq!(rejected.reason.as_deref(), Some("not enough"));

    let user = app.reload_user(&user.id).await;
    assert_eq!(user.coins, 20);
    assert_eq!(user.stellarships, 0);
}

// =========================================================================
// Bets
// =========================================================================

#[tokio::test]
async fn test_bet_won_and_claimed() {
    let app = TestApp::new();
    let user = app.user("gambler", UserRole::User, 50).await;
    let now = Utc::now();

    let bet = app
        .state
        .betting
        .place_bet(&user.id, 10, hours(5), now)
        .await
        .unwrap();
    assert_eq!(bet.status, BetStatus::Active);
    assert_eq!(bet.multiplier, Decimal::new(110, 2));
    assert_eq!(bet.end_date, now + Duration::days(7));
    assert_eq!(bet.expiry_date, now + Duration::days(14));
    assert_eq!(app.reload_user(&user.id).await.coins, 40);

    let early = app.state.betting.claim_bet(&user.id, &bet.id, now).await;
    assert!(matches!(early, Err(AppError::Conflict(_))));

    app.hours.set(6).await;
    let later = now + Duration::days(8);
    let claim = app
        .state
        .betting
        .claim_bet(&user.id, &bet.id, later)
        .await
        .unwrap();
    assert_eq!(claim.coins_earned, 11);
    assert_eq!(claim.bet.status, BetStatus::Claimed);
    assert_eq!(app.reload_user(&user.id).await.coins, 51);

    let twice = app.state.betting.claim_bet(&user.id, &bet.id, later).await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));
    assert_eq!(app.reload_user(&user.id).await.coins, 51);
}

#[tokio::test]
async fn test_bet_placement_rules() {
    let app = TestApp::new();
    let user = app.user("gambler", UserRole::User, 500).await;
    let betting = &app.state.betting;
    let now = Utc::now();

    let too_big = betting.place_bet(&user.id, 101, hours(5), now).await;
    assert!(matches!(too_big, Err(AppError::Validation(_))));

    let bad_tier = betting.place_bet(&user.id, 10, hours(7), now).await;
    assert!(matches!(bad_tier, Err(AppError::Validation(_))));

    betting.place_bet(&user.id, 10, hours(40), now).await.unwrap();
    let second = betting.place_bet(&user.id, 10, hours(5), now).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_bet_deleted_when_debit_fails() {
    let app = TestApp::new();
    let user = app.user("gambler", UserRole::User, 50).await;

    app.store
        .fail_next(USERS_TABLE, Operation::Update, 3)
        .await;
    let result = app
        .state
        .betting
        .place_bet(&user.id, 10, hours(5), Utc::now())
        .await;
    assert!(result.is_err());

    assert_eq!(app.store.count(BETS_TABLE).await, 0);
    assert_eq!(app.reload_user(&user.id).await.coins, 50);
}

#[tokio::test]
async fn test_list_bets_persists_lost_status() {
    let app = TestApp::new();
    let user = app.user("gambler", UserRole::User, 50).await;
    let now = Utc::now();
    let bet = app
        .state
        .betting
        .place_bet(&user.id, 10, hours(10), now)
        .await
        .unwrap();

    app.hours.set(2).await;
    let bets = app
        .state
        .betting
        .list_bets(&user.id, now + Duration::days(9))
        .await
        .unwrap();
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].status, BetStatus::Lost);

    let stored = app.state.bet_repo.find_by_id(&bet.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BetStatus::Lost);

    // Hours arriving late do not revive a lost bet
    app.hours.set(50).await;
    let claim = app
        .state
        .betting
        .claim_bet(&user.id, &bet.id, now + Duration::days(10))
        .await;
    assert!(matches!(claim, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_cannot_claim_someone_elses_bet() {
    let app = TestApp::new();
    let owner = app.user("owner", UserRole::User, 50).await;
    let thief = app.user("thief", UserRole::User, 0).await;
    let now = Utc::now();
    let bet = app
        .state
        .betting
        .place_bet(&owner.id, 10, hours(5), now)
        .await
        .unwrap();

    app.hours.set(10).await;
    let result = app
        .state
        .betting
        .claim_bet(&thief.id, &bet.id, now + Duration::days(8))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_won_bet_claims_while_hours_provider_is_down() {
    let app = TestApp::new();
    let user = app.user("gambler", UserRole::User, 50).await;
    let now = Utc::now();
    let bet = app
        .state
        .betting
        .place_bet(&user.id, 10, hours(5), now)
        .await
        .unwrap();

    app.hours.set(6).await;
    let bets = app
        .state
        .betting
        .list_bets(&user.id, now + Duration::days(8))
        .await
        .unwrap();
    assert_eq!(bets[0].status, BetStatus::Won);

    app.hours.set_failing(true).await;
    let claim = app
        .state
        .betting
        .claim_bet(&user.id, &bet.id, now + Duration::days(9))
        .await
        .unwrap();
    assert_eq!(claim.coins_earned, 11);
    assert_eq!(app.reload_user(&user.id).await.coins, 51);
}

// =========================================================================
// Devlogs and quests
// =========================================================================

#[tokio::test]
async fn test_streaks_count_only_submitted_projects() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let submitted = app.submitted_project(&user, 1, 0).await;
    let wip = app.project(&user, 1, 0).await;
    let now = Utc::now();

    for days_ago in 0..4 {
        app.devlog_at(&user, now - Duration::days(days_ago), 2, &[&submitted.id])
            .await;
    }
    app.devlog_at(&user, now - Duration::days(6), 5, &[&wip.id]).await;

    let stats = app.state.quests.devlog_stats(&user.id, now).await.unwrap();
    assert_eq!(stats.current_streak, 4);
    assert_eq!(stats.max_streak, 4);
    assert_eq!(stats.approved_hours, hours(8));
    assert_eq!(stats.total_hours, hours(13));
    assert_eq!(stats.approved_devlogs, 4);
    assert_eq!(stats.total_devlogs, 5);
}

#[tokio::test]
async fn test_create_devlog_updates_streak_markers() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let submitted = app.submitted_project(&user, 1, 0).await;
    let wip = app.project(&user, 1, 0).await;
    let now = Utc::now();

    app.devlog_at(&user, now - Duration::days(1), 1, &[&submitted.id]).await;

    let devlog = app
        .state
        .devlogs
        .create_devlog(
            &user.id,
            DevlogInput {
                content: "shipped the thing".into(),
                code_hours: hours(2),
                art_hours: hours(1),
                project_ids: vec![submitted.id.clone()],
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(devlog.hours, hours(3));
    assert_eq!(devlog.pending_code_hours, Decimal::ZERO);

    let user = app.reload_user(&user.id).await;
    assert_eq!(user.devlog_streak, 2);
    assert_eq!(user.max_devlog_streak, 2);

    let pending = app
        .state
        .devlogs
        .create_devlog(
            &user.id,
            DevlogInput {
                content: "sketches".into(),
                code_hours: Decimal::ZERO,
                art_hours: hours(2),
                project_ids: vec![wip.id.clone()],
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(pending.pending_art_hours, hours(2));
}

#[tokio::test]
async fn test_create_devlog_validation() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let other = app.user("other", UserRole::User, 0).await;
    let theirs = app.project(&other, 1, 0).await;
    let devlogs = &app.state.devlogs;

    let input = |ids: Vec<String>, code: i64| DevlogInput {
        content: "x".into(),
        code_hours: hours(code),
        art_hours: Decimal::ZERO,
        project_ids: ids,
    };

    let zero = devlogs.create_devlog(&user.id, input(vec![], 0), Utc::now()).await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let foreign = devlogs
        .create_devlog(&user.id, input(vec![theirs.id.clone()], 1), Utc::now())
        .await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let missing = devlogs
        .create_devlog(&user.id, input(vec!["recNope".into()], 1), Utc::now())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_quest_claim_is_idempotent() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let project = app.submitted_project(&user, 1, 0).await;
    let now = Utc::now();
    app.devlog_at(&user, now, 1, &[&project.id]).await;

    let quests = &app.state.quests;
    let claim = quests.claim_quest(&user.id, "first-devlog", now).await.unwrap();
    assert!(matches!(claim, QuestClaim::Claimed { .. }));
    assert_eq!(app.reload_user(&user.id).await.coins, 5);

    let again = quests.claim_quest(&user.id, "first-devlog", now).await.unwrap();
    assert_eq!(again, QuestClaim::AlreadyClaimed);

    let user = app.reload_user(&user.id).await;
    assert_eq!(user.coins, 5);
    assert_eq!(user.completed_quests, vec!["first-devlog".to_string()]);
}

#[tokio::test]
async fn test_quest_progress_separates_visual_and_approved() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let wip = app.project(&user, 1, 0).await;
    let now = Utc::now();
    app.devlog_at(&user, now, 12, &[&wip.id]).await;

    let progress = app.state.quests.progress(&user.id, now).await.unwrap();
    let hours_10 = progress.iter().find(|p| p.quest.id == "hours-10").unwrap();
    assert_eq!(hours_10.visual, hours(12));
    assert_eq!(hours_10.approved, Decimal::ZERO);
    assert!(!hours_10.completed);

    let claim = app.state.quests.claim_quest(&user.id, "hours-10", now).await;
    assert!(matches!(claim, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_tracked_hours_quest_tolerates_provider_outage() {
    let app = TestApp::new();
    let user = app.user("coder", UserRole::User, 0).await;
    let now = Utc::now();

    app.hours.set(30).await;
    app.hours.set_failing(true).await;
    let progress = app.state.quests.progress(&user.id, now).await.unwrap();
    let tracked = progress.iter().find(|p| p.quest.id == "tracked-25").unwrap();
    assert_eq!(tracked.approved, Decimal::ZERO);

    app.hours.set_failing(false).await;
    let claim = app.state.quests.claim_quest(&user.id, "tracked-25", now).await.unwrap();
    assert!(matches!(claim, QuestClaim::Claimed { .. }));
    assert_eq!(app.reload_user(&user.id).await.coins, 15);
}

#[tokio::test]
async fn test_custom_policy_threshold() {
    let app = TestApp::with_policy(RewardPolicy {
        review_vote_threshold: 1,
        ..RewardPolicy::default()
    });
    let owner = app.user("maker", UserRole::User, 0).await;
    let reviewer = app.user("rev", UserRole::Reviewer, 0).await;
    let project = app.submitted_project(&owner, 1, 0).await;

    let result = app
        .state
        .reviews
        .submit_basic_vote(&project.id, &reviewer.id, BasicVote::Crazygood)
        .await
        .unwrap();
    assert!(matches!(result.outcome, ReviewOutcome::Awarded { coins: 10, .. }));
}

// =========================================================================
// Rollback
// =========================================================================

#[tokio::test]
async fn test_bet_claim_reverts_when_credit_fails() {
    let app = TestApp::new();
    let user = app.user("gambler", UserRole::User, 50).await;
    let now = Utc::now();
    let bet = app
        .state
        .betting
        .place_bet(&user.id, 10, hours(5), now)
        .await
        .unwrap();

    app.hours.set(6).await;
    app.store.fail_next(USERS_TABLE, Operation::Update, 3).await;
    let result = app
        .state
        .betting
        .claim_bet(&user.id, &bet.id, now + Duration::days(8))
        .await;
    assert!(result.is_err());

    let stored = app.state.bet_repo.find_by_id(&bet.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BetStatus::Won);
    assert_eq!(stored.coins_earned, None);
    assert_eq!(stored.claimed_at, None);
    assert_eq!(app.reload_user(&user.id).await.coins, 40);

    // Once the store recovers the same bet pays out
    let claim = app
        .state
        .betting
        .claim_bet(&user.id, &bet.id, now + Duration::days(8))
        .await
        .unwrap();
    assert_eq!(claim.coins_earned, 11);
}

#[tokio::test]
async fn test_quest_claim_restores_completed_quests_when_credit_fails() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let project = app.submitted_project(&user, 1, 0).await;
    let now = Utc::now();
    app.devlog_at(&user, now, 1, &[&project.id]).await;

    // completedQuests write goes through, every credit attempt fails
    app.store
        .fail_after(USERS_TABLE, Operation::Update, 1, 3)
        .await;
    let result = app.state.quests.claim_quest(&user.id, "first-devlog", now).await;
    assert!(result.is_err());

    let reloaded = app.reload_user(&user.id).await;
    assert!(reloaded.completed_quests.is_empty());
    assert_eq!(reloaded.coins, 0);

    let claim = app
        .state
        .quests
        .claim_quest(&user.id, "first-devlog", now)
        .await
        .unwrap();
    assert!(matches!(claim, QuestClaim::Claimed { .. }));
    assert_eq!(app.reload_user(&user.id).await.coins, 5);
}

#[tokio::test]
async fn test_blackhole_approval_reopens_when_reward_fails() {
    let app = TestApp::new();
    let user = app.user("maker", UserRole::User, 30).await;
    let project = app.project(&user, 10, 0).await;
    let blackhole = &app.state.blackhole;
    let submission = blackhole.submit_to_blackhole("maker", &project.id).await.unwrap();

    app.store.fail_next(USERS_TABLE, Operation::Update, 3).await;
    let result = blackhole
        .approve_blackhole_submission(&submission.id, "judge")
        .await;
    assert!(result.is_err());

    let pending = blackhole.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, SubmissionStatus::Pending);
    assert_eq!(pending[0].reviewer, None);
    assert_eq!(app.reload_user(&user.id).await.stellarships, 0);
}

#[tokio::test]
async fn test_failed_compensation_leaves_state_for_repair() {
    let app = TestApp::new();
    let user = app.user("writer", UserRole::User, 0).await;
    let project = app.submitted_project(&user, 1, 0).await;
    let now = Utc::now();
    app.devlog_at(&user, now, 1, &[&project.id]).await;

    // Three credit attempts fail, then the restoring write fails too
    app.store
        .fail_after(USERS_TABLE, Operation::Update, 1, 4)
        .await;
    let result = app.state.quests.claim_quest(&user.id, "first-devlog", now).await;
    assert!(result.is_err());

    // Quest recorded without its reward; no further retries happen
    let reloaded = app.reload_user(&user.id).await;
    assert_eq!(reloaded.completed_quests, vec!["first-devlog".to_string()]);
    assert_eq!(reloaded.coins, 0);

    let again = app
        .state
        .quests
        .claim_quest(&user.id, "first-devlog", now)
        .await
        .unwrap();
    assert_eq!(again, QuestClaim::AlreadyClaimed);
}
