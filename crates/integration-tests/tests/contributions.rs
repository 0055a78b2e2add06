use domains::{DomainError, IndexStore, LedgerErrorKind, VoteDirection};
use integration_tests::{board_draft, feedback_draft, Harness, ALICE, BOB, OWNER};
use services::identity;
use services::BoardEvent;

#[tokio::test]
async fn board_id_is_derived_from_creator_title_and_category() {
    let h = Harness::new();
    let draft = board_draft();
    let created = h.service.create_board(OWNER, &draft).await.unwrap();

    assert_eq!(
        created.board_id,
        identity::board_id(OWNER, &draft.title, &draft.category)
    );
    assert!(created.board_id.starts_with("0x"));
    assert_eq!(created.board_id.len(), 2 + 64);
}

#[tokio::test]
async fn second_create_of_the_same_board_is_rolled_back() {
    let h = Harness::new();
    let first = h.service.create_board(OWNER, &board_draft()).await.unwrap();

    let err = h.service.create_board(OWNER, &board_draft()).await.unwrap_err();
    assert!(matches!(err, DomainError::Ledger(e) if e.kind == LedgerErrorKind::SimulationFailed));
    assert_eq!(h.content.cids(), vec![first.cid]);
}

#[tokio::test]
async fn n_submissions_give_n_feedbacks() {
    let h = Harness::new();
    let board = h.board().await;

    for n in 0..5 {
        let actor = if n % 2 == 0 { ALICE } else { BOB };
        h.service
            .submit_feedback(actor, &board, &feedback_draft(n))
            .await
            .unwrap();
    }

    let view = h.service.load_board(&board).await.unwrap();
    assert!(view.content_available);
    assert_eq!(view.document.total_feedback_count, 5);
    assert_eq!(view.document.feedbacks.len(), 5);
    assert!(view.document.is_consistent());
    assert_eq!(view.document.latest_feedback_by.as_deref(), Some(ALICE));
    assert_eq!(h.ledger.board(OWNER, &board).unwrap().feedback_count, 5);
    // every superseded document was retired
    assert_eq!(h.content.len(), 1);
}

#[tokio::test]
async fn tags_are_normalized_and_type_inferred() {
    let h = Harness::new();
    let board = h.board().await;
    let mut draft = feedback_draft(0);
    draft.text = "I love the new dashboard, it is fast and the charts are really helpful for us.".into();
    draft.tags = vec!["Dashboard".into(), "#dashboard".into(), "Speed".into()];

    let outcome = h.service.submit_feedback(ALICE, &board, &draft).await.unwrap();
    let fb = outcome.document.feedback(&outcome.feedback_id).unwrap();
    assert_eq!(fb.feedback_type, domains::FeedbackType::Positive);
    assert_eq!(fb.tags, vec!["#dashboard", "#speed"]);
}

#[tokio::test]
async fn votes_are_counted_once_per_voter_and_direction() {
    let h = Harness::new();
    let board = h.board().await;
    let fb = h
        .service
        .submit_feedback(ALICE, &board, &feedback_draft(1))
        .await
        .unwrap()
        .feedback_id;

    let up = h.service.vote(BOB, &board, &fb, VoteDirection::Up).await.unwrap();
    let counted = up.document.feedback(&fb).unwrap();
    assert_eq!((counted.upvotes, counted.downvotes), (1, 0));

    let again = h.service.vote(BOB, &board, &fb, VoteDirection::Up).await.unwrap_err();
    assert!(matches!(again, DomainError::Forbidden(_)));

    let own = h.service.vote(ALICE, &board, &fb, VoteDirection::Down).await.unwrap_err();
    assert!(matches!(own, DomainError::Forbidden(_)));

    // submit + one upvote reached the ledger; the rejected votes did not
    let ledger = h.ledger.board(OWNER, &board).unwrap();
    assert_eq!((ledger.upvotes, ledger.downvotes), (1, 0));
    assert_eq!(h.ledger.calls().len(), 3);
}

#[tokio::test]
async fn vote_on_unknown_feedback_is_not_found() {
    let h = Harness::new();
    let board = h.board().await;
    let err = h
        .service
        .vote(BOB, &board, "0xmissing", VoteDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(kind, _) if kind == "feedback"));
    // the rejected vote uploaded nothing
    assert_eq!(h.content.len(), 1);
}

#[tokio::test]
async fn events_follow_successful_writes() {
    let h = Harness::new();
    let mut feed = h.service.events().subscribe();

    let board = h.board().await;
    let fb = h
        .service
        .submit_feedback(ALICE, &board, &feedback_draft(1))
        .await
        .unwrap();

    match feed.try_recv().unwrap() {
        BoardEvent::BoardCreated { board_id, .. } => assert_eq!(board_id, board),
        other => panic!("unexpected event {other:?}"),
    }
    match feed.try_recv().unwrap() {
        BoardEvent::FeedbackSubmitted { feedback_id, cid, .. } => {
            assert_eq!(feedback_id, fb.feedback_id);
            assert_eq!(cid, fb.cid);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(feed.try_recv().is_err());
}

#[tokio::test]
async fn boards_are_listed_by_owner() {
    let h = Harness::new();
    let board = h.board().await;

    let rows = h.service.boards_by_owner(OWNER).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].board_id, board);
    assert!(h.service.boards_by_owner(ALICE).await.unwrap().is_empty());
    assert!(h.index.get(&board).await.unwrap().unwrap().on_chain);
}
