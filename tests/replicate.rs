mod common;

use std::collections::HashSet;

use common::{Call, FakeApi};
use edugame::ingest::{list_all_games, replicate};

fn ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("q{i}")).collect()
}

#[test]
fn every_pair_is_attempted_once() {
    let api = FakeApi::with_games(vec![vec!["g1", "g2", "g3", "g4", "g5"]]);
    let report = replicate(&api, &ids(9), 10);

    assert_eq!(report.games, 5);
    assert_eq!(report.attempted(), 45);
    assert_eq!(report.succeeded(), 45);

    let pairs: HashSet<_> = api.attachments().into_iter().collect();
    assert_eq!(pairs.len(), 45);
    assert!(api
        .calls
        .borrow()
        .iter()
        .all(|c| !matches!(c, Call::Attach { points, .. } if *points != 10)));
}

#[test]
fn a_failed_pair_does_not_block_the_others() {
    let api = FakeApi {
        failing_attachments: vec![("q1".to_string(), "g1".to_string())],
        ..FakeApi::with_games(vec![vec!["g1", "g2"]])
    };
    let report = replicate(&api, &ids(2), 5);

    assert_eq!(report.attempted(), 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 1);
    let failed = report.results.iter().find(|r| !r.succeeded()).unwrap();
    assert_eq!((failed.question_id.as_str(), failed.game_id.as_str()), ("q1", "g1"));
    assert_eq!(api.attachments().len(), 4);
}

#[test]
fn games_on_later_pages_are_included() {
    let api = FakeApi::with_games(vec![vec!["g1", "g2"], vec!["g3"], vec!["g4"]]);
    let (games, error) = list_all_games(&api);
    assert_eq!(games.len(), 4);
    assert!(error.is_none());

    let report = replicate(&api, &ids(1), 10);
    assert_eq!(report.attempted(), 4);
}

#[test]
fn listing_failure_keeps_earlier_pages() {
    let api = FakeApi {
        failing_game_page: Some(2),
        ..FakeApi::with_games(vec![vec!["g1"], vec!["g2"], vec!["g3"]])
    };
    let report = replicate(&api, &ids(2), 10);

    assert_eq!(report.games, 1);
    assert_eq!(report.attempted(), 2);
    assert!(report.listing_error.as_deref().unwrap().starts_with("page 2"));
}

#[test]
fn nothing_created_means_no_calls() {
    let api = FakeApi::with_games(vec![vec!["g1"]]);
    let report = replicate(&api, &[], 10);
    assert_eq!(report.attempted(), 0);
    assert!(api.calls.borrow().is_empty());
}
