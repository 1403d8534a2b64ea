//! Tests for the library importer
//!
//! Covers the per-id reporting contract, the never-played shortcut, cache
//! reuse keyed on last-played time, and batch-level failure fan-out.

use async_trait::async_trait;
use gamesync_types::{
    Achievement, FriendInfo, GameId, GameTime, OwnedGameRecord, UserId, UserProfile,
};
use hashbrown::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use super::LibraryImporter;
use crate::error::SyncError;
use crate::session::Session;
use crate::source::{ImportSink, LibrarySource};

#[derive(Default)]
struct FakeSource {
    games: Mutex<Vec<OwnedGameRecord>>,
    achievements: Mutex<HashMap<GameId, Result<Vec<Achievement>, SyncError>>>,
    owned_games_error: Mutex<Option<SyncError>>,
    owned_games_calls: AtomicUsize,
    achievement_calls: Mutex<Vec<GameId>>,
    holds: Mutex<HashMap<GameId, Arc<Notify>>>,
}

impl FakeSource {
    fn with_game(self, id: &str, hours: f64, last_played: Option<i64>) -> Self {
        self.games.lock().unwrap().push(OwnedGameRecord {
            id: GameId::from(id),
            name: format!("Game {id}"),
            hours_played_total: hours,
            last_played,
        });
        self
    }

    fn with_achievements(self, id: &str, result: Result<Vec<Achievement>, SyncError>) -> Self {
        self.achievements
            .lock()
            .unwrap()
            .insert(GameId::from(id), result);
        self
    }

    fn set_last_played(&self, id: &str, last_played: i64) {
        let mut games = self.games.lock().unwrap();
        let game = games.iter_mut().find(|g| g.id.as_str() == id).unwrap();
        game.last_played = Some(last_played);
    }

    /// Park fetches for `id` until the returned handle is notified.
    fn hold(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(GameId::from(id), Arc::clone(&gate));
        gate
    }

    fn fail_owned_games(&self, error: SyncError) {
        *self.owned_games_error.lock().unwrap() = Some(error);
    }

    fn fetches_for(&self, id: &str) -> usize {
        self.achievement_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.as_str() == id)
            .count()
    }

    fn total_fetches(&self) -> usize {
        self.achievement_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LibrarySource for FakeSource {
    async fn profile(&self) -> Result<UserProfile, SyncError> {
        Ok(UserProfile {
            user_id: UserId::new("42"),
            login: "tester".to_string(),
        })
    }

    async fn owned_games(&self, _user_id: &UserId) -> Result<Vec<OwnedGameRecord>, SyncError> {
        self.owned_games_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.owned_games_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.games.lock().unwrap().clone())
    }

    async fn achievements(
        &self,
        _user_id: &UserId,
        game_id: &GameId,
    ) -> Result<Vec<Achievement>, SyncError> {
        self.achievement_calls.lock().unwrap().push(game_id.clone());
        let gate = self.holds.lock().unwrap().get(game_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;
        self.achievements
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .unwrap_or_else(|| Err(SyncError::UpstreamUnavailable(format!("no page for {game_id}"))))
    }

    async fn friends(&self, _user_id: &UserId) -> Result<Vec<FriendInfo>, SyncError> {
        Ok(vec![FriendInfo {
            user_id: UserId::new("7"),
            user_name: "buddy".to_string(),
        }])
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Report {
    Achievements(GameId, Result<Vec<Achievement>, SyncError>),
    GameTime(GameId, Result<GameTime, SyncError>),
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<Report>>);

impl RecordingSink {
    fn reports(&self) -> Vec<Report> {
        self.0.lock().unwrap().clone()
    }

    fn achievements_for(&self, id: &str) -> Vec<Result<Vec<Achievement>, SyncError>> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                Report::Achievements(game_id, result) if game_id.as_str() == id => Some(result),
                _ => None,
            })
            .collect()
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl ImportSink for RecordingSink {
    fn achievements_import_success(&self, game_id: &GameId, achievements: Vec<Achievement>) {
        self.0
            .lock()
            .unwrap()
            .push(Report::Achievements(game_id.clone(), Ok(achievements)));
    }

    fn achievements_import_failure(&self, game_id: &GameId, error: SyncError) {
        self.0
            .lock()
            .unwrap()
            .push(Report::Achievements(game_id.clone(), Err(error)));
    }

    fn game_time_import_success(&self, game_time: GameTime) {
        self.0
            .lock()
            .unwrap()
            .push(Report::GameTime(game_time.game_id.clone(), Ok(game_time)));
    }

    fn game_time_import_failure(&self, game_id: &GameId, error: SyncError) {
        self.0
            .lock()
            .unwrap()
            .push(Report::GameTime(game_id.clone(), Err(error)));
    }
}

fn ids(raw: &[&str]) -> Vec<GameId> {
    raw.iter().map(|id| GameId::from(*id)).collect()
}

fn unlocked(name: &str) -> Vec<Achievement> {
    vec![Achievement::new(1_500_000_000, name)]
}

async fn setup(source: FakeSource) -> (LibraryImporter, Arc<FakeSource>, Arc<RecordingSink>) {
    let source = Arc::new(source);
    let sink = Arc::new(RecordingSink::default());
    let session = Arc::new(Session::new());
    session.authenticate(source.as_ref()).await.unwrap();
    let importer = LibraryImporter::new(session, source.clone(), sink.clone());
    (importer, source, sink)
}

fn reported_ids(sink: &RecordingSink) -> Vec<GameId> {
    sink.reports()
        .into_iter()
        .map(|r| match r {
            Report::Achievements(id, _) | Report::GameTime(id, _) => id,
        })
        .collect()
}

#[tokio::test]
async fn test_unauthenticated_import_fails_synchronously() {
    let source = Arc::new(FakeSource::default().with_game("10", 1.0, Some(100)));
    let sink = Arc::new(RecordingSink::default());
    let importer = LibraryImporter::new(Arc::new(Session::new()), source.clone(), sink.clone());

    let result = importer.import_achievements(&ids(&["10"])).await;
    assert_eq!(result, Err(SyncError::NotAuthenticated));
    assert!(importer.start_game_times_import(&ids(&["10"])).is_err());
    assert!(sink.reports().is_empty());
    assert_eq!(source.owned_games_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_report_per_distinct_id() {
    let source = FakeSource::default()
        .with_game("10", 2.0, Some(100))
        .with_game("20", 0.0, Some(100))
        .with_game("30", 5.0, Some(300))
        .with_achievements("10", Ok(unlocked("First Blood")));
    // 30 has no achievements page: fetch fails. 40 is not owned: empty.
    let (importer, _source, sink) = setup(source).await;

    let request = ids(&["10", "20", "10", "30", "40", "20"]);
    let report = importer.import_achievements(&request).await.unwrap();

    assert_eq!(report.requested, 4);
    assert_eq!(report.reported(), 4);
    assert_eq!(report.failed, 1);

    let reported = reported_ids(&sink);
    let distinct: HashSet<_> = reported.iter().cloned().collect();
    assert_eq!(reported.len(), 4, "no duplicate reports");
    assert_eq!(distinct, request.into_iter().collect::<HashSet<_>>());
}

#[tokio::test]
async fn test_empty_request_reports_nothing() {
    let (importer, _source, sink) = setup(FakeSource::default()).await;
    let report = importer.import_achievements(&[]).await.unwrap();
    assert_eq!(report.reported(), 0);
    assert!(sink.reports().is_empty());
}

#[tokio::test]
async fn test_never_played_games_skip_fetch() {
    let source = FakeSource::default()
        .with_game("10", 0.0, Some(100))
        .with_game("20", 12.0, None);
    let (importer, source, sink) = setup(source).await;

    let report = importer
        .import_achievements(&ids(&["10", "20", "99"]))
        .await
        .unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.fetched, 0);
    assert_eq!(source.total_fetches(), 0);
    for id in ["10", "20", "99"] {
        assert_eq!(sink.achievements_for(id), vec![Ok(Vec::new())]);
    }
}

#[tokio::test]
async fn test_cache_reused_until_played_again() {
    let source = FakeSource::default()
        .with_game("10", 3.0, Some(1000))
        .with_achievements("10", Ok(unlocked("Marathon")));
    let (importer, source, sink) = setup(source).await;

    let first = importer.import_achievements(&ids(&["10"])).await.unwrap();
    assert_eq!(first.fetched, 1);
    assert_eq!(source.fetches_for("10"), 1);
    assert_eq!(importer.achievements_cache().timestamp(&GameId::from("10")), Some(1000));

    sink.clear();
    let second = importer.import_achievements(&ids(&["10"])).await.unwrap();
    assert_eq!(second.from_cache, 1);
    assert_eq!(source.fetches_for("10"), 1, "same last-played, no refetch");
    assert_eq!(sink.achievements_for("10"), vec![Ok(unlocked("Marathon"))]);

    source.set_last_played("10", 2000);
    sink.clear();
    let third = importer.import_achievements(&ids(&["10"])).await.unwrap();
    assert_eq!(third.fetched, 1);
    assert_eq!(source.fetches_for("10"), 2);
    assert_eq!(importer.achievements_cache().timestamp(&GameId::from("10")), Some(2000));
}

#[tokio::test]
async fn test_identical_last_played_serves_stale_achievements() {
    // Last-played is the freshness key. Two sessions that report the same
    // last-played value keep serving the first fetch.
    let source = FakeSource::default()
        .with_game("10", 3.0, Some(1000))
        .with_achievements("10", Ok(unlocked("Old")));
    let (importer, source, sink) = setup(source).await;

    importer.import_achievements(&ids(&["10"])).await.unwrap();
    source
        .achievements
        .lock()
        .unwrap()
        .insert(GameId::from("10"), Ok(unlocked("New")));

    sink.clear();
    importer.import_achievements(&ids(&["10"])).await.unwrap();
    assert_eq!(sink.achievements_for("10"), vec![Ok(unlocked("Old"))]);
    assert_eq!(source.fetches_for("10"), 1);
}

#[tokio::test]
async fn test_one_failure_does_not_affect_others() {
    let source = FakeSource::default()
        .with_game("10", 1.0, Some(10))
        .with_game("20", 1.0, Some(20))
        .with_game("30", 1.0, Some(30))
        .with_achievements("10", Ok(unlocked("A")))
        .with_achievements(
            "20",
            Err(SyncError::MalformedUpstreamData("bad row".to_string())),
        )
        .with_achievements("30", Ok(unlocked("C")));
    let (importer, source, sink) = setup(source).await;

    let report = importer
        .import_achievements(&ids(&["10", "20", "30"]))
        .await
        .unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(source.total_fetches(), 3);
    assert_eq!(sink.achievements_for("10"), vec![Ok(unlocked("A"))]);
    assert_eq!(
        sink.achievements_for("20"),
        vec![Err(SyncError::MalformedUpstreamData("bad row".to_string()))]
    );
    assert_eq!(sink.achievements_for("30"), vec![Ok(unlocked("C"))]);

    // Failed fetches are not cached.
    assert!(importer.achievements_cache().timestamp(&GameId::from("20")).is_none());
}

#[tokio::test]
async fn test_batch_failure_fails_every_id() {
    let source = FakeSource::default().with_game("10", 1.0, Some(10));
    source.fail_owned_games(SyncError::UpstreamUnavailable("timeout".to_string()));
    let (importer, source, sink) = setup(source).await;

    let report = importer
        .import_achievements(&ids(&["10", "20"]))
        .await
        .unwrap();

    assert_eq!(report.failed, 2);
    assert_eq!(source.total_fetches(), 0);
    let expected = Err(SyncError::UpstreamUnavailable("timeout".to_string()));
    assert_eq!(sink.achievements_for("10"), vec![expected.clone()]);
    assert_eq!(sink.achievements_for("20"), vec![expected]);
}

#[tokio::test]
async fn test_rejected_session_drops_identity() {
    let source = FakeSource::default();
    source.fail_owned_games(SyncError::NotAuthenticated);
    let (importer, _source, sink) = setup(source).await;

    let report = importer.import_game_times(&ids(&["10"])).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(sink.reports().len(), 1);
    assert!(!importer.session().is_authenticated());
    assert_eq!(
        importer.import_game_times(&ids(&["10"])).await,
        Err(SyncError::NotAuthenticated)
    );
}

#[tokio::test]
async fn test_background_import_completes_after_handle_dropped() {
    let source = FakeSource::default()
        .with_game("10", 1.0, Some(10))
        .with_achievements("10", Ok(unlocked("A")));
    let (importer, _source, sink) = setup(source).await;

    let handle = importer.start_achievements_import(&ids(&["10"])).unwrap();
    drop(handle);

    for _ in 0..50 {
        if !sink.reports().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    for _ in 0..50 {
        if importer.achievements_cache().len() == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(sink.achievements_for("10"), vec![Ok(unlocked("A"))]);
    assert_eq!(importer.achievements_cache().len(), 1);
}

#[tokio::test]
async fn test_game_times_import() {
    let source = FakeSource::default()
        .with_game("10", 1.5, Some(111))
        .with_game("20", 4.0, None);
    let (importer, _source, sink) = setup(source).await;

    let report = importer
        .import_game_times(&ids(&["10", "20", "10"]))
        .await
        .unwrap();

    assert_eq!(report.requested, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(
        sink.reports(),
        vec![
            Report::GameTime(
                GameId::from("10"),
                Ok(GameTime {
                    game_id: GameId::from("10"),
                    time_played: 90,
                    last_played: 111,
                })
            ),
            Report::GameTime(
                GameId::from("20"),
                Err(SyncError::UnknownGame(GameId::from("20")))
            ),
        ]
    );
}

#[tokio::test]
async fn test_listing_passthrough() {
    let source = FakeSource::default()
        .with_game("10", 1.0, None)
        .with_achievements("10", Ok(unlocked("A")));
    let (importer, source, _sink) = setup(source).await;

    let owned = importer.owned_games().await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].game_title, "Game 10");

    let friends = importer.friends().await.unwrap();
    assert_eq!(friends[0].user_name, "buddy");

    // Direct lookup ignores the cache and the never-played shortcut.
    let achievements = importer
        .unlocked_achievements(&GameId::from("10"))
        .await
        .unwrap();
    assert_eq!(achievements, unlocked("A"));
    assert_eq!(source.total_fetches(), 1);
    assert!(importer.achievements_cache().is_empty());
}

#[tokio::test]
async fn test_slow_fetch_does_not_hold_back_others() {
    let source = FakeSource::default()
        .with_game("10", 1.0, Some(100))
        .with_game("20", 1.0, Some(100))
        .with_achievements("10", Ok(unlocked("Slow")))
        .with_achievements("20", Ok(unlocked("Fast")));
    let slow = source.hold("10");
    let (importer, source, sink) = setup(source).await;

    let handle = importer
        .start_achievements_import(&ids(&["10", "20"]))
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.achievements_for("20").is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("second game reported while the first is still fetching");
    assert!(sink.achievements_for("10").is_empty());
    assert_eq!(source.fetches_for("10"), 1);

    slow.notify_one();
    let report = handle.await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.fetched, 2);
    assert_eq!(sink.achievements_for("10"), vec![Ok(unlocked("Slow"))]);
    assert_eq!(sink.achievements_for("20"), vec![Ok(unlocked("Fast"))]);
}
