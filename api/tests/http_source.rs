use stats_api::gamelog::build_game_log;
use stats_api::{ApiError, DataSource, DataStore, HttpSource};

const TEAMS: &str = r##"[
    {"id": "T5", "name": "Wolves", "color": "#1d428a"},
    {"id": "T9", "name": "Wolves"}
]"##;

#[tokio::test]
async fn fetches_relative_to_base_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/data/teams.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TEAMS)
        .create_async()
        .await;

    let source = HttpSource::new(format!("{}/data/", server.url()));
    let body = source.fetch("teams.json").await.unwrap();
    assert!(body.contains("Wolves"));
    mock.assert_async().await;
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server.mock("GET", "/players.json").with_status(404).create_async().await;
    let _down = server.mock("GET", "/games.json").with_status(503).create_async().await;

    let source = HttpSource::new(server.url());
    assert!(matches!(source.fetch("players.json").await, Err(ApiError::NotFound(_))));
    match source.fetch("games.json").await {
        Err(ApiError::Status(status, url)) => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.ends_with("/games.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn store_fetches_each_collection_once() {
    let mut server = mockito::Server::new_async().await;
    let teams = server
        .mock("GET", "/teams.json")
        .with_status(200)
        .with_body(TEAMS)
        .expect(1)
        .create_async()
        .await;
    let leaders = server
        .mock("GET", "/derived/team_leaders.json")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let store = DataStore::new(HttpSource::new(server.url()));
    for _ in 0..3 {
        let all = store.teams().await;
        assert_eq!(all.len(), 2);
        let wolves = stats_api::resolve::resolve_team("Wolves", &all).unwrap();
        assert_eq!(wolves.id, "T5");

        assert!(store.team_leaders().await.is_empty());
    }

    teams.assert_async().await;
    leaders.assert_async().await;
}

#[tokio::test]
async fn unreachable_boxscore_is_left_out_of_the_log() {
    let mut server = mockito::Server::new_async().await;
    let _games = server
        .mock("GET", "/games.json")
        .with_status(200)
        .with_body(
            r#"[
                {"id":"g1","date":"2024-01-05","season":"2023-24","type":"regular",
                 "home_team":"T1","away_team":"T2","home_score":88,"away_score":79},
                {"id":"g2","date":"2024-01-09","season":"2023-24","type":"regular",
                 "home_team":"T2","away_team":"T1"}
            ]"#,
        )
        .create_async()
        .await;
    let _g1 = server
        .mock("GET", "/boxscores/g1.json")
        .with_status(200)
        .with_body(
            r#"{"home_team":"T1","away_team":"T2","teams":{
                "T1":{"players":[{"player_id":"p1","stats":{"pts":20,"oreb":2,"dreb":5,"ast":3}}]},
                "T2":{"players":[{"player_id":"p7","stats":{"pts":15}}]}}}"#,
        )
        .create_async()
        .await;
    let _g2 = server.mock("GET", "/boxscores/g2.json").with_status(500).create_async().await;

    let store = DataStore::new(HttpSource::new(server.url()));
    let games = store.games().await;
    let log = build_game_log(&store, "p1", &games).await;

    assert_eq!(log.skipped, 1);
    assert_eq!(log.entries.len(), 1);
    assert_eq!(log.entries[0].game_id, "g1");
    assert_eq!(log.entries[0].opp, "T2");
    assert_eq!(log.entries[0].stats.reb, Some(7.0));
}
