use commander_deck_validator::app::session::CACHE_KEY;
use commander_deck_validator::config::toml_config::WebhookConfig;
use commander_deck_validator::{
    DeckSubmission, DeckValidator, DiscordWebhook, LocalStorage, LookupSettings, RunOutcome,
    ScryfallClient, SendOutcome, ValidationSession, ValidatorError,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn card(name: &str, colors: &[&str], type_line: &str) -> serde_json::Value {
    json!({
        "object": "card",
        "name": name,
        "color_identity": colors,
        "type_line": type_line,
        "legalities": {"commander": "legal", "standard": "not_legal"}
    })
}

fn session(
    server: &MockServer,
    cache_dir: &TempDir,
) -> ValidationSession<ScryfallClient, LocalStorage, DiscordWebhook> {
    let catalog = ScryfallClient::new(
        server.url("/cards/collection"),
        server.url("/cards/named"),
        "deck-validator-tests/1.0",
        None,
    )
    .unwrap();

    ValidationSession::new(
        DeckValidator::new(catalog, LookupSettings::default()),
        LocalStorage::new(cache_dir.path().to_str().unwrap().to_string()),
        Some(DiscordWebhook::new(server.url("/webhook"))),
        WebhookConfig::default(),
    )
}

fn mock_player_one(server: &MockServer, not_found: serde_json::Value) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/cards/collection")
            .body_contains("Krenko");
        then.status(200).json_body(json!({
            "object": "list",
            "not_found": not_found,
            "data": [
                card("Krenko, Mob Boss", &["R"], "Legendary Creature — Goblin Warrior"),
                card("Mountain", &[], "Basic Land — Mountain"),
            ]
        }));
    })
}

fn mock_player_two(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/cards/collection")
            .body_contains("Talrand");
        then.status(200).json_body(json!({
            "object": "list",
            "not_found": [],
            "data": [
                card("Talrand, Sky Summoner", &["U"], "Legendary Creature — Merfolk Wizard"),
                card("Island", &[], "Basic Land — Island"),
            ]
        }));
    })
}

#[tokio::test]
async fn test_validate_and_send_end_to_end() {
    let server = MockServer::start();
    let cache_dir = TempDir::new().unwrap();

    let p1_mock = mock_player_one(&server, json!([]));
    let p2_mock = mock_player_two(&server);
    let webhook_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/webhook")
            .body_contains("Krenko, Mob Boss vs Talrand, Sky Summoner")
            .body_contains("3066993");
        then.status(204);
    });

    let session = session(&server, &cache_dir);
    let outcome = session
        .validate(
            &DeckSubmission::new("Krenko, Mob Boss", "99 Mountain"),
            &DeckSubmission::new("Talrand, Sky Summoner", "50x Island\r\n49 island"),
        )
        .await;

    let pair = match outcome {
        RunOutcome::Passed(pair) => pair,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(pair.player1.total_cards(), 100);
    assert_eq!(pair.player2.decklist.len(), 1);
    assert_eq!(pair.player2.decklist[0].quantity, 99);
    assert!(cache_dir.path().join(CACHE_KEY).exists());

    p1_mock.assert();
    p2_mock.assert();

    assert_eq!(session.send_report().await.unwrap(), SendOutcome::Sent);
    webhook_mock.assert();
}

#[tokio::test]
async fn test_fuzzy_fallback_resolves_typos() {
    let server = MockServer::start();
    let cache_dir = TempDir::new().unwrap();

    let p1_mock = mock_player_one(&server, json!([{"name": "Lightnin Bolt"}]));
    mock_player_two(&server);
    let fuzzy_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/cards/named")
            .query_param("fuzzy", "Lightnin Bolt");
        then.status(200)
            .json_body(card("Lightning Bolt", &["R"], "Instant"));
    });

    let session = session(&server, &cache_dir);
    let outcome = session
        .validate(
            &DeckSubmission::new("Krenko, Mob Boss", "98 Mountain\n1x Lightnin Bolt"),
            &DeckSubmission::new("Talrand, Sky Summoner", "99 Island"),
        )
        .await;

    let pair = match outcome {
        RunOutcome::Passed(pair) => pair,
        other => panic!("unexpected outcome: {other:?}"),
    };
    let bolt = &pair.player1.decklist[1];
    assert_eq!(bolt.name, "Lightning Bolt");
    assert!(bolt.is_legal);

    p1_mock.assert();
    fuzzy_mock.assert();
}

#[tokio::test]
async fn test_unknown_card_rejects_run_and_blocks_send() {
    let server = MockServer::start();
    let cache_dir = TempDir::new().unwrap();

    mock_player_one(&server, json!([{"name": "Totally Fake Card"}]));
    mock_player_two(&server);
    server.mock(|when, then| {
        when.method(GET).path("/cards/named");
        then.status(404).json_body(json!({"object": "error", "code": "not_found"}));
    });
    let webhook_mock = server.mock(|when, then| {
        when.method(POST).path("/webhook");
        then.status(204);
    });

    let session = session(&server, &cache_dir);
    let outcome = session
        .validate(
            &DeckSubmission::new("Krenko, Mob Boss", "98 Mountain\nTotally Fake Card"),
            &DeckSubmission::new("Talrand, Sky Summoner", "99 Island"),
        )
        .await;

    let pair = match outcome {
        RunOutcome::Rejected(pair) => pair,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(
        pair.player1.errors,
        vec!["Card 'Totally Fake Card' not found by Scryfall.".to_string()]
    );
    assert!(!cache_dir.path().join(CACHE_KEY).exists());

    assert!(matches!(
        session.send_report().await,
        Err(ValidatorError::NotValidated { .. })
    ));
    webhook_mock.assert_hits(0);
}

#[tokio::test]
async fn test_webhook_failure_is_reported() {
    let server = MockServer::start();
    let cache_dir = TempDir::new().unwrap();

    mock_player_one(&server, json!([]));
    mock_player_two(&server);
    server.mock(|when, then| {
        when.method(POST).path("/webhook");
        then.status(400).body("invalid embed");
    });

    let session = session(&server, &cache_dir);
    session
        .validate(
            &DeckSubmission::new("Krenko, Mob Boss", "99 Mountain"),
            &DeckSubmission::new("Talrand, Sky Summoner", "99 Island"),
        )
        .await;

    match session.send_report().await {
        Err(ValidatorError::WebhookStatusError { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "invalid embed");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(session.can_send().await);
}
