mod common;

use axum::http::StatusCode;
use common::{ScriptedHints, SURVEY};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tone_experiment_api::services::lexicon::Lexicon;

async fn request_hint(app: &common::TestApp, session_id: &str) -> (StatusCode, serde_json::Value) {
    app.send("POST", &format!("/api/v1/sessions/{session_id}/hints"), None)
        .await
}

#[tokio::test]
async fn test_hint_before_any_guess_is_refused() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;

    let (status, body) = request_hint(&app, &session_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("at least one guess"));
    assert!(app.hints.prompts().is_empty());

    let (_, snapshot) = app
        .send("GET", &format!("/api/v1/sessions/{session_id}"), None)
        .await;
    assert_eq!(snapshot["attempt"]["hints"], serde_json::json!([]));
}

#[tokio::test]
async fn test_first_hint_acknowledges_last_wrong_guess_once() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    app.guess(&session_id, "APPLE").await;

    let (status, body) = request_hint(&app, &session_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], 1);
    assert_eq!(body["hint"]["text"], "hint #1");
    assert_eq!(body["hints_used"], 1);

    let (status, body) = request_hint(&app, &session_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hint"]["text"], "hint #2");
    assert_eq!(body["hints_used"], 2);

    let prompts = app.hints.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].text.starts_with("Great effort on 'APPLE'"));
    assert!(!prompts[1].text.contains("Great effort"));
    for prompt in &prompts {
        assert!(prompt.text.contains("5-letter"));
        assert!(prompt.text.contains("Previous guesses: APPLE."));
        assert_eq!(prompt.max_tokens, None);
    }
}

#[tokio::test]
async fn test_hint_level_rises_with_wrong_guesses() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    for word in ["APPLE", "GRAPE"] {
        app.guess(&session_id, word).await;
    }

    let (status, body) = request_hint(&app, &session_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], 2);
    assert!(app.hints.prompts()[0].text.ends_with("Now give a level-2 hint."));
}

#[tokio::test]
async fn test_hint_timestamps_are_recorded_in_results() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    app.guess(&session_id, "APPLE").await;
    request_hint(&app, &session_id).await;
    request_hint(&app, &session_id).await;
    app.guess(&session_id, "CRANE").await;
    app.survey(&session_id, &SURVEY).await;
    app.guess(&session_id, "LEMON").await;
    let (status, _) = app.survey(&session_id, &SURVEY).await;
    assert_eq!(status, StatusCode::OK);

    let contents = std::fs::read_to_string(app.block_file("wordle_data.csv")).unwrap();
    let cells: Vec<&str> = contents.lines().nth(1).unwrap().split(',').collect();
    assert_eq!(cells[9], "2");
    assert_eq!(cells[10].split(';').count(), 2);
}

#[tokio::test]
async fn test_generator_failure_returns_placeholder() {
    let app = common::create_test_app_with(ScriptedHints::failing(), None);
    let session_id = app.create_session().await;
    app.guess(&session_id, "APPLE").await;

    let (status, body) = request_hint(&app, &session_id).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["hint"]["text"]
        .as_str()
        .unwrap()
        .starts_with("[Hint error:"));
}

#[tokio::test]
async fn test_hint_after_puzzle_solved_is_refused() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    app.guess(&session_id, "CRANE").await;

    let (status, _) = request_hint(&app, &session_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(app.hints.prompts().is_empty());
}

#[tokio::test]
async fn test_lexicon_rejects_unknown_words_but_accepts_answers() {
    let lexicon = Lexicon::from_words(["APPLE", "GRAPE"]);
    let app = common::create_test_app_with(ScriptedHints::default(), Some(lexicon));
    let session_id = app.create_session().await;

    let (status, body) = app.guess(&session_id, "QQQQQ").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("word list"));

    let (status, _) = app.guess(&session_id, "apple").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.guess(&session_id, "crane").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "solved");

    let (_, snapshot) = app
        .send("GET", &format!("/api/v1/sessions/{session_id}"), None)
        .await;
    assert_eq!(snapshot["attempt"]["guesses"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_block_b_wrong_guess_gets_automatic_hint() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    app.finish_block_a(&session_id).await;

    let (_, snapshot) = app
        .send("GET", &format!("/api/v1/sessions/{session_id}"), None)
        .await;
    assert_eq!(snapshot["attempt"]["clue"], "A striped animal.");
    assert_eq!(snapshot["attempt"]["difficulty"], "Easy");
    assert!(snapshot["attempt"]["attempt_limit"].is_null());
    assert!(snapshot["attempt"]["word_length"].is_null());
    assert_eq!(snapshot["attempt"]["can_give_up"], true);

    let (status, body) = app.guess(&session_id, "horse").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "pending");
    assert_eq!(body["hint"]["text"], "hint #1");
    assert_eq!(body["hint"]["level"], 1);

    let prompts = app.hints.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].text.contains("'horse'"));
}

#[tokio::test]
async fn test_block_b_give_up_reveals_answer_with_farewell() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    app.finish_block_a(&session_id).await;
    app.guess(&session_id, "horse").await;

    let (status, body) = app
        .send("POST", &format!("/api/v1/sessions/{session_id}/give-up"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farewell"], "hint #2");
    assert_eq!(body["session"]["attempt"]["outcome"], "gave_up");
    assert_eq!(body["session"]["attempt"]["answer"], "Zebra");
    assert_eq!(body["session"]["stage"], "awaiting_survey");

    let prompts = app.hints.prompts();
    assert_eq!(prompts[1].max_tokens, Some(100));
    assert_eq!(prompts[1].temperature, Some(0.5));

    let (status, _) = app
        .send("POST", &format!("/api/v1/sessions/{session_id}/give-up"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.hints.prompts().len(), 2);

    let (status, _) = app.survey(&session_id, &SURVEY).await;
    assert_eq!(status, StatusCode::OK);
    let contents = std::fs::read_to_string(app.block_file("word_puzzle_data.csv")).unwrap();
    let row = contents.lines().nth(1).unwrap();
    assert!(row.contains(",Zebra,False,1,"));
    assert!(row.contains(",horse,1,"));
}

#[tokio::test]
async fn test_give_up_not_allowed_in_block_a() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    app.guess(&session_id, "APPLE").await;

    let (status, body) = app
        .send("POST", &format!("/api/v1/sessions/{session_id}/give-up"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("block A"));
}

#[tokio::test]
async fn test_hint_is_spoken_and_can_be_stopped() {
    let app = common::create_test_app();
    let session_id = app.create_session().await;
    let audio_uri = format!("/api/v1/sessions/{session_id}/audio");

    let (status, _) = app.send("GET", &audio_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    app.guess(&session_id, "APPLE").await;
    request_hint(&app, &session_id).await;

    let mut clip = None;
    for _ in 0..50 {
        let (status, body) = app.send("GET", &audio_uri, None).await;
        if status == StatusCode::OK {
            clip = Some(body);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let clip = clip.expect("no audio clip was produced");
    assert_eq!(clip, "<speak>hint #1</speak>");
    assert_eq!(app.speech.calls.load(Ordering::SeqCst), 1);

    let (status, _) = app
        .send("POST", &format!("{audio_uri}/stop"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("GET", &audio_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
