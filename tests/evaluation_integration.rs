use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mockprep::evaluator::{Evaluator, UNAVAILABLE_FEEDBACK, UNPARSEABLE_FEEDBACK};
use mockprep::providers::GeminiClient;

mod common;
use common::{gemini_reply, generation_config};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

async fn evaluator_for(server: &MockServer) -> Evaluator {
    let client = GeminiClient::new(generation_config(&server.uri())).unwrap();
    Evaluator::new(Arc::new(client))
}

#[tokio::test]
async fn test_fenced_model_reply_is_parsed() {
    let server = MockServer::start().await;
    let reply = "```json\n{\"score\": 8, \"feedback\": \"Clear\", \"correct_solution\": \"Use two pointers\"}\n```";

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let evaluation = evaluator_for(&server)
        .await
        .evaluate("Reverse a list", "Swap ends")
        .await;

    assert_eq!(evaluation.score, 8.0);
    assert_eq!(evaluation.feedback, "Clear");
    assert_eq!(evaluation.correct_solution, "Use two pointers");
}

#[tokio::test]
async fn test_prose_reply_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_reply("I think it's a 7 out of 10.")),
        )
        .mount(&server)
        .await;

    let evaluation = evaluator_for(&server).await.evaluate("Q", "A").await;
    assert_eq!(evaluation.score, 0.0);
    assert_eq!(evaluation.feedback, UNPARSEABLE_FEEDBACK);
    assert_eq!(evaluation.correct_solution, "N/A");
}

#[tokio::test]
async fn test_exhausted_retries_report_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let evaluation = evaluator_for(&server).await.evaluate("Q", "A").await;
    assert_eq!(evaluation.feedback, UNAVAILABLE_FEEDBACK);
    assert!(evaluation.is_fallback());
}

mod session_append {
    use super::common::{gemini_reply, generation_config, postgrest_config};
    use super::GENERATE_PATH;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use mockprep::commands::{run_evaluate, EvaluateArgs};
    use mockprep::config::Config;

    const TABLE_PATH: &str = "/rest/v1/interview_sessions";

    fn config_for(server: &MockServer) -> Config {
        Config {
            generation: generation_config(&server.uri()),
            store: postgrest_config(&server.uri()),
        }
    }

    fn args() -> EvaluateArgs {
        EvaluateArgs {
            question: "Q".to_string(),
            answer: "A".to_string(),
            session: Some("s1".to_string()),
            topic: None,
            user: None,
            json: true,
        }
    }

    async fn mount_model(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
                r#"{"score": 7, "feedback": "Fine", "correct_solution": "S"}"#,
            )))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_failed_session_read_does_not_overwrite_history() {
        let server = MockServer::start().await;
        mount_model(&server).await;

        Mock::given(method("GET"))
            .and(path(TABLE_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(TABLE_PATH))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = run_evaluate(&config_for(&server), args()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_exchange_is_appended_and_difficulty_kept() {
        let server = MockServer::start().await;
        mount_model(&server).await;

        Mock::given(method("GET"))
            .and(path(TABLE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "questions": [
                    { "question": "Earlier" },
                    { "meta": "difficulty", "value": "Hard" }
                ]
            }])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(TABLE_PATH))
            .and(body_json(json!([{
                "id": "s1",
                "questions": [
                    { "question": "Earlier" },
                    {
                        "question": "Q",
                        "answer": "A",
                        "score": 7.0,
                        "feedback": "Fine",
                        "correct_solution": "S"
                    },
                    { "meta": "difficulty", "value": "Hard" }
                ]
            }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        run_evaluate(&config_for(&server), args()).await.unwrap();
    }
}
