//! End-to-end run against a mock backend: session creation, a chunked
//! event stream, and the resulting board, report, and artifact state.

use std::io::Write;

use threatflow_client::{run_analysis, ApiClient, Error, RunRequest, RunUpdate};
use threatflow_core::{StageId, StageStatus};
use tokio_util::sync::CancellationToken;

const SESSION_BODY: &str = r#"{"id":"sess-e2e","app_name":"threatflow","user_id":"tester"}"#;

/// The stream a healthy backend produces for one run, with realistic event
/// shapes and extra fields the client must ignore.
const STREAM: &str = concat!(
    "data: {\"author\":\"threat_model_orchestrator\",\"invocationId\":\"e-1\",\"content\":{\"parts\":[{\"text\":\"Starting analysis of the submitted architecture.\\n\\n\"}],\"role\":\"model\"}}\n",
    "data: {\"author\":\"threat_model_orchestrator\",\"finishReason\":\"STOP\"}\n",
    "data: {\"author\":\"architecture_parser_agent\",\"content\":{\"parts\":[{\"text\":\"# Threat Model Report\\n\\n\"}],\"role\":\"model\"}}\n",
    "data: {\"author\":\"architecture_parser_agent\",\"finishReason\":\"STOP\"}\n",
    "data: {\"author\":\"threat_modeler_agent\",\"content\":{\"parts\":[{\"text\":\"## Findings\\n\\n**Spoofing** of the gateway token.\\n\\n\"}]}}\n",
    "data: {\"author\":\"threat_modeler_agent\",\"finishReason\":\"STOP\"}\n",
    "data: {\"author\":\"verification_loop\",\"content\":{\"parts\":[{\"text\":\"Drafting report sections.\\n\\n\"}]}}\n",
    "data: {\"author\":\"report_builder_agent\",\"actions\":{\"toolCalls\":[{\"name\":\"convert_markdown_to_pdf\",\"response\":{\"status\":\"success\",\"file_path\":\"reports/report_20260822_101502.pdf\"}}],\"artifactDelta\":{\"report_20260822_101502.pdf\":{\"filePath\":\"reports/report_20260822_101502.pdf\"}}}}\n",
    "data: {\"author\":\"report_verifier_agent\",\"content\":{\"parts\":[{\"text\":\"Verified `risk` ratings.\\n\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}\n",
);

async fn mock_backend(server: &mut mockito::Server) {
    server
        .mock("POST", "/api/sessions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SESSION_BODY)
        .create_async()
        .await;
    // Deliver the stream in awkward chunk sizes so reassembly is exercised
    // through the full pipeline, not just in decoder unit tests.
    server
        .mock("POST", "/api/query")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_chunked_body(|w| {
            let bytes = STREAM.as_bytes();
            for chunk in bytes.chunks(97) {
                w.write_all(chunk)?;
            }
            Ok(())
        })
        .create_async()
        .await;
}

#[tokio::test]
async fn full_run_drives_board_report_and_artifact() {
    let mut server = mockito::Server::new_async().await;
    mock_backend(&mut server).await;

    let client = ApiClient::new(server.url()).expect("client");
    let request = RunRequest::new("tester", "analyze the attached architecture");
    let mut updates = Vec::new();
    let outcome = run_analysis(&client, &request, CancellationToken::new(), |u| updates.push(u))
        .await
        .expect("run should complete");

    assert_eq!(outcome.session_id, "sess-e2e");
    assert!(outcome.board.all_completed(), "stages: {:?}", outcome.stages());
    assert_eq!(
        outcome.artifact_path.as_deref(),
        Some("reports/report_20260822_101502.pdf")
    );

    // Fragments concatenated in arrival order, nothing dropped or reordered.
    assert!(outcome
        .report_markdown
        .starts_with("Starting analysis of the submitted architecture.\n\n# Threat Model Report"));
    assert!(outcome.report_markdown.ends_with("Verified `risk` ratings.\n"));

    let html = outcome.report.to_html();
    assert!(html.contains("<h1>Threat Model Report</h1>"), "html: {html}");
    assert!(html.contains("<h2>Findings</h2>"));
    assert!(html.contains("<strong>Spoofing</strong>"));
    assert!(html.contains("<code>risk</code>"));
}

#[tokio::test]
async fn updates_arrive_in_order_and_never_move_backward() {
    let mut server = mockito::Server::new_async().await;
    mock_backend(&mut server).await;

    let client = ApiClient::new(server.url()).expect("client");
    let request = RunRequest::new("tester", "analyze");
    let mut updates = Vec::new();
    run_analysis(&client, &request, CancellationToken::new(), |u| updates.push(u))
        .await
        .expect("run should complete");

    match updates.first() {
        Some(RunUpdate::SessionReady { session_id }) => assert_eq!(session_id, "sess-e2e"),
        other => panic!("first update should be SessionReady, got {other:?}"),
    }

    let mut ranks = [0u8; 5];
    for update in &updates[1..] {
        let change = match update {
            RunUpdate::Stage(change) => change,
            other => panic!("unexpected update after SessionReady: {other:?}"),
        };
        let slot = &mut ranks[change.stage.index()];
        assert!(
            change.status.rank() > *slot,
            "{} reported a non-forward change",
            change.stage
        );
        *slot = change.status.rank();
    }
    // Every stage ends the run completed.
    assert_eq!(ranks, [2, 2, 2, 2, 2]);
}

#[tokio::test]
async fn lookahead_disabled_leaves_successors_untouched() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/sessions")
        .with_status(200)
        .with_body(SESSION_BODY)
        .create_async()
        .await;
    server
        .mock("POST", "/api/query")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"author\":\"architecture_parser_agent\",\"finishReason\":\"STOP\"}\n")
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).expect("client");
    let mut request = RunRequest::new("tester", "analyze");
    request.lookahead = false;
    let outcome = run_analysis(&client, &request, CancellationToken::new(), |_| {})
        .await
        .expect("run should complete");

    assert_eq!(outcome.board.status(StageId::Parser), StageStatus::Completed);
    assert_eq!(outcome.board.status(StageId::Modeler), StageStatus::NotStarted);
}

#[tokio::test]
async fn query_rejection_surfaces_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/sessions")
        .with_status(200)
        .with_body(SESSION_BODY)
        .create_async()
        .await;
    server
        .mock("POST", "/api/query")
        .with_status(500)
        .with_body(r#"{"detail":"orchestrator crashed"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).expect("client");
    let request = RunRequest::new("tester", "analyze");
    let err = run_analysis(&client, &request, CancellationToken::new(), |_| {})
        .await
        .expect_err("run should fail");
    match err {
        Error::Query { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("orchestrator crashed"));
        }
        other => panic!("expected Query, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_from_observer_aborts_with_cancelled() {
    let mut server = mockito::Server::new_async().await;
    mock_backend(&mut server).await;

    let client = ApiClient::new(server.url()).expect("client");
    let request = RunRequest::new("tester", "analyze");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    // Cancel as soon as the first stage change lands; the next chunk read
    // must observe the token before any more data.
    let err = run_analysis(&client, &request, cancel, move |update| {
        if matches!(update, RunUpdate::Stage(_)) {
            trigger.cancel();
        }
    })
    .await
    .expect_err("run should be cancelled");
    assert!(err.is_cancelled(), "got {err:?}");
}

#[tokio::test]
async fn precancelled_token_never_opens_the_stream() {
    let mut server = mockito::Server::new_async().await;
    // Only the session endpoint is mocked; hitting /api/query would fail
    // the mock expectations with a connection-level 501.
    server
        .mock("POST", "/api/sessions")
        .with_status(200)
        .with_body(SESSION_BODY)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).expect("client");
    let request = RunRequest::new("tester", "analyze");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = run_analysis(&client, &request, cancel, |_| {})
        .await
        .expect_err("run should be cancelled");
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn missing_attachment_fails_before_any_request() {
    let server = mockito::Server::new_async().await;
    // No mocks at all: validation must reject the run first.
    let client = ApiClient::new(server.url()).expect("client");
    let mut request = RunRequest::new("tester", "analyze");
    request.attachments.push("/nonexistent/diagram.txt".into());

    let err = run_analysis(&client, &request, CancellationToken::new(), |_| {})
        .await
        .expect_err("run should fail");
    assert!(matches!(err, Error::AttachmentNotImage { .. }), "got {err:?}");
}
