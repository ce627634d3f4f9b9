//! End-to-end tests against a scripted stand-in worker.
//!
//! The stand-in answers every message by echoing the NDJSON line back
//! with its `"type"` tag stripped, which turns each request into a
//! well-formed response carrying the same id and command. That is all a
//! real worker needs to do for correlation to function; the analysis
//! payload is opaque to this layer.

use std::time::Duration;

use loupe::{Command, IpcClient, IpcError, RequestContext, Response, Settings, WorkerSettings};

fn echo_settings() -> Settings {
    Settings {
        worker: WorkerSettings {
            path: "sh".into(),
            args: vec![
                "-c".to_string(),
                r#"sed -u 's/"type":"[a-z]*",//'"#.to_string(),
            ],
        },
        ..Settings::default()
    }
}

/// Poll until a response for `command` surfaces or the retries run out.
async fn await_response(client: &mut IpcClient, command: &str) -> Option<Response> {
    for _ in 0..100 {
        if let Some(response) = client.get_response(command).await.unwrap() {
            return Some(response);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

#[tokio::test]
async fn request_round_trips_through_the_worker() {
    let mut client = IpcClient::spawn(echo_settings()).await.unwrap();
    client.update_file("demo.py", "import os\nos.pa").await.unwrap();
    client
        .request(
            "autocomplete",
            "demo.py",
            RequestContext {
                current_word: "pa".to_string(),
                language: "Python".to_string(),
                ..RequestContext::default()
            },
        )
        .await
        .unwrap();

    let response = await_response(&mut client, "autocomplete")
        .await
        .expect("worker answer should surface");
    assert_eq!(response.command, Some(Command::Autocomplete));

    // A response is consumed on retrieval.
    assert!(client.get_response("autocomplete").await.unwrap().is_none());
    client.terminate().await;
}

#[tokio::test]
async fn commands_are_answered_independently() {
    let mut client = IpcClient::spawn(echo_settings()).await.unwrap();
    client.update_file("demo.py", "x = 1").await.unwrap();

    client
        .request("highlight", "demo.py", RequestContext::default())
        .await
        .unwrap();
    client
        .request("replacements", "demo.py", RequestContext::default())
        .await
        .unwrap();

    let highlight = await_response(&mut client, "highlight").await.unwrap();
    assert_eq!(highlight.command, Some(Command::Highlight));
    let replacements = await_response(&mut client, "replacements").await.unwrap();
    assert_eq!(replacements.command, Some(Command::Replacements));
    client.terminate().await;
}

#[tokio::test]
async fn ping_needs_no_tracked_files() {
    let mut client = IpcClient::spawn(echo_settings()).await.unwrap();
    client.ping().await.unwrap();
    client.terminate().await;
}

#[tokio::test]
async fn invalid_command_is_fatal_misuse() {
    let mut client = IpcClient::spawn(echo_settings()).await.unwrap();

    let err = client.cancel_request("not_a_command").await.unwrap_err();
    assert!(matches!(err, IpcError::InvalidCommand(_)));

    // The instance is torn down, not just the one call.
    assert!(matches!(
        client.update_file("demo.py", "x = 1").await,
        Err(IpcError::Terminated)
    ));
    assert!(matches!(
        client.get_response("autocomplete").await,
        Err(IpcError::Terminated)
    ));
}

#[tokio::test]
async fn terminate_makes_the_client_unusable() {
    let mut client = IpcClient::spawn(echo_settings()).await.unwrap();
    client.terminate().await;
    assert!(matches!(client.ping().await, Err(IpcError::Terminated)));
}

#[tokio::test]
async fn removed_files_cannot_be_requested() {
    let mut client = IpcClient::spawn(echo_settings()).await.unwrap();
    client.update_file("demo.py", "x = 1").await.unwrap();
    client.remove_file("demo.py").await.unwrap();

    let err = client
        .request("autocomplete", "demo.py", RequestContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IpcError::UnknownFile(_)));
}
