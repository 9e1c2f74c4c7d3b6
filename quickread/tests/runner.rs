//! End-to-end task flow through `QuickRead` with a scripted backend and metadata client.

mod init_logging;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quickread::model_spec::TokenLimits;
use quickread::{
    ActionType, DispatchEvent, MediaType, MetadataClient, MetadataError, MockBackend,
    QuickRead, Settings, TaskOptions, TaskOutcome, TaskRequest,
};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

/// Reports 40 input / 20 output tokens for every model: 30 chars for summaries, 20 for
/// translations.
#[derive(Default)]
struct SmallModelMetadata {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl MetadataClient for SmallModelMetadata {
    async fn get_model_metadata(
        &self,
        _api_key: &str,
        model_id: &str,
    ) -> Result<TokenLimits, MetadataError> {
        self.requested.lock().unwrap().push(model_id.to_string());
        Ok(TokenLimits::new(40, 20))
    }
}

fn quickread(backend: Arc<MockBackend>, metadata: Arc<SmallModelMetadata>) -> QuickRead {
    let settings = Settings {
        api_key: "test-key".to_string(),
        language_model: "2.5-flash".to_string(),
        ..Settings::default()
    };
    QuickRead::new(settings, backend, metadata)
}

fn text_request(action: ActionType, model: &str, input: &str) -> TaskRequest {
    TaskRequest::new(action, MediaType::Text, model, "en", input)
}

const ARTICLE: &str = "First sentence is here. Second one follows it. Third closes the paragraph.\n\nA new paragraph starts.";

#[tokio::test]
async fn long_input_is_split_by_resolved_limit() {
    let backend = Arc::new(MockBackend::with_text("point"));
    let metadata = Arc::new(SmallModelMetadata::default());
    let qr = quickread(backend.clone(), metadata.clone());

    let report = qr
        .run_task_to_end(
            text_request(ActionType::Summarize, "2.5-flash", ARTICLE),
            TaskOptions::default(),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.outcome, TaskOutcome::Completed);
    let (_, chunks) = qr
        .plan(&text_request(ActionType::Summarize, "2.5-flash", ARTICLE))
        .await;
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() <= 30));
    assert_eq!(chunks.concat(), ARTICLE);
    assert_eq!(report.chunks_total, chunks.len());
    assert_eq!(backend.call_count(), chunks.len());
    assert_eq!(report.output, "point\n\n".repeat(chunks.len()));
    assert_eq!(
        metadata.requested.lock().unwrap().as_slice(),
        ["gemini-2.5-flash"]
    );
}

#[tokio::test]
async fn user_model_alias_resolves_to_configured_id() {
    let metadata = Arc::new(SmallModelMetadata::default());
    let qr = quickread(Arc::new(MockBackend::with_text("ok")), metadata.clone());
    let (model_id, _) = qr
        .plan(&text_request(ActionType::Translate, "zz", "short"))
        .await;
    assert_eq!(model_id, "gemini-2.0-flash-001");
}

#[tokio::test]
async fn images_are_sent_whole() {
    let backend = Arc::new(MockBackend::with_text("A cat."));
    let qr = quickread(backend.clone(), Arc::new(SmallModelMetadata::default()));
    let image = format!("data:image/jpeg;base64,{}", "A".repeat(200));
    let report = qr
        .run_task_to_end(
            TaskRequest::new(ActionType::Summarize, MediaType::Image, "2.5-flash", "en", image),
            TaskOptions::default(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(report.chunks_total, 1);
    assert_eq!(backend.call_count(), 1);
    let parts = &backend.received()[0][0].parts;
    assert_eq!(parts[1].inline_data.as_ref().unwrap().mime_type, "image/jpeg");
}

#[tokio::test]
async fn history_records_every_task_and_settings_change_clears_cache() {
    let backend = Arc::new(MockBackend::with_text("summary"));
    let qr = quickread(backend.clone(), Arc::new(SmallModelMetadata::default()));
    let run = || {
        qr.run_task_to_end(
            text_request(ActionType::Summarize, "2.0-flash", "Short page."),
            TaskOptions::default(),
            CancellationToken::new(),
        )
    };

    run().await;
    run().await;
    assert_eq!(backend.call_count(), 1);
    let latest = qr.session().latest().unwrap();
    assert_eq!(latest.response_content, "summary\n\n");
    assert_eq!(latest.outcome, "completed");
    assert!(qr.session().history(1).is_some());

    let mut settings = qr.settings().await;
    settings.user_language = "Dutch".to_string();
    assert!(qr.update_settings(settings).await);
    run().await;
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn custom_action_uses_configured_prompt() {
    let backend = Arc::new(MockBackend::with_text("done"));
    let qr = quickread(backend.clone(), Arc::new(SmallModelMetadata::default()));
    let mut settings = qr.settings().await;
    settings.text_custom_prompt = Some("List the names mentioned, in {language}.".to_string());
    qr.update_settings(settings).await;

    let report = qr
        .run_task_to_end(
            text_request(ActionType::TextCustom, "2.0-flash", "Ada met Grace."),
            TaskOptions::default(),
            CancellationToken::new(),
        )
        .await;
    assert_eq!(report.outcome, TaskOutcome::Completed);
    assert_eq!(
        backend.received()[0][0].text(),
        "List the names mentioned, in English.\nText:\nAda met Grace."
    );
}

#[tokio::test]
async fn run_task_streams_events_and_honors_cancel() {
    let backend = Arc::new(MockBackend::with_text("slow").with_delay(Duration::from_secs(30)));
    let qr = quickread(backend, Arc::new(SmallModelMetadata::default()));
    let cancel = CancellationToken::new();
    let mut events = qr.run_task(
        text_request(ActionType::Summarize, "2.0-flash", "Anything."),
        TaskOptions {
            use_cache: true,
            streaming: Some(true),
        },
        cancel.clone(),
    );

    assert_eq!(
        events.next().await,
        Some(DispatchEvent::Started { chunks: 1 })
    );
    cancel.cancel();
    let finished = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .expect("finished event after cancel");
    match finished {
        Some(DispatchEvent::Finished(report)) => {
            assert_eq!(report.outcome, TaskOutcome::Cancelled)
        }
        other => panic!("expected Finished, got {:?}", other),
    }
    assert!(events.next().await.is_none());
    assert_eq!(qr.session().latest().unwrap().outcome, "cancelled");
}
