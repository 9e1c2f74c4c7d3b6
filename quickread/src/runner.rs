//! `QuickRead`: one entry point for a whole task.
//!
//! resolve model id → resolve limit → segment (images stay whole) → dispatch → record in the
//! session history. Each task runs on its own spawned task inside a `task` span.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::dispatch::{
    DispatchEvent, DispatchJob, Dispatcher, TaskOutcome, TaskReport, EVENT_CHANNEL_CAPACITY,
};
use crate::llm::{GeminiClient, GenerationBackend};
use crate::model_spec::{GeminiMetadataClient, LimitResolver, MetadataClient};
use crate::prompts::{self, PromptContext, PromptError, PromptTemplates};
use crate::segment::segment;
use crate::session::Session;
use crate::settings::{Settings, SettingsError};
use crate::task::{resolve_model_id, TaskOptions, TaskRequest};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Prompts(#[from] PromptError),
}

/// Settings, limit resolver, dispatcher and session for one caller.
#[derive(Clone)]
pub struct QuickRead {
    settings: Arc<RwLock<Settings>>,
    resolver: Arc<LimitResolver>,
    dispatcher: Dispatcher,
    session: Arc<Session>,
    templates: Arc<PromptTemplates>,
}

impl QuickRead {
    /// New session with embedded prompt templates.
    pub fn new(
        settings: Settings,
        backend: Arc<dyn GenerationBackend>,
        metadata: Arc<dyn MetadataClient>,
    ) -> Self {
        let session = Arc::new(Session::new());
        session.seed_settings(&settings);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            resolver: Arc::new(LimitResolver::new(metadata)),
            dispatcher: Dispatcher::new(backend, session.cache().clone()),
            session,
            templates: Arc::new(prompts::default_from_embedded()),
        }
    }

    /// Settings from XDG config and env, Gemini clients (base URL from
    /// `QUICKREAD_API_BASE`), templates from `prompts_dir` or `QUICKREAD_PROMPTS_DIR`.
    pub fn from_env(prompts_dir: Option<&Path>) -> Result<Self, InitError> {
        let settings = Settings::from_env()?;
        let templates = prompts::load(prompts_dir)?;
        Ok(Self::new(
            settings,
            Arc::new(GeminiClient::from_env()),
            Arc::new(GeminiMetadataClient::from_env()),
        )
        .with_templates(templates))
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    /// Shares `session` (and its cache) with other instances. A session without recorded
    /// settings takes this instance's.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        if let Ok(settings) = self.settings.try_read() {
            session.seed_settings(&settings);
        }
        self.dispatcher = Dispatcher::new(self.dispatcher.backend(), session.cache().clone());
        self.session = session;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn resolver(&self) -> &Arc<LimitResolver> {
        &self.resolver
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Replaces the settings; the response cache is cleared when they differ in anything
    /// that changes generated text.
    pub async fn update_settings(&self, settings: Settings) -> bool {
        let cleared = self.session.apply_settings(&settings).await;
        *self.settings.write().await = settings;
        cleared
    }

    /// Model id and chunks for `request` under the current settings.
    pub async fn plan(&self, request: &TaskRequest) -> (String, Vec<String>) {
        let settings = self.settings().await;
        self.plan_with(request, &settings).await
    }

    async fn plan_with(&self, request: &TaskRequest, settings: &Settings) -> (String, Vec<String>) {
        let model_id = resolve_model_id(&request.language_model, &settings.user_model_id);
        if !request.media_type.is_segmentable() {
            return (model_id, vec![request.input.clone()]);
        }
        let max_chars = self
            .resolver
            .resolve(&model_id, request.action_type, &settings.api_key)
            .await;
        let chunks = segment(&request.input, max_chars);
        info!(max_chars, chunks = chunks.len(), "input segmented");
        (model_id, chunks)
    }

    /// Runs `request` on a spawned task. The stream ends with `Finished`.
    pub fn run_task(
        &self,
        request: TaskRequest,
        options: TaskOptions,
        cancel: CancellationToken,
    ) -> ReceiverStream<DispatchEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let span = info_span!(
            "task",
            task_id = %Uuid::new_v4(),
            action = %request.action_type,
            media = %request.media_type,
            model = %request.language_model,
        );
        let this = self.clone();
        tokio::spawn(
            async move {
                let report = this.execute(request, options, &cancel, &tx).await;
                this.session.record(&report);
                info!(
                    outcome = report.outcome.kind(),
                    chunks = report.chunks_total,
                    processed = report.chunks_processed,
                    backend_calls = report.backend_calls,
                    cache_hits = report.cache_hits,
                    "task finished"
                );
                let _ = tx.send(DispatchEvent::Finished(report)).await;
            }
            .instrument(span),
        );
        ReceiverStream::new(rx)
    }

    /// Runs `request` and waits for its report, ignoring progress events.
    pub async fn run_task_to_end(
        &self,
        request: TaskRequest,
        options: TaskOptions,
        cancel: CancellationToken,
    ) -> TaskReport {
        let mut events = self.run_task(request, options, cancel);
        while let Some(event) = events.next().await {
            if let DispatchEvent::Finished(report) = event {
                return report;
            }
        }
        TaskReport::stopped(
            TaskOutcome::Error {
                status: 0,
                message: "task ended without a report".to_string(),
            },
            0,
        )
    }

    async fn execute(
        &self,
        request: TaskRequest,
        options: TaskOptions,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<DispatchEvent>,
    ) -> TaskReport {
        let settings = self.settings().await;
        info!("task started");
        let (model_id, chunks) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TaskReport::stopped(TaskOutcome::Cancelled, 0),
            planned = self.plan_with(&request, &settings) => planned,
        };
        let prompt = PromptContext {
            templates: self.templates.clone(),
            action: request.action_type,
            media: request.media_type,
            language_code: request.language_code.clone(),
            user_language: settings.user_language.clone(),
            custom_prompt: settings
                .custom_prompt_for(request.action_type)
                .map(str::to_string),
        };
        let job = DispatchJob {
            request: Arc::new(request),
            model_id,
            api_key: settings.api_key.clone(),
            chunks,
            use_cache: options.use_cache,
            streaming: options.streaming.unwrap_or(settings.streaming),
            prompt,
        };
        self.dispatcher.run(&job, cancel, Some(tx)).await
    }
}
