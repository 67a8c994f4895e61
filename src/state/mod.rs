use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{AppPaths, AppSettings, ConfigService, StorageBackend};
use crate::graph::{PipelineServices, RagPipeline};
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::rag::{InMemoryRagStore, LlmEmbedder, LlmJudge, RagStore, SqliteRagStore};
use crate::tools::{HttpWebSearch, WebSearch};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the loaded configuration and the question-answering pipeline with
/// its collaborators (vector store, embedder, chat model, web search).
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<AppSettings>,
    pub llm: Arc<dyn LlmProvider>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Load `config.yml` + `secrets.yaml` from `paths`
    /// 2. Open the vector store selected by `storage.backend`
    /// 3. Create the chat and embedding clients and the web search provider
    /// 4. Build the query graph
    ///
    /// Emits startup warnings (e.g. a missing search key), so the caller
    /// installs logging for `paths` first.
    pub async fn initialize_with_paths(
        paths: Arc<AppPaths>,
    ) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let store: Arc<dyn RagStore> = match settings.storage.backend {
            StorageBackend::Memory => Arc::new(InMemoryRagStore::new()),
            StorageBackend::Sqlite => Arc::new(
                SqliteRagStore::new(paths.as_ref())
                    .await
                    .map_err(|e| InitializationError::Rag(e.into()))?,
            ),
        };

        let timeout = Duration::from_secs(settings.llm.request_timeout_secs);
        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAiCompatibleProvider::new(
                &settings.llm.base_url,
                settings.llm.api_key.clone(),
                settings.llm.model.clone(),
                timeout,
            )
            .map_err(|e| InitializationError::Llm(e.into()))?,
        );
        let embedding_client = Arc::new(
            OpenAiCompatibleProvider::new(
                settings.embedding_base_url(),
                settings.embedding_api_key().map(str::to_string),
                settings.embedding.model.clone(),
                timeout,
            )
            .map_err(|e| InitializationError::Llm(e.into()))?,
        );

        let judge = Arc::new(
            LlmJudge::new(llm.clone(), &settings.llm)
                .map_err(|e| InitializationError::Llm(e.into()))?,
        );
        let search: Arc<dyn WebSearch> = Arc::new(
            HttpWebSearch::from_settings(&settings.search)
                .map_err(|e| InitializationError::Search(e.into()))?,
        );

        let services = PipelineServices {
            store,
            embedder: Arc::new(LlmEmbedder::new(
                embedding_client,
                settings.embedding.batch_size,
            )),
            judge: judge.clone(),
            generator: judge,
            search,
        };
        let pipeline = RagPipeline::new(services, &settings)
            .map_err(|e| InitializationError::Graph(e.into()))?;

        tracing::info!(
            model = %settings.llm.model,
            embedding_model = %settings.embedding.model,
            storage = ?settings.storage.backend,
            search = ?settings.search.provider,
            "Application state initialized"
        );

        Ok(Self::from_parts(paths, settings, llm, pipeline))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        settings: AppSettings,
        llm: Arc<dyn LlmProvider>,
        pipeline: RagPipeline,
    ) -> Arc<Self> {
        Arc::new(AppState {
            config: ConfigService::new(paths.clone()),
            paths,
            settings: Arc::new(settings),
            llm,
            pipeline: Arc::new(pipeline),
        })
    }
}
