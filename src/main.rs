use std::sync::Arc;

use quiz_video::config::AppConfig;
use quiz_video::elevenlabs_client::{ElevenLabsClient, NarrationVoice};
use quiz_video::functions_client::{FunctionsClient, RemoteRenderer};
use quiz_video::gemini_client::GeminiClient;
use quiz_video::handlers::app_router;
use quiz_video::pipeline::services::{
    CaptionGenerator, ObjectStorage, ScriptWriter, Unconfigured, VideoRenderer, VoiceSynthesizer,
};
use quiz_video::pipeline::{InProcessRenderer, PgVideoStore, PipelineServices, RenderSpecBuilder};
use quiz_video::sessions::SessionManager;
use quiz_video::storage_client::StorageClient;
use quiz_video::{db, AppState, ConfiguredServices};

const SESSION_MAX_AGE_HOURS: i64 = 24;
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = AppConfig::from_env()?;

    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("✅ Database pool ready");
    let store = Arc::new(PgVideoStore::new(db_pool.clone()));

    let mut configured = ConfiguredServices::default();

    let writer: Arc<dyn ScriptWriter> = match &config.gemini_api_key {
        Some(api_key) => {
            tracing::info!("Initializing Gemini AI client ({})...", config.gemini_model);
            configured.gemini = true;
            Arc::new(GeminiClient::new(api_key.clone()).with_model(config.gemini_model.clone()))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not found. Script generation will fail until it is set.");
            Arc::new(Unconfigured("GEMINI_API_KEY"))
        }
    };

    let voice: Arc<dyn VoiceSynthesizer> =
        match (&config.elevenlabs_api_key, &config.elevenlabs_voice_id) {
            (Some(api_key), Some(voice_id)) => {
                tracing::info!("Initializing Eleven Labs text-to-speech (voice {})...", voice_id);
                configured.elevenlabs = true;
                Arc::new(NarrationVoice::new(
                    ElevenLabsClient::new(api_key.clone()),
                    voice_id.clone(),
                ))
            }
            (None, _) => {
                tracing::warn!("ELEVEN_LABS_API_KEY not found. Voice-over generation disabled.");
                Arc::new(Unconfigured("ELEVEN_LABS_API_KEY"))
            }
            (_, None) => {
                tracing::warn!("ELEVEN_LABS_VOICE_ID not found. Voice-over generation disabled.");
                Arc::new(Unconfigured("ELEVEN_LABS_VOICE_ID"))
            }
        };

    let storage: Arc<dyn ObjectStorage> = match (&config.supabase_url, &config.supabase_service_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Initializing object storage (bucket {})...", config.storage_bucket);
            configured.storage = true;
            Arc::new(StorageClient::new(url, key.clone(), config.storage_bucket.clone()))
        }
        _ => {
            tracing::warn!("SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY not set. Audio uploads disabled.");
            Arc::new(Unconfigured("SUPABASE_SERVICE_ROLE_KEY"))
        }
    };

    let functions = config
        .functions_base_url
        .as_deref()
        .map(|base| FunctionsClient::new(base, config.supabase_service_key.clone()));
    let captions: Arc<dyn CaptionGenerator> = match &functions {
        Some(client) => {
            tracing::info!("Captions via {}", client.function_url("generate-captions"));
            configured.functions = true;
            Arc::new(client.clone())
        }
        None => {
            tracing::warn!("FUNCTIONS_BASE_URL not set. Caption generation disabled.");
            Arc::new(Unconfigured("FUNCTIONS_BASE_URL"))
        }
    };

    let render_specs = Arc::new(
        RenderSpecBuilder::new(store.clone(), config.public_base_url())
            .with_bucket(config.storage_bucket.clone()),
    );

    let renderer: Arc<dyn VideoRenderer> = match &config.render_function_url {
        Some(url) => {
            tracing::info!("🎬 Rendering via remote function {}", url);
            configured.remote_renderer = true;
            let client = functions
                .clone()
                .unwrap_or_else(|| FunctionsClient::new(url, config.supabase_service_key.clone()));
            Arc::new(RemoteRenderer::new(client, url.clone()))
        }
        None => {
            tracing::info!("🎬 Rendering in process (render specification stub)");
            Arc::new(InProcessRenderer::new(render_specs.clone()))
        }
    };

    let sessions = Arc::new(SessionManager::new());

    let shared_state = Arc::new(AppState {
        db_pool: Some(db_pool),
        services: PipelineServices {
            writer,
            voice,
            storage,
            captions,
            renderer,
            store,
        },
        render_specs,
        sessions: sessions.clone(),
        configured,
    });

    let app = app_router(shared_state);

    // Drop abandoned sessions; the video records stay in the database
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_old_sessions(SESSION_MAX_AGE_HOURS).await;
            if removed > 0 {
                tracing::info!("🗑️ Removed {} stale pipeline sessions", removed);
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>()).await?;

    Ok(())
}

// Logging configuration: JSON when LOG_FORMAT=json, human-readable otherwise
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,quiz_video=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,quiz_video=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("🎬 Quiz video pipeline starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
