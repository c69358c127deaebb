use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::{Fetcher, RetryPolicy, SourceFetcher};
use crate::notify::ServerChanNotifier;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::translate::{DeeplTranslator, MyMemoryTranslator, OpenAiTranslator, TranslationChain, Translator};

/// Everything one run needs, built once from the configuration. The HTTP
/// client is shared by every stage.
pub struct AppContext {
    pub config: Config,
    pub client: Client,
    pub pipeline: Pipeline,
}

impl AppContext {
    /// Load the configuration (see [`Config::load`]) and wire the pipeline.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(client.clone()).with_timeout(config.fetch.timeout()));
        let sources = SourceFetcher::new(fetcher, retry_policy(&config));
        let translator = translation_chain(&config, &client);
        let notifier = ServerChanNotifier::new(client.clone(), config.credentials.serverchan_sendkey.clone())
            .with_base_url(config.notify.serverchan_base_url.clone())
            .with_timeout(Duration::from_secs(config.notify.timeout_secs));

        let pipeline = Pipeline::new(
            sources,
            translator,
            Box::new(notifier),
            PipelineSettings::from_config(&config),
        );

        Ok(Self {
            config,
            client,
            pipeline,
        })
    }
}

fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy {
        retries: config.fetch.retries,
        backoff_base: Duration::from_millis(config.fetch.backoff_base_ms),
        backoff_step: Duration::from_millis(config.fetch.backoff_step_ms),
    }
}

/// OpenAI, then DeepL, then MyMemory.
fn translation_chain(config: &Config, client: &Client) -> TranslationChain {
    let t = &config.translate;
    let request_timeout = Duration::from_secs(t.request_timeout_secs);

    let providers: Vec<Box<dyn Translator>> = vec![
        Box::new(
            OpenAiTranslator::new(client.clone(), config.credentials.openai_api_key.clone())
                .with_url(t.openai_url.clone())
                .with_model(t.openai_model.clone())
                .with_timeout(Duration::from_secs(t.openai_timeout_secs)),
        ),
        Box::new(
            DeeplTranslator::new(client.clone(), config.credentials.deepl_api_key.clone())
                .with_interval(Duration::from_millis(t.deepl_interval_ms))
                .with_timeout(request_timeout),
        ),
    ];

    let fallback = MyMemoryTranslator::new(client.clone())
        .with_url(t.mymemory_url.clone())
        .with_langpair(t.mymemory_langpair.clone())
        .with_interval(Duration::from_millis(t.mymemory_interval_ms))
        .with_timeout(request_timeout);

    TranslationChain::new(providers, Box::new(fallback))
}
