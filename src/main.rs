use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use catalog_assistant::assistant::{
    DEFAULT_MODEL, DEFAULT_PRODUCT_LINK_BASE, DEFAULT_SUPPORT_EMAIL,
};
use catalog_assistant::cache::{KeyValueCache, RedisCache};
use catalog_assistant::client::client::DEFAULT_BASE_URL;
use catalog_assistant::client::OpenAIClient;
use catalog_assistant::config::{default_log_filter, Settings};
use catalog_assistant::provision::{Provisioner, DEFAULT_KEY_PREFIX};
use catalog_assistant::session::{self, SAMPLE_QUESTION};
use catalog_assistant::AppContext;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Answer product questions from a catalog with a hosted assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "")]
    redis_url: String,

    /// OpenAI API key
    #[arg(long, env = "OPEN_AI_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base_url: String,

    /// Catalog file uploaded to the assistant
    #[arg(long, env = "CATALOG_PATH", default_value = "data/ecommerce.txt")]
    catalog: PathBuf,

    #[arg(long, env = "CACHE_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    key_prefix: String,

    /// Scope the conversation thread to this session id
    #[arg(long, env = "SESSION_ID")]
    session: Option<String>,

    #[arg(long, env = "ASSISTANT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "SUPPORT_EMAIL", default_value = DEFAULT_SUPPORT_EMAIL)]
    support_email: String,

    #[arg(long, env = "PRODUCT_LINK_BASE", default_value = DEFAULT_PRODUCT_LINK_BASE)]
    product_link_base: String,

    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Give up on a run after this many seconds (0 waits forever)
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value_t = 300)]
    poll_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the assistant a question (default)
    Ask { question: Option<String> },
    /// Print the cached resource ids
    Show,
    /// Forget the cached resource ids
    Reset,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            redis_url: self.redis_url.clone(),
            api_key: self.api_key.clone(),
            api_base_url: self.api_base_url.clone(),
            catalog_path: self.catalog.clone(),
            key_prefix: self.key_prefix.clone(),
            session: self.session.clone(),
            model: self.model.clone(),
            support_email: self.support_email.clone(),
            product_link_base: self.product_link_base.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_timeout: (self.poll_timeout_secs > 0)
                .then(|| Duration::from_secs(self.poll_timeout_secs)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.debug).into()),
        )
        .init();

    let settings = cli.settings();
    settings.validate()?;

    let cache = Arc::new(RedisCache::new(settings.redis_url.clone()));
    cache.connect().await?;

    let api = Arc::new(
        OpenAIClient::new(settings.api_key.clone()).with_base_url(&settings.api_base_url),
    );
    let ctx = AppContext::new(cache.clone(), api);

    let result = run(&ctx, &settings, cli.command).await;
    cache.close().await;
    result
}

async fn run(
    ctx: &AppContext,
    settings: &Settings,
    command: Option<Command>,
) -> Result<(), Box<dyn std::error::Error>> {
    let keys = settings.cache_keys();
    let session_id = settings.session.as_deref();

    match command.unwrap_or(Command::Ask { question: None }) {
        Command::Ask { question } => {
            if ctx.cache.get(&keys.data_file_id()).await?.is_none() {
                settings.validate_catalog()?;
            }

            let provisioned = Provisioner::new(ctx, &keys)
                .provision(&settings.catalog_path, &settings.profile(), session_id)
                .await?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Received Ctrl+C, no longer waiting for the run");
                    on_signal.cancel();
                }
            });

            let question = question.as_deref().unwrap_or(SAMPLE_QUESTION);
            info!("Asking: {}", question);
            let answer =
                session::ask(ctx, &provisioned, question, &settings.poller(), &cancel).await?;
            println!("{}", answer.render());
        }
        Command::Show => {
            for key in keys.all(session_id) {
                match ctx.cache.get(&key).await? {
                    Some(id) => println!("{key} = {id}"),
                    None => println!("{key} (not set)"),
                }
            }
            let others = ctx.cache.keys(&format!("{}*", keys.prefix())).await?;
            let known = keys.all(session_id);
            for key in others.iter().filter(|k| !known.contains(*k)) {
                println!("{key} (other)");
            }
        }
        Command::Reset => {
            for key in keys.all(session_id) {
                ctx.cache.delete(&key).await?;
                info!("Deleted {}", key);
            }
        }
    }

    Ok(())
}
