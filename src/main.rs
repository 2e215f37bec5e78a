use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use clap::builder::FalseyValueParser;
use discourse_sync_lib::config::DEFAULT_HOST;
use discourse_sync_lib::{
    DiscourseConfig, PostIdTracker, PostTemplate, SyncConfig, SyncReport, sync_documents,
};
use discourse_sync_sinks::DiscourseSink;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Publish a directory of Markdown documents as Discourse posts.
///
/// Every setting can come from the environment; flags override it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Forum base URL
    #[arg(long, env = "DISCOURSE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "DISCOURSE_API_USERNAME")]
    api_username: Option<String>,

    #[arg(long, env = "DISCOURSE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory scanned for `.md` files
    #[arg(long, env = "DOCS_DIR")]
    docs_dir: PathBuf,

    /// Mapping of document name to post id (YAML, or TOML for `.toml` files)
    #[arg(long, env = "POST_IDS")]
    post_ids: PathBuf,

    /// Log what would be created or updated without touching the forum or the mapping
    #[arg(long, env = "DISCOURSE_DRY_RUN", value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Category for newly created posts
    #[arg(long, env = "DISCOURSE_CATEGORY_ID", default_value_t = 22)]
    category_id: u64,

    /// Prepended to the document name to form a new post's title
    #[arg(long, env = "DISCOURSE_TITLE_PREFIX", default_value = "juju ")]
    title_prefix: String,

    /// Tag for newly created posts (repeatable, or comma separated in the environment)
    #[arg(long = "tag", env = "DISCOURSE_TAGS", value_delimiter = ',', default_value = "olm")]
    tags: Vec<String>,
}

impl Args {
    fn into_config(self) -> SyncConfig {
        SyncConfig {
            discourse: DiscourseConfig {
                host: self.host,
                api_username: self.api_username,
                api_key: self.api_key,
            },
            docs_dir: self.docs_dir,
            post_ids: self.post_ids,
            template: PostTemplate {
                title_prefix: self.title_prefix,
                category_id: self.category_id,
                tags: self.tags,
            },
            dry_run: self.dry_run,
        }
    }
}

fn run(config: &SyncConfig) -> Result<SyncReport, Box<dyn Error>> {
    let mut sink = DiscourseSink::new(&config.discourse)?;
    let mut tracker = PostIdTracker::load(&config.post_ids)?;

    let report = sync_documents(
        &config.docs_dir,
        &mut sink,
        &mut tracker,
        &config.template,
        config.dry_run,
    )?;
    Ok(report)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();
    if config.dry_run {
        info!("Dry run: no posts will be created or updated");
    }

    let report = run(&config).inspect_err(|e| error!(error = %e, "Sync failed"))?;
    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        "Sync complete"
    );

    Ok(())
}
