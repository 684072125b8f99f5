mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use najie_core::ConfigStore;
use najie_storage::provider::Connector;
use najie_storage::{DEFAULT_URL_EXPIRES_SECS, LocalConnector, ObjectStorageClient, S3Connector};

#[derive(Parser)]
#[command(name = "najie-storage-cos")]
#[command(about = "Tencent Cloud Object Storage (COS) client")]
#[command(version)]
struct Cli {
    /// Path to the credential file (default: ~/.najie/storage-cos.json)
    #[arg(long, global = true, env = "NAJIE_COS_CONFIG")]
    config_file: Option<PathBuf>,

    /// S3-compatible endpoint to use instead of COS, `{region}` is substituted
    #[arg(long, global = true, env = "NAJIE_COS_ENDPOINT")]
    endpoint: Option<String>,

    /// Serve buckets from directories under this path instead of a remote service
    #[arg(long, global = true, conflicts_with = "endpoint")]
    local_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the COS configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List objects in the bucket
    Ls {
        /// Only keys starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,
        /// Maximum number of objects to show
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Upload a local file
    Upload {
        file: PathBuf,
        /// Object key (default: the file name)
        #[arg(long)]
        key: Option<String>,
    },

    /// Download an object
    Download {
        key: String,
        /// Output path (default: ./<name of the key>)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Delete an object
    Rm { key: String },

    /// Print a signed download URL
    Url {
        key: String,
        /// Validity in seconds
        #[arg(long, default_value_t = DEFAULT_URL_EXPIRES_SECS)]
        expires: u64,
    },

    /// Start the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:5175")]
        listen: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Set configuration values; omitted values keep what is stored
    Set {
        #[arg(long, alias = "secretId")]
        secret_id: Option<String>,
        #[arg(long, alias = "secretKey")]
        secret_key: Option<String>,
        #[arg(long)]
        bucket: Option<String>,
        #[arg(long)]
        region: Option<String>,
    },
    /// Show the current configuration with secrets masked
    Show,
    /// Test the connection with the stored configuration
    Test,
}

fn build_client(cli: &Cli) -> anyhow::Result<ObjectStorageClient> {
    let store = match cli.config_file {
        Some(ref path) => ConfigStore::at(path),
        None => ConfigStore::default_location()?,
    };

    let connector: Arc<dyn Connector> = match (&cli.local_root, &cli.endpoint) {
        (Some(root), _) => Arc::new(LocalConnector::new(root)),
        (None, Some(endpoint)) => Arc::new(S3Connector::s3_compatible(endpoint)),
        (None, None) => Arc::new(S3Connector::cos()),
    };

    Ok(ObjectStorageClient::new(store, connector))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("najie=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = build_client(&cli)?;

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Config(ConfigCommand::Set {
            secret_id,
            secret_key,
            bucket,
            region,
        }) => rt.block_on(commands::config::set(
            &client,
            commands::config::SetArgs {
                secret_id,
                secret_key,
                bucket,
                region,
            },
        )),
        Commands::Config(ConfigCommand::Show) => rt.block_on(commands::config::show(&client)),
        Commands::Config(ConfigCommand::Test) => rt.block_on(commands::config::test(&client)),
        Commands::Ls { ref prefix, limit } => rt.block_on(commands::list::run(&client, prefix, limit)),
        Commands::Upload { ref file, ref key } => {
            rt.block_on(commands::upload::run(&client, file, key.as_deref()))
        }
        Commands::Download {
            ref key,
            ref output,
        } => rt.block_on(commands::download::run(&client, key, output.as_deref())),
        Commands::Rm { ref key } => rt.block_on(commands::remove::run(&client, key)),
        Commands::Url { ref key, expires } => rt.block_on(commands::url::run(&client, key, expires)),
        Commands::Serve { listen } => rt.block_on(commands::serve::run(client, listen)),
    }
}
