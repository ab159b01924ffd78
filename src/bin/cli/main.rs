use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use storage_setup::{
    adapters::inbound::cli::{ConnectionSummaryDto, OutputFormat, Renderer},
    app::{create_local_emulator, App, AppBuilder, Target},
    domain::{DEFAULT_LOCAL_ENDPOINT, DEFAULT_REGION},
    services::StopOutcome,
    BucketName, BucketSpec, Credential, Endpoint, ObjectKey, PolicyChoice, Region,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "storage-setup")]
#[command(about = "Idempotent bucket provisioning for MinIO and S3-compatible storage", long_about = None)]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output format for reports and listings
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision a bucket on the local emulator
    #[command(alias = "local")]
    ProvisionLocal(LocalArgs),

    /// Provision a bucket on a cloud S3 endpoint
    #[command(alias = "cloud")]
    ProvisionCloud(CloudArgs),

    /// List buckets visible to the credentials
    #[command(alias = "list")]
    ListBuckets(ConnectionArgs),

    /// Stop the local emulator container
    #[command(alias = "stop")]
    StopLocal,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Endpoint as host[:port] or http(s)://host[:port]
    #[arg(long, env = "STORAGE_ENDPOINT", default_value = DEFAULT_LOCAL_ENDPOINT)]
    endpoint: String,

    /// Access key
    #[arg(long, env = "MINIO_ROOT_USER", default_value = "minioadmin")]
    access_key: String,

    /// Secret key
    #[arg(long, env = "MINIO_ROOT_PASSWORD", default_value = "minioadmin", hide_env_values = true)]
    secret_key: String,

    /// Use HTTPS
    #[arg(long, overrides_with = "no_secure")]
    secure: bool,

    /// Use plain HTTP (default)
    #[arg(long, overrides_with = "secure")]
    no_secure: bool,
}

impl ConnectionArgs {
    fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.endpoint, self.secure)
            .with_context(|| format!("invalid endpoint '{}'", self.endpoint))
    }

    fn credential(&self) -> Result<Credential> {
        Credential::new(&self.access_key, &self.secret_key).context("invalid credentials")
    }
}

#[derive(Args, Debug)]
struct VersioningArgs {
    /// Enable bucket versioning (default)
    #[arg(long, overrides_with = "no_versioning")]
    versioning: bool,

    /// Leave versioning as it is
    #[arg(long, overrides_with = "versioning")]
    no_versioning: bool,
}

impl VersioningArgs {
    fn enabled(&self) -> bool {
        !self.no_versioning
    }
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// Local file to upload once the bucket is provisioned
    #[arg(long, value_name = "FILE")]
    upload: Option<PathBuf>,

    /// Object key for the upload, defaults to the file name
    #[arg(long, requires = "upload")]
    key: Option<String>,
}

impl UploadArgs {
    fn request(&self) -> Result<Option<(ObjectKey, &Path)>> {
        let Some(path) = self.upload.as_deref() else {
            return Ok(None);
        };

        let key = match &self.key {
            Some(key) => ObjectKey::new(key.as_str()),
            None => ObjectKey::from_file_name(path),
        }
        .context("invalid object key")?;

        Ok(Some((key, path)))
    }
}

#[derive(Args, Debug)]
struct LocalArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Bucket to provision
    #[arg(long, env = "STORAGE_BUCKET", default_value = "basalt-vault")]
    bucket: String,

    #[command(flatten)]
    versioning: VersioningArgs,

    /// Access policy applied to the bucket
    #[arg(long, value_enum, ignore_case = true, default_value_t = PolicyChoice::Private)]
    policy: PolicyChoice,

    /// Do not start the emulator container
    #[arg(long)]
    skip_emulator: bool,

    #[command(flatten)]
    upload: UploadArgs,
}

#[derive(Args, Debug)]
struct CloudArgs {
    /// Endpoint as host[:port] or https://host[:port]
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: String,

    /// Access key
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    access_key: Option<String>,

    /// Secret key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Bucket to provision
    #[arg(long, env = "S3_BUCKET")]
    bucket: String,

    #[command(flatten)]
    versioning: VersioningArgs,

    /// Address buckets by path instead of virtual host
    #[arg(long)]
    path_style: bool,

    #[command(flatten)]
    upload: UploadArgs,
}

impl CloudArgs {
    fn credential(&self) -> Result<Credential> {
        let access_key = self
            .access_key
            .as_deref()
            .context("--access-key or AWS_ACCESS_KEY_ID is required")?;
        let secret_key = self
            .secret_key
            .as_deref()
            .context("--secret-key or AWS_SECRET_ACCESS_KEY is required")?;
        Credential::new(access_key, secret_key).context("invalid credentials")
    }
}

impl Cli {
    fn init_logging(&self) {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.to_lowercase()));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn exit_code(succeeded: bool) -> ExitCode {
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Provision, optionally upload, and print the report
async fn provision_and_report(
    app: &App,
    spec: &BucketSpec,
    upload: Option<(ObjectKey, &Path)>,
    renderer: Renderer,
) -> Result<bool> {
    let mut report = app.provision(spec).await;
    if let Some((key, path)) = upload {
        app.upload(&mut report, &key, path).await;
    }

    println!("{}", renderer.report(&report)?);
    for failure in report.failures() {
        if let Some(err) = failure.error() {
            eprintln!("error: {} failed: {}", failure.kind, err);
        }
    }

    Ok(report.succeeded())
}

async fn provision_local(args: LocalArgs, renderer: Renderer) -> Result<ExitCode> {
    let endpoint = args.connection.endpoint()?;
    let credential = args.connection.credential()?;
    let bucket = BucketName::new(args.bucket.as_str()).context("invalid bucket name")?;
    let upload = args.upload.request()?;

    let manage_emulator = !args.skip_emulator && endpoint.is_default_local();
    let app = AppBuilder::new()
        .with_target(Target::Local {
            endpoint: endpoint.clone(),
            credential: credential.clone(),
            manage_emulator,
        })
        .build()
        .await
        .context("Failed to build application")?;

    app.prepare().await?;

    let spec = BucketSpec::builder()
        .name(bucket.clone())
        .versioning(args.versioning.enabled())
        .policy(args.policy)
        .build();

    let succeeded = provision_and_report(&app, &spec, upload, renderer).await?;

    match app.list_buckets().await {
        Ok(buckets) => println!("{}", renderer.buckets(&buckets)?),
        Err(err) => warn!(error = %err, "Could not list buckets"),
    }

    if succeeded {
        let summary = ConnectionSummaryDto::new(&endpoint, &credential, None, bucket.as_str());
        println!("{}", renderer.connection(&summary)?);
    }

    Ok(exit_code(succeeded))
}

async fn provision_cloud(args: CloudArgs, renderer: Renderer) -> Result<ExitCode> {
    let endpoint = Endpoint::parse(&args.endpoint, true)
        .with_context(|| format!("invalid endpoint '{}'", args.endpoint))?;
    let credential = args.credential()?;
    let region = Region::new(args.region.as_str()).context("invalid region")?;
    let bucket = BucketName::new(args.bucket.as_str()).context("invalid bucket name")?;
    let upload = args.upload.request()?;

    let app = AppBuilder::new()
        .with_target(Target::Cloud {
            endpoint: endpoint.clone(),
            credential: credential.clone(),
            region: region.clone(),
            path_style: args.path_style,
        })
        .build()
        .await
        .context("Failed to build application")?;

    let spec = BucketSpec::builder()
        .name(bucket.clone())
        .versioning(args.versioning.enabled())
        .region(region.clone())
        .build();

    let succeeded = provision_and_report(&app, &spec, upload, renderer).await?;

    if succeeded {
        let summary =
            ConnectionSummaryDto::new(&endpoint, &credential, Some(&region), bucket.as_str());
        println!("{}", renderer.connection(&summary)?);
    }

    Ok(exit_code(succeeded))
}

async fn list_buckets(args: ConnectionArgs, renderer: Renderer) -> Result<ExitCode> {
    let app = AppBuilder::new()
        .with_target(Target::Local {
            endpoint: args.endpoint()?,
            credential: args.credential()?,
            manage_emulator: false,
        })
        .build()
        .await
        .context("Failed to build application")?;

    let buckets = app.list_buckets().await?;
    println!("{}", renderer.buckets(&buckets)?);
    Ok(ExitCode::SUCCESS)
}

async fn stop_local() -> Result<ExitCode> {
    match create_local_emulator().stop().await? {
        StopOutcome::Stopped => println!("Local emulator stopped"),
        StopOutcome::NotRunning => println!("Local emulator is not running"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let renderer = Renderer::new(cli.format);

    match cli.command {
        Commands::ProvisionLocal(args) => provision_local(args, renderer).await,
        Commands::ProvisionCloud(args) => provision_cloud(args, renderer).await,
        Commands::ListBuckets(args) => list_buckets(args, renderer).await,
        Commands::StopLocal => stop_local().await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Usage errors exit 1 like every other failure
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return exit_code(!err.use_stderr());
        }
    };

    cli.init_logging();
    info!("Starting storage-setup");

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
