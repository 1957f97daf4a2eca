//! Marshalkit: typed marshalling for workflow data.
//!
//! Marshalkit converts in-process values (file references and tabular
//! datasets) into portable, serializable literals and back. Data is staged
//! through a blob store on the way out, and fetched lazily on the way in.
//!
//! # Modules
//!
//! - [`literal`]: The literal model (blobs, structured datasets, literal types)
//! - [`engine`]: Declared types and the transformer dispatch contract
//! - [`file`]: File references and the blob transformer
//! - [`dataset`]: Structured datasets, handlers, and the dataset transformer
//! - [`storage`]: The blob-store interface and a local-filesystem store
//! - [`error`]: Error types for marshalkit operations

pub mod dataset;
pub mod engine;
pub mod error;
pub mod file;
pub mod literal;
pub mod storage;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

pub use error::MarshalError;

use dataset::{HandlerRegistryBuilder, StructuredDataset, StructuredDatasetTransformer};
use engine::{DeclaredType, TypeEngine};
use file::FileRef;
use literal::{io_json, Literal, LiteralType};
use storage::{FileAccess, LocalFileAccess, StoreConfig};

/// The marshalkit CLI application.
#[derive(Parser)]
#[command(name = "marshalkit")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the local store lives.
#[derive(clap::Args)]
struct StoreArgs {
    /// Directory backing object-store URIs (s3://, gs://, ...).
    #[arg(
        long,
        global = true,
        env = "MARSHALKIT_STORE_ROOT",
        default_value = ".marshalkit/store"
    )]
    store_root: PathBuf,

    /// Prefix for freshly minted remote paths.
    #[arg(
        long,
        global = true,
        env = "MARSHALKIT_RAW_OUTPUT_PREFIX",
        default_value = "s3://marshalkit-data/raw"
    )]
    raw_output_prefix: String,

    /// Scratch directory for downloads (defaults to the system temp dir).
    #[arg(long, global = true, env = "MARSHALKIT_SANDBOX")]
    sandbox: Option<PathBuf>,
}

impl StoreArgs {
    fn config(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            store_root: self.store_root.clone(),
            raw_output_prefix: self.raw_output_prefix.clone(),
            sandbox: self.sandbox.clone().unwrap_or(defaults.sandbox),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Encode a local file as a blob literal.
    Upload(UploadArgs),
    /// Decode a blob literal and fetch its data.
    Download(DownloadArgs),
    /// Encode a Parquet file as a structured dataset literal.
    Dataset(DatasetArgs),
    /// Print the column schema of a structured dataset literal.
    Schema(SchemaArgs),
}

#[derive(clap::Args)]
struct UploadArgs {
    /// File to encode.
    input: PathBuf,

    /// Format tag for the blob (e.g. 'csv'). Empty means any format.
    #[arg(long, default_value = "")]
    format: String,

    /// Upload to this remote path instead of a fresh one.
    #[arg(long, conflicts_with = "no_upload")]
    remote_path: Option<String>,

    /// Reference the local path in the literal without uploading.
    #[arg(long)]
    no_upload: bool,

    /// Write the literal JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct DownloadArgs {
    /// Blob literal JSON file.
    literal: PathBuf,

    /// Expected format tag. Empty means any format.
    #[arg(long, default_value = "")]
    format: String,

    /// Copy the downloaded file here.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct DatasetArgs {
    /// Parquet file to encode.
    input: PathBuf,

    /// Persist to this remote path instead of a fresh one.
    #[arg(long)]
    remote_path: Option<String>,

    /// Write the literal JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct SchemaArgs {
    /// Structured dataset literal JSON file.
    literal: PathBuf,
}

/// Run the marshalkit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), MarshalError> {
    let cli = Cli::parse();
    let file_access: Arc<dyn FileAccess> = Arc::new(LocalFileAccess::new(cli.store.config()));

    match cli.command {
        Some(Commands::Upload(args)) => run_upload(args, file_access),
        Some(Commands::Download(args)) => run_download(args, file_access),
        Some(Commands::Dataset(args)) => run_dataset(args, file_access),
        Some(Commands::Schema(args)) => run_schema(args, file_access),
        None => {
            println!("marshalkit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Typed marshalling for files and structured datasets.");
            println!();
            println!("Run 'marshalkit --help' for usage information.");
            Ok(())
        }
    }
}

fn run_upload(args: UploadArgs, file_access: Arc<dyn FileAccess>) -> Result<(), MarshalError> {
    let engine = TypeEngine::with_defaults(file_access);

    let mut value = FileRef::new(args.input.to_string_lossy()).with_format(args.format.as_str());
    if let Some(remote_path) = args.remote_path {
        value = value.with_remote_destination(remote_path);
    }
    if args.no_upload {
        value = value.never_upload();
    }

    let literal = engine.to_literal(Some(&value), &DeclaredType::file(args.format.as_str()))?;
    emit_literal(&literal, args.output)
}

fn run_download(args: DownloadArgs, file_access: Arc<dyn FileAccess>) -> Result<(), MarshalError> {
    let engine = TypeEngine::with_defaults(file_access);
    let literal = io_json::read_literal_json(&args.literal)?;

    let value: FileRef =
        engine.to_native_as(&literal, &DeclaredType::file(args.format.as_str()))?;
    let local = value.local_path()?;

    match args.output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(local, &output)?;
            println!("{}", output.display());
        }
        None => println!("{}", local.display()),
    }
    Ok(())
}

fn run_dataset(args: DatasetArgs, file_access: Arc<dyn FileAccess>) -> Result<(), MarshalError> {
    let engine = TypeEngine::with_defaults(file_access);
    let batch = dataset::parquet::read_parquet_file(&args.input)?;

    let mut value = StructuredDataset::from_dataframe(batch);
    if let Some(remote_path) = args.remote_path {
        value = value.with_remote_path(remote_path);
    }

    let literal = engine.to_literal(Some(&value), &DeclaredType::dataset())?;
    emit_literal(&literal, args.output)
}

fn run_schema(args: SchemaArgs, file_access: Arc<dyn FileAccess>) -> Result<(), MarshalError> {
    let literal = io_json::read_literal_json(&args.literal)?;
    let dataset = literal.as_structured_dataset().ok_or_else(|| {
        MarshalError::InvalidArgument(format!(
            "{} holds a {} literal, not a structured dataset",
            args.literal.display(),
            literal.kind_name()
        ))
    })?;

    let transformer =
        StructuredDatasetTransformer::new(HandlerRegistryBuilder::new().build(), file_access);
    let literal_type =
        LiteralType::StructuredDataset(dataset.metadata.structured_dataset_type.clone());
    let DeclaredType::StructuredDataset(schema) = transformer.guess_type(&literal_type)? else {
        return Err(MarshalError::InvalidState(
            "guessed type is not a structured dataset".into(),
        ));
    };

    println!("format: {}", dataset.metadata.format);
    if schema.is_empty() {
        println!("(no columns)");
    }
    for (name, column_type) in schema.columns() {
        println!("{name}: {column_type}");
    }
    Ok(())
}

fn emit_literal(literal: &Literal, output: Option<PathBuf>) -> Result<(), MarshalError> {
    match output {
        Some(path) => {
            io_json::write_literal_json(&path, literal)?;
            println!("Wrote {}", path.display());
        }
        None => {
            let json = io_json::to_json_string(literal).map_err(|source| {
                MarshalError::LiteralJsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{json}");
        }
    }
    Ok(())
}
