use clap::{Parser, Subcommand};
use royalbit_mip::cli;
use royalbit_mip::error::MipResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mip")]
#[command(about = "Read, stamp and bootstrap sensitivity labels on Office documents.")]
#[command(long_about = "MIP - Microsoft Information Protection labels for .docx / .xlsx
No Office installation required: labels are written straight into the document package.

COMMANDS:
  init    - Capture label definitions from labeled template documents
  labels  - List configured labels
  show    - Show the label of documents
  set     - Stamp a configured label onto documents
  new     - Create a new document carrying a label

MECHANISMS:
  default              Built-in label property (docMetadata/LabelInfo.xml),
                       mirrored into MSIP_Label_* custom properties
  --custom-properties  MSIP_Label_* custom properties only (.xlsx)

EXAMPLES:
  mip init --templates sensitivity_model      # One-time bootstrap
  mip set report.docx --label InternalUseOnly
  mip show report.docx budget.xlsx --json
  mip new budget.xlsx --label Public --custom-properties

LOGGING:
  RUST_LOG=royalbit_mip=debug mip show report.docx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Capture label definitions from template documents.

Create one document per sensitivity label with Word or Excel, apply the label,
and name the file after it:

  sensitivity_model/
    CommercialInConfidence.xlsx
    InternalUseOnly.docx
    Public.xlsx

Each template's label is recorded under its file name. Templates without a
label are skipped. Every organisation has its own label ids, so this only
needs to run once per tenant.")]
    /// Capture label definitions from labeled template documents
    Init {
        /// Directory holding one labeled template per sensitivity label
        #[arg(short, long, default_value = "sensitivity_model")]
        templates: PathBuf,

        /// Label configuration file to write
        #[arg(short, long, env = "MIP_LABELS_CONFIG")]
        config: Option<PathBuf>,

        /// Read labels from MSIP_Label_* custom properties (.xlsx templates only)
        #[arg(long)]
        custom_properties: bool,
    },

    /// List configured labels
    Labels {
        /// Label configuration file
        #[arg(short, long, env = "MIP_LABELS_CONFIG")]
        config: Option<PathBuf>,

        /// Use the custom-properties configuration
        #[arg(long)]
        custom_properties: bool,
    },

    /// Show the sensitivity label of documents
    Show {
        /// Documents to inspect (.docx, .xlsx)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print label info as JSON
        #[arg(long)]
        json: bool,

        /// Read MSIP_Label_* custom properties only (.xlsx)
        #[arg(long)]
        custom_properties: bool,
    },

    #[command(long_about = "Stamp a configured sensitivity label onto documents.

The label is looked up by name in the configuration written by 'mip init'.
Documents are modified in place.

EXAMPLES:
  mip set report.docx budget.xlsx --label InternalUseOnly
  mip set budget.xlsx --label Public --justification \"Published in annual report\"")]
    /// Stamp a configured label onto documents
    Set {
        /// Documents to label (.docx, .xlsx)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Configured label name
        #[arg(short, long)]
        label: String,

        /// Label configuration file
        #[arg(short, long, env = "MIP_LABELS_CONFIG")]
        config: Option<PathBuf>,

        /// Justification recorded with the label
        #[arg(short, long)]
        justification: Option<String>,

        /// Write MSIP_Label_* custom properties only (.xlsx)
        #[arg(long)]
        custom_properties: bool,
    },

    /// Create a new document carrying a label
    New {
        /// Document to create (.docx, .xlsx)
        file: PathBuf,

        /// Configured label name
        #[arg(short, long)]
        label: String,

        /// Label configuration file
        #[arg(short, long, env = "MIP_LABELS_CONFIG")]
        config: Option<PathBuf>,

        /// Write MSIP_Label_* custom properties only (.xlsx)
        #[arg(long)]
        custom_properties: bool,
    },
}

fn main() -> MipResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "royalbit_mip=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            templates,
            config,
            custom_properties,
        } => cli::init(templates, config, custom_properties),

        Commands::Labels {
            config,
            custom_properties,
        } => cli::labels(config, custom_properties),

        Commands::Show {
            files,
            json,
            custom_properties,
        } => cli::show(files, json, custom_properties),

        Commands::Set {
            files,
            label,
            config,
            justification,
            custom_properties,
        } => cli::set(files, label, config, justification, custom_properties),

        Commands::New {
            file,
            label,
            config,
            custom_properties,
        } => cli::new_document(file, label, config, custom_properties),
    }
}
