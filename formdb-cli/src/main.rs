use clap::{Parser, Subcommand, ValueEnum};
use formdb::config::{load_config, CompilerConfig};
use formdb::registry::{SchemaInfo, SchemaRegistry};
use formdb::schema::parse_schema;
use formdb::Compiler;
use std::path::{Path, PathBuf};
use std::process;

/// formdb: compile document schemas into relational tables
#[derive(Parser)]
#[command(name = "formdb", version, about)]
struct Cli {
    /// Path to the schema registry database
    #[arg(long, default_value = "formdb.db")]
    registry: PathBuf,

    /// Compiler config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for structured results
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the CREATE TABLE script for a schema file
    Compile {
        /// Schema file (.yaml or .json)
        schema: PathBuf,
    },

    /// Print the table blueprints for a schema file, root first
    Tables {
        /// Schema file (.yaml or .json)
        schema: PathBuf,
    },

    /// Register a new schema name
    InfoAdd {
        /// Schema name
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Change the description or active flag of a registered schema
    InfoUpdate {
        /// Schema name
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Mark the schema active or inactive
        #[arg(long)]
        active: Option<bool>,
    },

    /// List registered schemas
    Infos,

    /// Store a schema file as the next revision
    Add {
        schema: PathBuf,
        #[arg(long, default_value = "")]
        remark: String,
    },

    /// Store a schema file as the draft, replacing any existing draft
    Draft {
        schema: PathBuf,
        #[arg(long, default_value = "")]
        remark: String,
    },

    /// Show a stored schema definition
    Show {
        /// Schema name
        name: String,
        /// Revision to show (default: latest)
        #[arg(long, conflicts_with = "draft")]
        revision: Option<i32>,
        /// Show the draft instead of a revision
        #[arg(long)]
        draft: bool,
    },

    /// Compile the latest revision of a schema and record the script
    Publish {
        /// Schema name
        name: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => {
            log::debug!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => CompilerConfig::default(),
    };
    let compiler = Compiler::from_config(&config);

    match cli.command {
        Command::Compile { schema } => {
            let doc = parse_schema(&schema)?;
            print!("{}", compiler.compile(&doc)?);
        }

        Command::Tables { schema } => {
            let doc = parse_schema(&schema)?;
            let decomposition = compiler.decompose(&doc)?;
            let tables = serde_json::to_value(decomposition.tables())?;
            print_output(&tables, &cli.format)?;
        }

        Command::InfoAdd { name, description } => {
            let registry = open_registry(&cli.registry)?;
            let info = registry.add_schema_info(&name, &description)?;
            print_output(&info_to_json(&info), &cli.format)?;
        }

        Command::InfoUpdate {
            name,
            description,
            active,
        } => {
            let registry = open_registry(&cli.registry)?;
            let current = registry
                .get_schema_info(&name)?
                .ok_or_else(|| format!("Schema '{name}' not found"))?;
            let info = registry.update_schema_info(
                &name,
                description.as_deref().unwrap_or(current.description.as_str()),
                active.unwrap_or(current.is_active),
            )?;
            print_output(&info_to_json(&info), &cli.format)?;
        }

        Command::Infos => {
            let registry = open_registry(&cli.registry)?;
            let infos: Vec<_> = registry.list_schema_info()?.iter().map(info_to_json).collect();
            print_output(&serde_json::Value::Array(infos), &cli.format)?;
        }

        Command::Add { schema, remark } => {
            let registry = open_registry(&cli.registry)?;
            let doc = parse_schema(&schema)?;
            let revision = registry.add_schema(&doc, &remark)?;
            print_output(
                &serde_json::json!({ "ok": true, "name": doc.name, "revision": revision }),
                &cli.format,
            )?;
        }

        Command::Draft { schema, remark } => {
            let registry = open_registry(&cli.registry)?;
            let doc = parse_schema(&schema)?;
            registry.save_draft(&doc, &remark)?;
            print_output(
                &serde_json::json!({ "ok": true, "name": doc.name, "draft": true }),
                &cli.format,
            )?;
        }

        Command::Show { name, revision, draft } => {
            let registry = open_registry(&cli.registry)?;
            let doc = if draft {
                registry.get_draft(&name)?
            } else if let Some(revision) = revision {
                registry.get_schema_by_revision(&name, revision)?
            } else {
                registry.get_schema(&name)?
            };

            match doc {
                Some(doc) => print_output(&serde_json::to_value(&doc)?, &cli.format)?,
                None => return Err(format!("Schema '{name}' not found").into()),
            }
        }

        Command::Publish { name } => {
            let registry = open_registry(&cli.registry)?;
            let published = registry.publish(&name, &compiler)?;
            print!("{}", published.ddl);
        }
    }

    Ok(())
}

fn open_registry(path: &Path) -> Result<SchemaRegistry, Box<dyn std::error::Error>> {
    Ok(SchemaRegistry::open(path)?)
}

fn info_to_json(info: &SchemaInfo) -> serde_json::Value {
    serde_json::json!({
        "id": info.id,
        "name": info.name,
        "description": info.description,
        "is_active": info.is_active,
        "latest_revision": info.latest_revision,
        "has_draft": info.has_draft,
    })
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
