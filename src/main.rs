use anyhow::Result;
use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

use formfill_studio::config::{AppConfig, ConfigOverrides};
use formfill_studio::core::FormFillStudio;
use formfill_studio::export::ExportFormat;
use formfill_studio::logging::LoggingConfig;
use formfill_studio::policy::DetectionPolicy;
use formfill_studio::profile::JsonFileProfileStore;
use formfill_studio::utils::format_duration;
use formfill_studio::utils::text_utils::TextUtils;

#[derive(Parser)]
#[command(name = "formfill")]
#[command(about = "FormFill Studio Command Line Interface")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Survey a document for fillable application forms
    Scan {
        #[arg(help = "Path to an HTML document")]
        document: String,

        #[arg(short, long, help = "Output file path for the report")]
        output: Option<String>,

        #[arg(short, long, help = "Report format", value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show how each field of the matched forms classifies
    Classify {
        #[arg(help = "Path to an HTML document")]
        document: String,
    },

    /// Fill the matched forms from the stored profile
    Fill {
        #[arg(help = "Path to an HTML document")]
        document: String,

        #[arg(short, long, help = "Profile file overriding the configured one")]
        profile: Option<String>,

        #[arg(short, long, help = "Output file path for the report")]
        output: Option<String>,

        #[arg(short, long, help = "Report format", value_enum)]
        format: Option<OutputFormat>,

        #[arg(long, help = "Print the values written into the form")]
        show_values: bool,
    },

    /// Inspect or validate detection policies
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Print the active detection policy as YAML
    Show,

    /// Validate a policy file
    Validate {
        #[arg(help = "Path to a YAML or JSON policy file")]
        policy_file: String,
    },
}

#[derive(clap::ValueEnum, Clone)]
enum OutputFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    info!("FormFill Studio v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = if let Some(config_path) = cli.config {
        AppConfig::load_from_file(&config_path).await?
    } else {
        AppConfig::load().await?
    };

    ConfigOverrides::apply(&mut config);
    config.ensure_directories().await?;

    // Initialize core application
    let app = FormFillStudio::new(config).await?;

    // Execute command
    match cli.command {
        Commands::Scan { document, output, format } => {
            execute_scan(&app, document, output, format).await?;
        }
        Commands::Classify { document } => {
            execute_classify(&app, document).await?;
        }
        Commands::Fill { document, profile, output, format, show_values } => {
            let app = match profile {
                Some(path) => {
                    app.with_profile_store(Arc::new(JsonFileProfileStore::new(path)))
                }
                None => app,
            };
            execute_fill(&app, document, output, format, show_values).await?;
        }
        Commands::Policy { action } => match action {
            PolicyAction::Show => show_policy(&app)?,
            PolicyAction::Validate { policy_file } => validate_policy(policy_file).await?,
        },
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let log_dir = directories::ProjectDirs::from("com", "formfill", "studio")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    let level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("FORMFILL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };

    let logging_config = LoggingConfig {
        level,
        file_enabled: true,
        console_enabled: true,
        max_files: 5,
        log_directory: log_dir,
        include_spans: false,
        include_targets: false,
    };

    formfill_studio::logging::init_logging(&logging_config)
}

async fn execute_scan(
    app: &FormFillStudio,
    document: String,
    output: Option<String>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let html = tokio::fs::read_to_string(&document).await?;
    let report = app.scan_document(&html)?;

    println!("Scan results for {}:", document);
    println!("Forms found: {} ({} matched)", report.forms_total, report.forms_matched);
    println!("Fields surveyed: {}", report.fields_surveyed);
    println!("Fillable fields: {}", report.fillable_fields);

    if !report.per_category.is_empty() {
        println!("\nMatched categories:");
        let mut categories: Vec<_> = report.per_category.iter().collect();
        categories.sort();
        for (category, count) in categories {
            println!("  {:<15} {}", category, count);
        }
    }

    if output.is_some() || format.is_some() {
        let export_format = resolve_format(format, app)?;
        let stats = app.export_scan_report(&report, output.as_deref(), export_format).await?;
        println!(
            "\nReport exported to {} in {}",
            stats.file_path,
            format_duration(std::time::Duration::from_millis(stats.export_duration_ms))
        );
    }

    Ok(())
}

async fn execute_classify(app: &FormFillStudio, document: String) -> Result<()> {
    let html = tokio::fs::read_to_string(&document).await?;
    let surveyed = app.classify_document(&html)?;

    if surveyed.is_empty() {
        println!("No form detected");
        return Ok(());
    }

    println!("{:<8} {:<28} {}", "Field", "Label", "Category");
    println!("{}", "-".repeat(52));

    for entry in surveyed {
        println!(
            "{:<8} {:<28} {}",
            entry.field.to_string(),
            TextUtils::truncate(&entry.label, 26),
            entry.category.map(|category| category.as_str()).unwrap_or("-")
        );
    }

    Ok(())
}

async fn execute_fill(
    app: &FormFillStudio,
    document: String,
    output: Option<String>,
    format: Option<OutputFormat>,
    show_values: bool,
) -> Result<()> {
    let html = tokio::fs::read_to_string(&document).await?;
    let (page, result) = app.fill_document(&html).await?;

    match result.reason_text() {
        Some(reason) => println!("{}", reason),
        None => {
            println!("Filled {} of {} fields", result.count, result.outcomes.len());

            println!("\n{:<8} {:<28} {:<14} {}", "Field", "Label", "Category", "Status");
            println!("{}", "-".repeat(68));
            for outcome in &result.outcomes {
                println!(
                    "{:<8} {:<28} {:<14} {:?}",
                    outcome.field.to_string(),
                    TextUtils::truncate(&outcome.label, 26),
                    outcome.category.map(|category| category.as_str()).unwrap_or("-"),
                    outcome.status
                );
            }

            if show_values {
                println!("\nWritten values:");
                for outcome in &result.outcomes {
                    if let Ok(field) = page.field(outcome.field) {
                        if !field.value.is_empty() {
                            println!("  {:<28} {}", TextUtils::truncate(&outcome.label, 26), field.value);
                        }
                    }
                }
            }
        }
    }

    if output.is_some() || format.is_some() {
        let export_format = resolve_format(format, app)?;
        let stats = app.export_fill_result(&result, output.as_deref(), export_format).await?;
        println!(
            "\nReport exported to {} in {}",
            stats.file_path,
            format_duration(std::time::Duration::from_millis(stats.export_duration_ms))
        );
    }

    Ok(())
}

fn show_policy(app: &FormFillStudio) -> Result<()> {
    println!("{}", app.policy().to_yaml()?);
    Ok(())
}

async fn validate_policy(policy_file: String) -> Result<()> {
    let loaded = DetectionPolicy::load_from_file(&policy_file)
        .await
        .and_then(|policy| policy.validate().map(|_| policy));

    match loaded {
        Ok(policy) => {
            println!(
                "Policy file is valid: {} form keywords, {} category rules.",
                policy.form_keywords.len(),
                policy.categories.len()
            );
        }
        Err(e) => {
            error!("Policy validation failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn resolve_format(format: Option<OutputFormat>, app: &FormFillStudio) -> Result<ExportFormat> {
    match format {
        Some(format) => Ok(convert_format(format)),
        None => ExportFormat::from_str(&app.config().export.default_format),
    }
}

fn convert_format(format: OutputFormat) -> ExportFormat {
    match format {
        OutputFormat::Json => ExportFormat::Json,
        OutputFormat::Csv => ExportFormat::Csv,
    }
}
