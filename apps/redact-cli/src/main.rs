//! Redaction CLI
//!
//! Inspect a PDF, burn a list of redactions into it, or black out and
//! underline search terms.

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use redact_core::{
    annotate_search_terms, export_vector, page_sizes, EditorConfig, LopdfCodec, RedactionLog,
    SearchRequest,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "redact")]
#[command(version, about = "Burn opaque redaction rectangles into PDF documents")]
struct Args {
    /// Editor configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print page count and page sizes
    Info {
        /// PDF to inspect
        pdf: PathBuf,
    },
    /// Apply redactions and/or search terms and write the resulting PDF
    #[command(group(
        ArgGroup::new("marks")
            .required(true)
            .multiple(true)
            .args(["redactions", "search"])
    ))]
    Apply {
        /// Source PDF
        pdf: PathBuf,
        /// JSON array of {id, page, coordinates: {x, y, width, height}}
        redactions: Option<PathBuf>,
        /// JSON {search_terms: [{text, color, comment, redact}]}; every match is
        /// blacked out (redact) or underlined with an optional hover comment
        #[arg(short, long)]
        search: Option<PathBuf>,
        /// Output path (default: export.vector_filename from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries command output; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };

    match args.command {
        Command::Info { pdf } => info(&pdf),
        Command::Apply {
            pdf,
            redactions,
            search,
            output,
        } => {
            let output =
                output.unwrap_or_else(|| PathBuf::from(&config.export.vector_filename));
            apply(&pdf, redactions.as_deref(), search.as_deref(), &output).await
        }
    }
}

fn info(pdf: &Path) -> anyhow::Result<()> {
    let bytes = read(pdf)?;
    let sizes = page_sizes(&bytes).with_context(|| format!("Failed to load {}", pdf.display()))?;

    println!("{}: {} pages", pdf.display(), sizes.len());
    for (i, size) in sizes.iter().enumerate() {
        println!("  page {}: {} x {} pt", i + 1, size.width, size.height);
    }
    Ok(())
}

async fn apply(
    pdf: &Path,
    redactions: Option<&Path>,
    search: Option<&Path>,
    output: &Path,
) -> anyhow::Result<()> {
    let mut bytes = read(pdf)?;

    // Search terms run first so they see the original text layout
    if let Some(search) = search {
        let json = std::fs::read_to_string(search)
            .with_context(|| format!("Failed to read {}", search.display()))?;
        let request = SearchRequest::from_json(&json)
            .with_context(|| format!("Invalid search terms in {}", search.display()))?;
        tracing::info!(
            terms = request.search_terms.len(),
            source = %pdf.display(),
            "applying search terms"
        );

        let source = bytes;
        let annotated = tokio::task::spawn_blocking(move || {
            annotate_search_terms(&LopdfCodec, &source, &request.search_terms)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
        })
        .await
        .context("Search task failed")??;
        println!("{} matches", annotated.hits.len());
        bytes = annotated.bytes;
    }

    if let Some(redactions) = redactions {
        let json = std::fs::read_to_string(redactions)
            .with_context(|| format!("Failed to read {}", redactions.display()))?;
        let log = RedactionLog::from_json(&json)
            .with_context(|| format!("Invalid redaction list in {}", redactions.display()))?;
        tracing::info!(redactions = log.len(), source = %pdf.display(), "applying redactions");

        let source = bytes;
        bytes = tokio::task::spawn_blocking(move || {
            export_vector(&LopdfCodec, &source, log.all())
                .map_err(|e| anyhow::anyhow!(e.user_message()))
        })
        .await
        .context("Export task failed")??;
    }

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_apply_with_output() {
        let args = Args::try_parse_from([
            "redact",
            "apply",
            "in.pdf",
            "marks.json",
            "-o",
            "out.pdf",
        ])
        .unwrap();
        match args.command {
            Command::Apply {
                pdf,
                redactions,
                search,
                output,
            } => {
                assert_eq!(pdf, PathBuf::from("in.pdf"));
                assert_eq!(redactions, Some(PathBuf::from("marks.json")));
                assert_eq!(search, None);
                assert_eq!(output, Some(PathBuf::from("out.pdf")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_info_with_global_config() {
        let args =
            Args::try_parse_from(["redact", "info", "doc.pdf", "--config", "redact.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("redact.toml")));
        assert!(matches!(args.command, Command::Info { .. }));
    }

    #[test]
    fn test_apply_requires_redactions_or_search_terms() {
        assert!(Args::try_parse_from(["redact", "apply", "in.pdf"]).is_err());
    }

    #[test]
    fn test_parse_apply_search_only() {
        let args =
            Args::try_parse_from(["redact", "apply", "in.pdf", "--search", "terms.json"]).unwrap();
        match args.command {
            Command::Apply {
                redactions, search, ..
            } => {
                assert_eq!(redactions, None);
                assert_eq!(search, Some(PathBuf::from("terms.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
