use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use transitives::{
    ReferenceSet, Sentence, Treebank, check, find_transitive_linear, find_transitive_tree,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "transitives", about = "Find transitive clauses in CoNLL-U treebanks")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every match found by one method
    Extract {
        /// CoNLL-U file (plain or .gz)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Method::Tree)]
        method: Method,
    },
    /// Check both methods against a reference set
    Check {
        /// CoNLL-U file (plain or .gz)
        file: PathBuf,
        /// Reference set (JSON)
        #[arg(short, long)]
        reference: PathBuf,
    },
    /// Write the matches of both methods as a reference set
    Export {
        /// CoNLL-U file (plain or .gz)
        file: PathBuf,
        /// Where to write the reference set (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Adjacent NOUN VERB NOUN tags
    Linear,
    /// VERB head with NOUN nsubj and obj dependents
    Tree,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract { file, method } => extract(&load(&file)?, method),
        Commands::Check { file, reference } => {
            let reference = ReferenceSet::load(&reference)
                .with_context(|| format!("loading reference set {}", reference.display()))?;
            let outcome = check(&load(&file)?, &reference, &mut std::io::stdout().lock())?;
            debug!(?outcome, "Check finished");
            Ok(())
        }
        Commands::Export { file, output } => {
            let reference = ReferenceSet::from_sentences(&load(&file)?);
            reference.save(&output)?;
            info!(
                linear = reference.linear.len(),
                tree = reference.tree.len(),
                "Wrote {}",
                output.display()
            );
            Ok(())
        }
    }
}

fn load(file: &Path) -> Result<Vec<Sentence>> {
    let sentences = Treebank::from_file(file)
        .load()
        .with_context(|| format!("reading treebank {}", file.display()))?;
    debug!("Loaded {} sentences from {}", sentences.len(), file.display());
    Ok(sentences)
}

fn extract(sentences: &[Sentence], method: Method) -> Result<()> {
    for sentence in sentences {
        let text = sentence.text.as_deref().unwrap_or_default();
        let matches = match method {
            Method::Linear => find_transitive_linear(sentence),
            Method::Tree => {
                let tree = sentence
                    .to_tree()
                    .with_context(|| format!("building tree for: {}", text))?;
                find_transitive_tree(&tree)
            }
        };
        for clause in matches {
            let (pred, subj, obj) = clause.forms();
            println!("{}\t{}\t{}\t{}", pred, subj, obj, text);
        }
    }
    Ok(())
}
