use clap::{Parser, Subcommand};
use repo_clusters::algo::dedup::Scope;
use repo_clusters::algo::engine::ClusterConfig;
use repo_clusters::algo::filter::FilterConfig;
use repo_clusters::algo::stopwords::{self, StopwordSet};
use repo_clusters::{logging, ops};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "repo-clusters",
    version,
    about = "Topic clustering for institutional code repository catalogs"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign every repository a topic cluster and label the clusters
    Cluster {
        /// Input document
        #[arg(short, long)]
        input: PathBuf,
        /// Output document
        #[arg(short, long)]
        output: PathBuf,
        /// Requested number of clusters (capped at the repository count)
        #[arg(short, default_value_t = 15)]
        k: usize,
        /// Random seed for centroid initialization
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Maximum k-means iterations
        #[arg(long, default_value_t = 300)]
        max_iter: usize,
        /// Number of seedings; the tightest partition wins
        #[arg(long, default_value_t = 1)]
        n_init: usize,
        /// Stopword artifact (JSON)
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Remove repeated (name, url) repositories
    Dedup {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Which passes to run
        #[arg(long, value_enum, default_value_t = Scope::Both)]
        scope: Scope,
    },
    /// Drop off-topic and misattributed repositories
    Filter {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Keep descriptions in any language
        #[arg(long)]
        any_language: bool,
        /// Also drop tutorials, templates and similar boilerplate
        #[arg(long)]
        boilerplate: bool,
        /// Also drop repositories without stars
        #[arg(long)]
        require_stars: bool,
        /// Stopword artifact (JSON)
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Print the stopword artifact
    Stopwords {
        /// Print the artifact the other commands would use instead of the embedded one
        #[arg(long)]
        resolved: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> repo_clusters::Result<()> {
    match command {
        Commands::Cluster {
            input,
            output,
            k,
            seed,
            max_iter,
            n_init,
            stopwords,
        } => {
            let set = load_stopword_set(stopwords.as_deref())?;
            let config = ClusterConfig {
                k,
                seed,
                max_iter,
                n_init: n_init.max(1),
                ..Default::default()
            };
            match ops::run_cluster(&input, &output, &set, &config)? {
                Some(summary) => print_json(&summary),
                None => print_json(&serde_json::json!({ "repositories": 0, "written": false })),
            }
        }
        Commands::Dedup {
            input,
            output,
            scope,
        } => {
            let report = ops::run_dedup(&input, &output, scope)?;
            print_json(&report);
        }
        Commands::Filter {
            input,
            output,
            any_language,
            boilerplate,
            require_stars,
            stopwords,
        } => {
            let set = load_stopword_set(stopwords.as_deref())?;
            let config = FilterConfig {
                language: !any_language,
                boilerplate,
                require_stars,
                ..Default::default()
            };
            let report = ops::run_filter(&input, &output, &set, &config)?;
            print_json(&report);
        }
        Commands::Stopwords { resolved } => {
            if resolved {
                let file = stopwords::default_stopword_file();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&file).unwrap_or_default()
                );
            } else {
                print!("{}", stopwords::embedded_default_json());
            }
        }
    }
    Ok(())
}

fn load_stopword_set(path: Option<&Path>) -> repo_clusters::Result<StopwordSet> {
    let file = stopwords::resolve_stopword_file(path)?;
    let set = StopwordSet::from_file(&file);
    tracing::debug!(version = set.version(), words = set.word_count(), "stopwords loaded");
    Ok(set)
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string(value).unwrap_or_default());
}
