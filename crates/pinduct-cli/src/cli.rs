use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "pinduct",
    about = "Pinduct: bottom-up predicate induction over tabular records",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for high-scoring region predicates
    Search {
        /// Path to records (JSONL, or CSV when the name ends in .csv)
        #[arg(long)]
        data: String,

        /// Column the scorer reads; never used as a dimension
        #[arg(long)]
        target: String,

        /// Positive label for the density scorer (parsed as JSON when possible)
        #[arg(long, default_value = "true")]
        positive: String,

        /// Scorer over the target column
        #[arg(long, value_enum, default_value_t = ScorerArg::Density)]
        scorer: ScorerArg,

        /// TOML file with `[search]` and `[table]` sections
        #[arg(long)]
        config: Option<String>,

        /// Acceptance threshold (overrides config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Residual rescue threshold (overrides config)
        #[arg(long)]
        conditional_threshold: Option<f64>,

        /// Sweep cap (overrides config)
        #[arg(long)]
        max_iters: Option<usize>,

        /// Comma-separated dimension columns (overrides config)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Bins per numeric column (overrides config)
        #[arg(long)]
        bins: Option<usize>,

        /// Evaluate each sweep on a single thread
        #[arg(long)]
        sequential: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the dimensions a data file yields
    Inspect {
        /// Path to records (JSONL, or CSV when the name ends in .csv)
        #[arg(long)]
        data: String,

        /// Column excluded from dimensions
        #[arg(long)]
        target: Option<String>,

        /// TOML file with a `[table]` section
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file
    CheckConfig {
        /// TOML file with `[search]` and `[table]` sections
        #[arg(long)]
        config: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScorerArg {
    /// Smoothed share of rows whose target equals `--positive`
    #[value(name = "density")]
    Density,
    /// Mean of a numeric target
    #[value(name = "mean")]
    Mean,
}
