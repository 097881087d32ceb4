use crate::cli::ScorerArg;
use crate::support::{
    emit_error, load_search_config_or_exit, load_table_options_or_exit, load_table_or_exit,
    print_json, yes_no,
};
use pinduct_kernel::{Backend, Scorer, induce};
use pinduct_tabular::{LabelDensity, TargetMean, parse_label};
use serde_json::json;

pub struct Args {
    pub data: String,
    pub target: String,
    pub positive: String,
    pub scorer: ScorerArg,
    pub config: Option<String>,
    pub threshold: Option<f64>,
    pub conditional_threshold: Option<f64>,
    pub max_iters: Option<usize>,
    pub columns: Option<Vec<String>>,
    pub bins: Option<usize>,
    pub sequential: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let mut options = load_table_options_or_exit(args.config.as_deref());
    if let Some(columns) = args.columns {
        options.columns = Some(columns);
    }
    if let Some(bins) = args.bins {
        options.num_bins = bins;
        options.points_per_bin = None;
    }

    let mut config = load_search_config_or_exit(args.config.as_deref());
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(conditional_threshold) = args.conditional_threshold {
        config.conditional_threshold = conditional_threshold;
    }
    if let Some(max_iters) = args.max_iters {
        config.max_iters = max_iters;
    }
    if args.sequential {
        config.parallel = false;
    }
    config.validate().unwrap_or_else(|e| emit_error(e));

    let table = load_table_or_exit(&args.data, Some(args.target.as_str()), &options);
    let scorer: Box<dyn Scorer> = match args.scorer {
        ScorerArg::Density => Box::new(
            LabelDensity::new(&table, &parse_label(&args.positive))
                .unwrap_or_else(|e| emit_error(e)),
        ),
        ScorerArg::Mean => Box::new(TargetMean::new(&table).unwrap_or_else(|e| emit_error(e))),
    };

    tracing::debug!(
        data = %args.data,
        records = table.record_count(),
        dimensions = table.dimensions().len(),
        scorer = ?args.scorer,
        "table loaded"
    );

    let outcome = induce(&table, scorer.as_ref(), config.clone())
        .unwrap_or_else(|e| emit_error(format!("search failed: {e}")));

    tracing::debug!(
        predicates = outcome.len(),
        sweeps = outcome.sweeps,
        termination = ?outcome.termination,
        "search complete"
    );

    if args.json {
        let predicates: Vec<serde_json::Value> = outcome
            .predicates
            .iter()
            .map(|entry| {
                json!({
                    "region": entry.predicate.describe(&table),
                    "constraints": entry.predicate,
                    "score": entry.score,
                    "support": entry.support,
                    "provenance": entry.provenance,
                    "fingerprint": entry.fingerprint,
                })
            })
            .collect();
        let payload = json!({
            "data": args.data,
            "target": args.target,
            "records": table.record_count(),
            "dimensions": table.dimensions(),
            "config": config,
            "termination": outcome.termination,
            "complete": outcome.is_complete(),
            "sweeps": outcome.sweeps,
            "accepted_count": outcome.accepted,
            "conditionally_accepted_count": outcome.conditionally_accepted,
            "residual_count": outcome.residual,
            "rejected_count": outcome.rejected.len(),
            "predicates": predicates,
        });
        print_json(&payload);
    } else {
        println!("pinduct search {} --target {}", args.data, args.target);
        println!("  Records: {}", table.record_count());
        println!("  Dimensions: {}", table.dimensions().len());
        println!(
            "  Sweeps: {} ({:?}, complete: {})",
            outcome.sweeps,
            outcome.termination,
            yes_no(outcome.is_complete())
        );
        println!(
            "  Accepted: {}  Conditional: {}  Rejected: {}",
            outcome.accepted,
            outcome.conditionally_accepted,
            outcome.rejected.len()
        );
        if outcome.is_empty() {
            println!("  No predicates found.");
        } else {
            println!("  Predicates:");
            for entry in &outcome.predicates {
                println!(
                    "    - {} score={:.4} support={} [{}]",
                    entry.predicate.describe(&table),
                    entry.score,
                    entry.support,
                    entry.provenance
                );
            }
        }
    }
}
