use crate::support::{
    emit_error, load_search_config_or_exit, load_table_options_or_exit, print_json,
};
use serde_json::json;

pub fn run(config: String, json_output: bool) {
    let search = load_search_config_or_exit(Some(config.as_str()));
    let table = load_table_options_or_exit(Some(config.as_str()));

    let errors: Vec<String> = [
        search.validate().err().map(|e| e.to_string()),
        table.validate().err().map(|e| e.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    if json_output {
        let payload = json!({
            "config": config,
            "valid": errors.is_empty(),
            "errors": errors,
            "search": search,
            "table": table,
        });
        print_json(&payload);
        if !errors.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    if let Some(first) = errors.first() {
        emit_error(format!("{config}: {first}"));
    }
    println!("pinduct check-config {config}");
    println!("  threshold: {}", search.threshold);
    println!("  conditional_threshold: {}", search.conditional_threshold);
    println!("  max_iters: {}", search.max_iters);
    println!("  parallel: {}", search.parallel);
    println!("  num_bins: {}", table.num_bins);
    println!("  valid: yes");
}
