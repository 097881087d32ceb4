use crate::support::{load_table_options_or_exit, load_table_or_exit, print_json};
use serde_json::json;

pub fn run(data: String, target: Option<String>, config: Option<String>, json_output: bool) {
    let options = load_table_options_or_exit(config.as_deref());
    let table = load_table_or_exit(&data, target.as_deref(), &options);
    let summary = table.summary();
    tracing::debug!(
        data = %data,
        records = table.len(),
        dimensions = summary.len(),
        "table loaded"
    );

    if json_output {
        let payload = json!({
            "data": data,
            "records": table.len(),
            "target": table.target(),
            "dimensions": summary,
        });
        print_json(&payload);
    } else {
        println!("pinduct inspect {data}");
        println!("  Records: {}", table.len());
        if let Some(target) = table.target() {
            println!("  Target: {target}");
        }
        println!("  Dimensions ({}):", summary.len());
        for column in &summary {
            println!(
                "    - {} ({}, {:?}): {} values, {} missing",
                column.name, column.column_type, column.kind, column.values, column.missing
            );
        }
    }
}
