use pinduct_kernel::SearchConfig;
use pinduct_tabular::{Table, TableOptions};
use std::fmt::Display;

pub fn emit_error(message: impl Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn print_json(payload: &serde_json::Value) {
    let rendered = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|err| emit_error(format!("failed to render json output: {err}")));
    println!("{rendered}");
}

pub fn load_search_config_or_exit(path: Option<&str>) -> SearchConfig {
    match path {
        Some(path) => SearchConfig::from_toml_path(path)
            .unwrap_or_else(|e| emit_error(format!("failed to load config {path}: {e}"))),
        None => SearchConfig::default(),
    }
}

pub fn load_table_options_or_exit(path: Option<&str>) -> TableOptions {
    match path {
        Some(path) => TableOptions::from_toml_path(path)
            .unwrap_or_else(|e| emit_error(format!("failed to load config {path}: {e}"))),
        None => TableOptions::default(),
    }
}

pub fn load_table_or_exit(data: &str, target: Option<&str>, options: &TableOptions) -> Table {
    Table::load(data, target, options)
        .unwrap_or_else(|e| emit_error(format!("failed to load {data}: {e}")))
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
