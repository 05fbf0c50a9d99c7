use anyhow::Result;

use paramstore::load_table;

use super::cli::PathArgs;

pub fn exec(paths: PathArgs, json: bool) -> Result<()> {
    let cfg = paths.into_config();
    let startup = load_table(&cfg)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&startup.table)?);
        return Ok(());
    }

    eprintln!(
        "defaults: {}, persisted: {}, merged: {}",
        startup.defaults_count,
        startup
            .persisted_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "none".to_string()),
        startup.table.len()
    );
    if startup.table.is_empty() {
        println!("(no parameters)");
    } else {
        print!("{}", startup.table.to_yaml_string()?);
    }
    Ok(())
}
