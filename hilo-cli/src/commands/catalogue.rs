use super::format_number;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::PathBuf;

pub fn list_catalogue(config: &CliConfig, file: Option<PathBuf>) -> anyhow::Result<()> {
    let catalogue = config.catalogue(file.as_deref())?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Term", "Monthly searches"]);

    for (i, item) in catalogue.items().iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            item.label.clone(),
            format_number(item.metric),
        ]);
    }

    println!("{}", table);
    println!("{} terms", catalogue.len());
    Ok(())
}
