use std::path::PathBuf;

use console::style;
use karozu::prompt::parse_data_pairs;
use karozu::props::PropertyValues;
use karozu::watch::{recompile, watch, WatchOptions};
use miette::Result;

pub fn run(path: String, data: Vec<String>, output: String) -> Result<()> {
    let extension_dir = PathBuf::from(path);
    let values: PropertyValues = parse_data_pairs(&data).into_iter().collect();

    // Compile once up front so a broken starting state is visible immediately.
    match recompile(&extension_dir, &values, &output) {
        Ok(out) => println!(
            "{} Initial compile written to {}",
            style("✓").green().bold(),
            style(out.display()).cyan()
        ),
        Err(e) => eprintln!(
            "{} Initial compile failed: {:?}",
            style("✗").red().bold(),
            miette::Report::new(e)
        ),
    }

    watch(WatchOptions {
        extension_dir,
        values,
        output_file_name: output,
    })?;

    println!("{}", style("Watcher stopped.").dim());
    Ok(())
}
