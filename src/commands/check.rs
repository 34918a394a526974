use std::path::Path;

use console::style;
use miette::Result;

use karozu::check::check_manifest;

pub fn run(path: String) -> Result<()> {
    let extension_dir = Path::new(&path);

    println!(
        "{} {}",
        style("Checking extension at").bold(),
        style(extension_dir.display()).cyan()
    );

    let result = check_manifest(extension_dir)?;

    println!("  Name: {}", result.extension_name);
    println!("  Properties: {}", result.property_count);
    println!("  Templates: {}", result.template_count);

    if !result.warnings.is_empty() {
        println!("\n{}", style("Warnings:").yellow().bold());
        for w in &result.warnings {
            println!("  {} {}", style("⚠").yellow(), w);
        }
    }

    if !result.errors.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for e in &result.errors {
            println!("  {} {}", style("✗").red(), e);
        }
        println!(
            "\n{} Extension has {} error(s)",
            style("✗").red().bold(),
            result.errors.len()
        );
        std::process::exit(1);
    } else {
        println!("\n{} Extension is valid!", style("✓").green().bold());
    }

    Ok(())
}
