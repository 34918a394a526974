use std::path::{Path, PathBuf};

use console::style;
use karozu::prompt::parse_data_pairs;
use karozu::{CompileOptions, FileOperation};
use miette::Result;

#[allow(clippy::too_many_arguments)]
pub fn run(
    path: String,
    data: Vec<String>,
    defaults: bool,
    no_input: bool,
    output: Option<String>,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let options = CompileOptions {
        extension_dir: PathBuf::from(path),
        data: parse_data_pairs(&data),
        defaults,
        interactive: !no_input,
    };

    let compiled = karozu::plan_compile(options)?;

    for warning in &compiled.warnings {
        eprintln!(
            "{} {}",
            style("warning:").yellow().bold(),
            style(warning).yellow()
        );
    }

    if let Some(out) = &output {
        karozu::write_result(&compiled.result, Path::new(out))?;
    }

    if json {
        println!("{}", compiled.result.to_json()?);
        return Ok(());
    }

    let result = &compiled.result;
    println!(
        "\n{} Compiled {} with {}",
        style("==>").cyan().bold(),
        style(&compiled.extension_name).bold(),
        compiled
            .values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    if !result.dependencies.is_empty() {
        println!("  dependencies:     {}", result.dependencies.join(" "));
    }
    if !result.dev_dependencies.is_empty() {
        println!("  devDependencies:  {}", result.dev_dependencies.join(" "));
    }

    for file in &result.templates {
        let action = file.operation.kind().as_str();
        println!("  {:<6} {}", style(action).green(), file.path);

        if verbose {
            println!("  {}", style("──────").dim());
            match &file.operation {
                FileOperation::Create { template } => print_indented(template),
                FileOperation::Append { content } => print_indented(content),
                FileOperation::Edit { replacements } => {
                    for (i, r) in replacements.iter().enumerate() {
                        println!(
                            "  {}. replace {:?} with {:?}",
                            i + 1,
                            r.old_string,
                            r.new_string
                        );
                    }
                }
                FileOperation::Delete => {}
            }
            println!("  {}", style("──────").dim());
            println!();
        }
    }

    for script in &result.post_install_scripts {
        println!("  {} {}", style("script").magenta(), script.script);
    }
    for command in &result.commands {
        let name = command.name.as_deref().unwrap_or("-");
        println!("  {} {name}: {}", style("command").magenta(), command.command);
    }

    println!(
        "\nSummary: {} file operation(s), {} dependencies, {} dev dependencies",
        result.templates.len(),
        result.dependencies.len(),
        result.dev_dependencies.len()
    );

    if let Some(out) = output {
        println!(
            "\n{} Result written to {}",
            style("✓").green().bold(),
            style(out).cyan()
        );
    }

    Ok(())
}

fn print_indented(text: &str) {
    for line in text.lines() {
        println!("  {}", line);
    }
}
