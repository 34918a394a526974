use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "karozu",
    about = "Compile declarative scaffolding extensions into installer-ready file operations",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile an extension with a set of property values
    Compile {
        /// Extension directory containing karozu.toml (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Set property values (can be repeated: -d key=value)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Use default values without prompting
        #[arg(long)]
        defaults: bool,

        /// Never prompt; unset properties are reported as errors
        #[arg(long)]
        no_input: bool,

        /// Write the compilation result as JSON to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Print the compilation result as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Show rendered file contents in the summary
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate an extension manifest
    Check {
        /// Path to the extension to check (default: current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Recompile an extension whenever its manifest or templates change
    Watch {
        /// Extension directory to watch (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Set property values (can be repeated: -d key=value)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// File name for the compiled output, written next to karozu.toml
        #[arg(short, long, default_value = karozu::watch::DEFAULT_OUTPUT_FILE)]
        output: String,
    },
}
