//! Jack compiler CLI.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "jackc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Jack compiler - compile .jack files to VM code", long_about = None)]
struct Cli {
    /// Input .jack file, or a directory of .jack files
    #[arg(long)]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jackc=warn".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(input = %cli.input.display(), "compiling");

    match jackc::compile_path(&cli.input) {
        Ok(outputs) => {
            for out in outputs {
                println!("Compiled {}", out.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
