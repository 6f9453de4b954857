//! VM translator CLI.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "hackvm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "VM translator - translate .vm files or directories to Hack assembly",
    long_about = None
)]
struct Cli {
    /// Input .vm file, or a directory of .vm files (directory mode adds
    /// the bootstrap and links everything into one .asm)
    #[arg(long)]
    src: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hackvm=warn".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(src = %cli.src.display(), "translating");

    let result = if cli.src.is_dir() {
        hackvm::translate_dir(&cli.src)
    } else {
        hackvm::translate_file(&cli.src)
    };

    match result {
        Ok(out) => {
            println!("Translated {} -> {}", cli.src.display(), out.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
