//! Hack assembler CLI.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "hackasm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hack assembler - translate .asm files to 16-bit binary", long_about = None)]
struct Cli {
    /// Input .asm source file
    #[arg(long)]
    src: PathBuf,

    /// Output .hack binary file
    #[arg(long)]
    out: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hackasm=warn".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(src = %cli.src.display(), out = %cli.out.display(), "assembling");

    match hackasm::assemble_file(&cli.src, &cli.out) {
        Ok(()) => {
            println!("Assembled {} -> {}", cli.src.display(), cli.out.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
