//! extern-gen CLI
//!
//! Usage:
//!   extern-gen [OPTIONS] <SWITCH_INFO> <SWITCH_DIR> <TEMPLATES_DIR> <TESTDATA_DIR> <SW_DIR>
//!
//! Options:
//!   --base_address <ADDR>  Switch base address (default 0x44020000)
//!   -c, --catalog <FILE>   Extern type catalog (TOML format)
//!   --strict               Fail on placeholders left after substitution
//!   -v, --verbose          Verbosity level (repeatable)
//!   -h, --help             Print help

use std::path::PathBuf;

use clap::Parser;

use extern_gen::parser::parse_int_literal;
use extern_gen::{generate, write_outputs, GenError, GenerateConfig, TypeCatalog};

#[derive(Parser)]
#[command(name = "extern-gen")]
#[command(about = "Generate register interface HDL for P4 switch externs")]
struct Cli {
    /// Switch description JSON produced by the P4 compiler
    switch_info: PathBuf,

    /// Switch hardware definition directory, named after the switch
    switch_dir: PathBuf,

    /// Directory holding the extern templates
    templates_dir: PathBuf,

    /// Directory receiving the extern defines for simulation
    testdata_dir: PathBuf,

    /// Software directory; the extern defines are also written to its CLI/
    sw_dir: PathBuf,

    /// Switch base address (0x, 0o and 0b prefixes accepted)
    #[arg(
        long = "base_address",
        alias = "base-address",
        default_value = "0x44020000",
        value_parser = parse_address
    )]
    base_address: u64,

    /// Extern type catalog (TOML format)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Fail on placeholders left after substitution
    #[arg(long)]
    strict: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_address(s: &str) -> Result<u64, String> {
    parse_int_literal(s).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let catalog = match &cli.catalog {
        Some(path) => match TypeCatalog::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading catalog '{}':\n{}", path.display(), e.report());
                std::process::exit(1);
            }
        },
        None => TypeCatalog::default(),
    };

    let config = GenerateConfig::new(&cli.switch_info, &cli.switch_dir, &cli.templates_dir)
        .with_base_address(cli.base_address)
        .with_catalog(catalog)
        .with_strict(cli.strict);

    if let Err(e) = run(&config, &cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &GenerateConfig, cli: &Cli) -> Result<(), GenError> {
    let generated = generate(config)?;
    for path in write_outputs(&generated, &cli.testdata_dir, &cli.sw_dir)? {
        println!("{}", path.display());
    }
    Ok(())
}
