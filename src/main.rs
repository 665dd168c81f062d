//! nullc CLI: compile a `.nc` source file to an executable, or stop early
//! and dump the AST / assembly for inspection.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use nullc::config::CompilerConfig;
use nullc::driver;
use nullc::parser::parse_program;

#[derive(ClapParser)]
#[command(name = "nullc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a small C-like language to AArch64 Darwin assembly", long_about = None)]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Output executable path (defaults to the input filename without its extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the parsed AST and exit without generating code
    #[arg(long)]
    ast: bool,

    /// Print generated assembly and exit without assembling/linking
    #[arg(long)]
    asm: bool,

    /// Keep the intermediate .s file after assembling/linking
    #[arg(long)]
    keep_asm: bool,

    /// Skip the peephole optimization pass
    #[arg(long)]
    no_peephole: bool,

    /// Path to a nullc.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if cli.ast {
        run_ast(&cli.input);
        return;
    }

    let mut config = match &cli.config {
        Some(path) => CompilerConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => CompilerConfig::default(),
    };
    if cli.no_peephole {
        config.peephole = false;
    }
    if cli.keep_asm {
        config.keep_asm = true;
    }

    if cli.asm {
        run_asm(&cli.input, &config);
        return;
    }

    let output = cli.output.unwrap_or_else(|| {
        let stem = cli.input.file_stem().unwrap_or_default();
        PathBuf::from(stem)
    });

    match driver::compile_file(&cli.input, &output, &config) {
        Ok(()) => println!("Compiled {} -> {}", cli.input.display(), output.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_ast(input: &PathBuf) {
    let source = read_input(input);
    match parse_program(&source) {
        Ok(program) => println!("{program:#?}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_asm(input: &PathBuf, config: &CompilerConfig) {
    let source = read_input(input);
    match driver::compile_source(&source) {
        Ok(mut asm) => {
            if config.peephole {
                let (optimized, _removed) = nullc::peephole::optimize(&asm);
                asm = optimized;
            }
            print!("{asm}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn read_input(input: &PathBuf) -> String {
    fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", input.display());
        process::exit(1);
    })
}
