//! Standalone peephole pass over an already-generated `.s` file, useful for
//! inspecting what the pass removes without recompiling.

use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: nullc-peephole <input.s> <output.s>");
        process::exit(2);
    }

    let input = &args[1];
    let output = &args[2];

    let asm = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading {input}: {e}");
        process::exit(1);
    });

    let (optimized, removed) = nullc::peephole::optimize(&asm);

    fs::write(output, optimized).unwrap_or_else(|e| {
        eprintln!("Error writing {output}: {e}");
        process::exit(1);
    });

    println!("Removed {removed} no-op instruction pair(s)");
}
