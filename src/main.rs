// Purpose: Binary entry point for the expression runner.
// Inputs/Outputs: Reads process args and exits with the code returned by the CLI dispatcher.
// Invariants: Main must not bypass centralized CLI argument/diagnostic handling.
// Gotchas: Any flag or mode change belongs in cli/mod.rs, not this shim.

fn main() {
    let code = grun::cli::run_cli(std::env::args().skip(1));
    std::process::exit(code);
}
