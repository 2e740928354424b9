// Purpose: Define crate-level module surface for the synthesizer and its collaborators.
// Inputs/Outputs: Exposes synth/pkg/toolchain modules for the binary and tests.
// Invariants: synth stays free of I/O; catalog and process handling live in pkg and toolchain.
// Gotchas: Keep module wiring consistent with src/main.rs entry path.

pub mod cli;
pub mod config;
pub mod error;
pub mod pkg;
pub mod synth;
pub mod toolchain;
