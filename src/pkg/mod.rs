// Purpose: Package catalog module root: cache location/locking and the short-name catalog.
// Inputs/Outputs: Re-exports catalog components used by the CLI and the import resolver.
// Invariants: The resolver only sees the ModuleLookup trait, never the store.
// Gotchas: Avoid depending on synth from here; synth depends on pkg, not the reverse.

pub mod cache;
pub mod catalog;
