// Paw Agent Engine
// Chain-facing code. Each submodule talks to one kind of venue.

pub mod dex;
