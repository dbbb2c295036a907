// In-memory state that survives between cycles.

pub mod snapshot;
