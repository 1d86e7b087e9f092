// Reader state managers
// Managers own in-memory state that the rest of the core mutates.

pub mod tab_registry;
