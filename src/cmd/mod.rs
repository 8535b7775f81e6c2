// ============================================================================
// src/cmd/mod.rs – command subsystem root
// ============================================================================
pub mod base; // external process runner (Cmd)
pub mod vault; // create / destroy / lock / unlock action lists

// Re-export common types for convenience:
pub use base::Cmd;
pub use vault::{build_command, VaultContext, VaultOptions};
