// Tauri command modules

pub mod recommendations;
pub mod settings;

// Re-export commonly used items
pub use recommendations::AppState;
