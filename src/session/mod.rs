// Session layer: interaction state and the controller that drives it

pub mod controller;
pub mod state;

pub use controller::{RecommendationController, RecommendationSnapshot};
pub use state::{InteractionState, ViewStatus, SUGGESTED_THEMES};
