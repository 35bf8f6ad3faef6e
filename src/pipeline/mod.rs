//! Pipeline entry points for refresh operations.
//!
//! - `reconcile`: pure snapshot-into-state merge
//! - `run_refresh`: the full fetch → extract → reconcile → persist run

pub mod reconcile;
pub mod refresh;

pub use reconcile::reconcile;
pub use refresh::run_refresh;
