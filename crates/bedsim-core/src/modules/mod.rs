pub mod budget;
pub mod conversion;
pub mod engine;
pub mod form;
pub mod history;
pub mod recovery;
pub mod regimen;
pub mod serialization;
pub mod solver;
pub mod traits;
pub mod vx;

pub use engine::recompute;
pub use form::FormFields;
pub use traits::{HistoryRecorder, HistoryStore};
