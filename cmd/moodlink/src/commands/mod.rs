//! CLI commands module.

mod basis;
mod classify;
mod features;
mod util;

pub use basis::BasisCommand;
pub use classify::ClassifyCommand;
pub use features::FeaturesCommand;

pub(crate) use util::*;
