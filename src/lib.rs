pub use crate::errors::{HarnessError, HarnessResult};
pub use crate::outcome::{OutcomeTally, TestOutcome};
pub use crate::directory::{RunConfig, TestDirectory};

pub mod annotation;
pub mod artifacts;
pub mod assembly;
pub mod builder;
pub mod cli;
pub mod directory;
pub mod errors;
pub mod fixture;
pub mod interrupt;
pub mod invoke;
pub mod logging;
pub mod outcome;
pub mod report;
pub mod toolchain;
