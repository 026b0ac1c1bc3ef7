//! Running the program when the product owner asks for a test.

pub mod model;
pub mod process;

pub use model::ModelTestRunner;
pub use process::ProcessTestRunner;

use async_trait::async_trait;

use crate::program::ProgramStore;

/// Executes or inspects the current program and reports in plain text.
///
/// Never fails: crashes, timeouts and launch errors are part of the report
/// the product owner reads.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run(&self, program: &ProgramStore) -> String;
}
