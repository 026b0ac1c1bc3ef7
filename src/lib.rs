//! pairloop: a product owner and a programmer, both language models, build a
//! program together.
//!
//! The two take turns in one shared conversation. The product owner steers
//! and reviews, and can ask for a test run or end the session with a keyword.
//! The programmer answers with Python code blocks that are merged into a
//! running program, one top-level definition at a time. Older code in the
//! history is hidden to keep prompts short.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pairloop::prelude::*;
//!
//! # async fn example() -> pairloop::error::Result<()> {
//! let config = TeamConfig::load(None)?;
//! let provider = create_provider(&config, &ProviderCredentials::from_env())?;
//! let report = Orchestrator::from_config(&config, Arc::from(provider))?
//!     .run()
//!     .await;
//! println!("{}", report.program.render());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod participant;
pub mod prelude;
pub mod program;
pub mod provider;
pub mod tester;
pub mod transcript;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
