//! Domain models for Keeper.
//!
//! - [`Attributes`]: named request parameters for a command (a JSON object).
//! - [`CommandExample`] / [`CommandInfo`]: self-description of a catalog entry.
//! - [`CommitSummary`]: one entry of a project's history.
//! - [`Mutation`]: a logical change to a project's working tree.

mod command;
mod commit;
mod mutation;

pub use command::*;
pub use commit::*;
pub use mutation::*;
