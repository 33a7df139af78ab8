mod agent;
pub mod callbacks;
mod error;
pub mod llm;
pub mod team;
pub mod tools;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use agent::{Agent, AgentBuilder, NoPendingToolCalls, StopCondition};
pub use team::{SelectorTeam, SelectorTeamBuilder, TeamResult};
