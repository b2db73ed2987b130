//! Configuration, grounded query engine, and the session loop that ties
//! document uploads to answers.

pub mod app;
pub mod bootstrap;
pub mod channel;
pub mod config;
pub mod query;
pub mod secret;
pub mod session;

pub use app::App;
pub use channel::{Attachment, Channel, ChannelError, ChannelMessage};
pub use config::{Config, ConfigError};
pub use query::{QueryEngine, QueryError, QueryResult};
pub use session::{SessionContext, SessionError, SessionState, UploadOutcome};
