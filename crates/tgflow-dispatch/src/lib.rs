//! Message routing: command, then literal text, then conversation state.

pub mod command;
pub mod context;
pub mod engine;
pub mod error;
pub mod load;
pub mod registry;
pub mod types;

pub use command::{parse_command, ParsedCommand};
pub use context::InteractionContext;
pub use engine::{Dispatcher, DispatcherBuilder, HandlerModule};
pub use error::RegistrationError;
pub use load::LazyDispatcher;
pub use registry::HandlerRegistry;
pub use types::{CommandInfo, DispatchOutcome, Handler, HandlerEntry, HandlerResult, Strategy};
