//! Information channels: the typed text sources a perception cycle reads from.
//!
//! A channel couples a [`ChannelType`] tag with a restartable [`LineSource`].
//! Channels are registered in an [`InfoChannelBase`], which groups them by type
//! so that every channel of a given type can be scanned with a single batch of
//! text queries.

pub mod base;
pub mod definition;
pub mod source;
pub mod types;

pub use base::{InfoChannel, InfoChannelBase};
pub use definition::{ChannelDefinition, ChannelDefinitionError};
pub use source::{EnvironmentSource, FileSource, LineSource, TextSource};
pub use types::{ChannelType, ChannelTypeParseError};
