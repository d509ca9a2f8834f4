//! Build mode: per-player sessions, the tick-driven preview pipeline and the
//! server-side placement commands.
//!
//! The client only ever reports pose and intent (select, rotate, place,
//! delete). Everything that costs money or mutates plot state is validated
//! server-side in [`handlers`], against the live cached plot record, at the
//! moment of the command.

pub mod commands;
pub mod handlers;
pub mod preview;
pub mod session;

pub use commands::BuildCommand;
pub use session::{BuildMode, BuildSession};
