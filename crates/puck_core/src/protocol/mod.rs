//! Motion controller wire protocol
//!
//! One ASCII frame per move: `M` + 4-digit x + 4-digit y + `\r\n`, both
//! coordinates in the controller's native range.

pub mod command;

pub use command::{CommandEncoder, MoveCommand, FRAME_LEN};
