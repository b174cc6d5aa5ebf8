//! UCI-style line protocol.
//!
//! ## Commands
//!
//! | Command | Response |
//! |---|---|
//! | `uci` | `id name`, `id author`, `uciok` |
//! | `isready` | `readyok` |
//! | `ucinewgame` | resets position and tree |
//! | `position startpos [moves ...]` | replays moves through the tree |
//! | `go` | `bestmove <action>` |
//! | `stop` | repeats the last `bestmove` |
//! | `quit` | saves the apprentice and exits |
//! | `selfplay <N>` | plays N self-play turns, `info string` summary |
//!
//! Failed commands answer `info string error: ...` and the session goes on.

pub mod command;
pub mod session;

pub use command::{Command, CommandError};
pub use session::{Control, ProtocolError, UciSession};
