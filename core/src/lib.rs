pub mod board;
pub mod encoding;
pub mod error;
pub mod history;
pub mod move_gen;
pub mod perft;
pub mod position;
pub mod rules;
pub mod terminal;
pub mod types;

pub use board::*;
pub use encoding::{decode, encode};
pub use error::*;
pub use history::{History, HistoryEntry};
pub use move_gen::{generate_legal_moves, is_checkmate, is_legal, is_stalemate, MoveList};
pub use perft::{perft, perft_detailed, perft_divide, PerftResults};
pub use position::Position;
pub use rules::{Disposition, RuleSet};
pub use terminal::{classify, is_bare_kings, terminal, GameOutcome, Termination, FIFTY_MOVE_PLIES};
pub use types::*;
