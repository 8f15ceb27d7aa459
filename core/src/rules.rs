use serde::{Deserialize, Serialize};
use std::fmt;

/// How the AI chooses among searched candidate moves.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Best proven or estimated outcome: win, then draw, then loss.
    #[default]
    Perfect,
    /// Prefers decisive outcomes: win, then loss, then draw.
    Aggressive,
    /// Takes only clear wins, otherwise plays a random non-winning move.
    Cooperative,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Perfect => f.write_str("perfect"),
            Disposition::Aggressive => f.write_str("aggressive"),
            Disposition::Cooperative => f.write_str("cooperative"),
        }
    }
}

/// Rule flags for one game. Immutable once the game starts.
///
/// Every field has a default, so a partial JSON object such as
/// `{"castling": true}` deserializes to the defaults plus that override.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSet {
    /// King and never-moved rook may castle (single-file board).
    pub castling: bool,
    /// Pawns may capture en passant after a double step.
    pub en_passant: bool,
    /// 100 plies without capture or pawn move is a draw.
    pub fifty_move: bool,
    /// The third occurrence of a position is a draw.
    pub threefold: bool,
    /// Pawns reaching the far rank promote.
    pub promotion: bool,
    /// Pawns may advance two ranks from their start rank.
    pub pawn_double_step: bool,
    /// A stalemate is won by the side with strictly more pieces.
    pub material_count_win: bool,
    /// A side wins as soon as one of its pieces stands on the far rank.
    pub race_to_back_rank: bool,
    /// AI disposition; `None` means [`Disposition::Perfect`].
    pub disposition: Option<Disposition>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            castling: false,
            en_passant: true,
            fifty_move: true,
            threefold: true,
            promotion: true,
            pawn_double_step: true,
            material_count_win: false,
            race_to_back_rank: false,
            disposition: None,
        }
    }
}

impl RuleSet {
    /// The disposition to play with, falling back to perfect play.
    pub fn disposition(&self) -> Disposition {
        self.disposition.unwrap_or_default()
    }

    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = Some(disposition);
        self
    }
}
