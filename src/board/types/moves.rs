//! Move type with a compact integer encoding.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::square::Square;
use crate::board::error::MoveParseError;

/// Promotion target of a move, `None` for ordinary moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Promotion {
    None,
    Rook,
    Knight,
    Bishop,
    Queen,
}

impl Promotion {
    /// Index used in the move hash (0-4).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        match self {
            Promotion::None => 0,
            Promotion::Rook => 1,
            Promotion::Knight => 2,
            Promotion::Bishop => 3,
            Promotion::Queen => 4,
        }
    }

    /// Inverse of [`Promotion::index`].
    #[must_use]
    pub const fn from_index(idx: u16) -> Option<Self> {
        match idx {
            0 => Some(Promotion::None),
            1 => Some(Promotion::Rook),
            2 => Some(Promotion::Knight),
            3 => Some(Promotion::Bishop),
            4 => Some(Promotion::Queen),
            _ => None,
        }
    }

    /// UCI suffix letter, if any.
    #[must_use]
    pub const fn to_char(self) -> Option<char> {
        match self {
            Promotion::None => None,
            Promotion::Rook => Some('r'),
            Promotion::Knight => Some('n'),
            Promotion::Bishop => Some('b'),
            Promotion::Queen => Some('q'),
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(Promotion::Rook),
            'n' => Some(Promotion::Knight),
            'b' => Some(Promotion::Bishop),
            'q' => Some(Promotion::Queen),
            _ => None,
        }
    }
}

/// Upper bound (inclusive) of the move hash range.
pub const MAX_MOVE_HASH: u16 = (4 * 64 + 63) * 64 + 63; // 20479

/// A chess move in coordinate notation: source square, destination
/// square and an optional promotion piece.
///
/// The canonical hash packs the three fields bijectively:
///
/// ```text
/// hash = (promotion_index * 64 + from_hash) * 64 + to_hash
/// ```
///
/// which stays within `0..=20479`, so every move persists losslessly as
/// a 16-bit signed integer. Equality and ordering are by hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Promotion,
}

impl Move {
    /// Create a move without promotion.
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: Promotion::None,
        }
    }

    /// Create a promotion move.
    #[must_use]
    pub const fn promoting(from: Square, to: Square, promotion: Promotion) -> Self {
        Move {
            from,
            to,
            promotion,
        }
    }

    /// Source square.
    #[inline]
    #[must_use]
    pub const fn from(self) -> Square {
        self.from
    }

    /// Destination square.
    #[inline]
    #[must_use]
    pub const fn to(self) -> Square {
        self.to
    }

    /// Promotion target, `Promotion::None` for ordinary moves.
    #[inline]
    #[must_use]
    pub const fn promotion(self) -> Promotion {
        self.promotion
    }

    /// Canonical hash in `0..=MAX_MOVE_HASH`.
    #[inline]
    #[must_use]
    pub const fn hash(self) -> u16 {
        (self.promotion.index() * 64 + self.from.hash() as u16) * 64 + self.to.hash() as u16
    }

    /// Inverse of [`Move::hash`]. `None` when the value is outside the
    /// encodable range.
    #[must_use]
    pub fn from_hash(hash: u16) -> Option<Self> {
        if hash > MAX_MOVE_HASH {
            return None;
        }
        let to = Square::from_hash_unchecked((hash % 64) as u8);
        let rest = hash / 64;
        let from = Square::from_hash_unchecked((rest % 64) as u8);
        let promotion = Promotion::from_index(rest / 64)?;
        Some(Move {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(c) = self.promotion.to_char() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl PartialOrd for Move {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Move {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.hash().cmp(&other.hash())
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if !(4..=5).contains(&len) || !s.is_ascii() {
            return Err(MoveParseError::InvalidLength { len });
        }

        let from: Square = s[0..2].parse().map_err(|_| MoveParseError::InvalidSquare {
            notation: s.to_string(),
        })?;
        let to: Square = s[2..4].parse().map_err(|_| MoveParseError::InvalidSquare {
            notation: s.to_string(),
        })?;

        let promotion = match s[4..].chars().next() {
            None => Promotion::None,
            Some(c) => {
                Promotion::from_char(c).ok_or(MoveParseError::InvalidPromotion { char: c })?
            }
        };

        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_round_trips_over_full_range() {
        for h in 0u16..=MAX_MOVE_HASH {
            let mv = Move::from_hash(h).expect("hash in range must decode");
            assert_eq!(mv.hash(), h);
        }
        assert!(Move::from_hash(MAX_MOVE_HASH + 1).is_none());
    }

    #[test]
    fn hash_fits_in_i16() {
        assert!(i16::try_from(MAX_MOVE_HASH).is_ok());
    }

    #[test]
    fn parses_plain_and_promotion_moves() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.from().to_string(), "e2");
        assert_eq!(mv.to().to_string(), "e4");
        assert_eq!(mv.promotion(), Promotion::None);

        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv.promotion(), Promotion::Queen);
        assert_eq!(mv.to_string(), "e7e8q");
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("e2".parse::<Move>().is_err());
        assert!("e2e4qq".parse::<Move>().is_err());
        assert!("e2e9".parse::<Move>().is_err());
        assert!("e7e8k".parse::<Move>().is_err());
    }

    proptest! {
        /// Property: text form round-trips for every encodable move.
        #[test]
        fn prop_text_round_trip(hash in 0u16..=MAX_MOVE_HASH) {
            let mv = Move::from_hash(hash).unwrap();
            let parsed: Move = mv.to_string().parse().unwrap();
            prop_assert_eq!(parsed, mv);
        }

        /// Property: the hash is injective over (from, to, promotion).
        #[test]
        fn prop_hash_is_injective(a in 0u16..=MAX_MOVE_HASH, b in 0u16..=MAX_MOVE_HASH) {
            let ma = Move::from_hash(a).unwrap();
            let mb = Move::from_hash(b).unwrap();
            prop_assert_eq!(a == b, ma == mb);
        }
    }
}
