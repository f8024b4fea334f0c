//! Ordering of collected occurrences.

use crate::search::Match;
use crate::util::ScreenMatchError;

/// Ranking rule applied to the union of occurrences of one element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisposalPolicy {
    /// Highest similarity first.
    #[default]
    Confidence,
    /// Top of the screen first.
    Vertical,
    /// Left of the screen first.
    Horizontal,
}

impl DisposalPolicy {
    /// Stable-sorts `matches` in place.
    pub fn sort(self, matches: &mut [Match]) {
        match self {
            Self::Confidence => matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity)),
            Self::Vertical => matches.sort_by_key(|m| m.center_y),
            Self::Horizontal => matches.sort_by_key(|m| m.center_x),
        }
    }

    /// Numeric code used by configuration files.
    pub fn code(self) -> u8 {
        match self {
            Self::Confidence => 0,
            Self::Vertical => 1,
            Self::Horizontal => 2,
        }
    }
}

impl TryFrom<u8> for DisposalPolicy {
    type Error = ScreenMatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Confidence),
            1 => Ok(Self::Vertical),
            2 => Ok(Self::Horizontal),
            _ => Err(ScreenMatchError::InvalidDisposal { value }),
        }
    }
}
