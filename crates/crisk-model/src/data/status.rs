use serde::{Deserialize, Serialize};

/// Observed outcome of a subject.
///
/// Encoded as `0` (censored), `1` (event of interest) and `2` (competing
/// event). Which non-censored status is the cause of interest is decided per
/// run, so the predicates below take the cause as an argument.
///
/// ```
/// use crisk_model::Status;
///
/// let cause = Status::Event;
/// assert!(Status::Event.is_cause(cause));
/// assert!(Status::Competing.is_competing(cause));
/// assert!(!Status::Censored.is_competing(cause));
/// assert_eq!(Status::try_from(2), Ok(Status::Competing));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    Censored,
    Event,
    Competing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid status code {code} (expected 0, 1 or 2)")]
pub struct InvalidStatusError {
    pub code: u8,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Censored => 0,
            Self::Event => 1,
            Self::Competing => 2,
        }
    }

    #[must_use]
    pub const fn is_censored(self) -> bool {
        matches!(self, Self::Censored)
    }

    /// Returns `true` if this status is the (non-censored) cause of interest.
    #[must_use]
    pub fn is_cause(self, cause: Self) -> bool {
        !self.is_censored() && self == cause
    }

    /// Returns `true` if this status is an event of any cause other than `cause`.
    #[must_use]
    pub fn is_competing(self, cause: Self) -> bool {
        !self.is_censored() && self != cause
    }
}

impl TryFrom<u8> for Status {
    type Error = InvalidStatusError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Censored),
            1 => Ok(Self::Event),
            2 => Ok(Self::Competing),
            _ => Err(InvalidStatusError { code }),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}
