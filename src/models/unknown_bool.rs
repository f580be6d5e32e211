//! Tri-state boolean used by every reachability predicate.
//!
//! Azure resource data is frequently incomplete, so firewall questions can
//! rarely be answered with a plain `bool`. [`UnknownBool`] adds two extra
//! terminal states: `Unknown` ("we could not determine this") and
//! `NotApplicable` ("the question makes no sense for this resource kind").

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};

/// A true or false value that also includes an unknown and an N/A state.
///
/// In the snapshot JSON these are stored in integer form:
/// `Unknown == 0`, `True == 1`, `False == -1`, `NotApplicable == -2`.
///
/// `Unknown` is the default so that a freshly deserialized or zeroed value
/// never accidentally claims certainty.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UnknownBool {
    /// A "boolean" parameter that we never figured out the actual state of.
    #[default]
    Unknown,
    True,
    False,
    /// The parameter is not applicable to the specific instance. Some
    /// resources have configuration options that make a different
    /// configuration option meaningless.
    NotApplicable,
}

impl UnknownBool {
    /// Convenience constructor for turning a `bool` into an [`UnknownBool`].
    pub fn from_bool(b: bool) -> UnknownBool {
        if b {
            UnknownBool::True
        } else {
            UnknownBool::False
        }
    }

    /// Builds an [`UnknownBool`] from the three potential states of an
    /// optional bool: `None` is `Unknown`.
    pub fn from_opt_bool(b: Option<bool>) -> UnknownBool {
        match b {
            Some(v) => UnknownBool::from_bool(v),
            None => UnknownBool::Unknown,
        }
    }

    /// Returns true if the value is `True`.
    pub fn is_true(self) -> bool {
        self == UnknownBool::True
    }

    /// Returns true if the value is `False`.
    pub fn is_false(self) -> bool {
        self == UnknownBool::False
    }

    /// Returns true if the value is `Unknown`.
    pub fn is_unknown(self) -> bool {
        self == UnknownBool::Unknown
    }

    /// Returns true if the value is `NotApplicable`.
    pub fn is_na(self) -> bool {
        self == UnknownBool::NotApplicable
    }

    /// Returns true for anything other than `Unknown`.
    pub fn known(self) -> bool {
        self != UnknownBool::Unknown
    }

    /// Returns true if the value is known and not `NotApplicable`.
    pub fn applicable(self) -> bool {
        self.known() && self != UnknownBool::NotApplicable
    }

    /// AND-like combination. `NotApplicable` on either side wins outright,
    /// then a definite `False`, then `Unknown`, and only two concrete
    /// `True` values produce `True`.
    pub fn and(self, other: UnknownBool) -> UnknownBool {
        if self.is_na() || other.is_na() {
            return UnknownBool::NotApplicable;
        }
        if self.is_false() || other.is_false() {
            return UnknownBool::False;
        }
        if self.is_unknown() || other.is_unknown() {
            return UnknownBool::Unknown;
        }
        UnknownBool::True
    }

    /// OR-like combination with the same `NotApplicable` short-circuit as
    /// [`UnknownBool::and`].
    pub fn or(self, other: UnknownBool) -> UnknownBool {
        if self.is_na() || other.is_na() {
            return UnknownBool::NotApplicable;
        }
        if self.is_true() || other.is_true() {
            return UnknownBool::True;
        }
        if self.is_unknown() || other.is_unknown() {
            return UnknownBool::Unknown;
        }
        UnknownBool::False
    }

    /// Folds an iterator with [`UnknownBool::and`]. An empty iterator is
    /// vacuously `True`.
    pub fn all<I: IntoIterator<Item = UnknownBool>>(iter: I) -> UnknownBool {
        iter.into_iter().fold(UnknownBool::True, UnknownBool::and)
    }

    /// Folds an iterator with [`UnknownBool::or`]. An empty iterator is `False`.
    pub fn any<I: IntoIterator<Item = UnknownBool>>(iter: I) -> UnknownBool {
        iter.into_iter().fold(UnknownBool::False, UnknownBool::or)
    }

    fn as_i8(self) -> i8 {
        match self {
            UnknownBool::Unknown => 0,
            UnknownBool::True => 1,
            UnknownBool::False => -1,
            UnknownBool::NotApplicable => -2,
        }
    }

    fn from_i8(v: i8) -> Option<UnknownBool> {
        match v {
            0 => Some(UnknownBool::Unknown),
            1 => Some(UnknownBool::True),
            -1 => Some(UnknownBool::False),
            -2 => Some(UnknownBool::NotApplicable),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnknownBool {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            UnknownBool::True => "BoolTrue",
            UnknownBool::False => "BoolFalse",
            UnknownBool::NotApplicable => "BoolNotApplicable",
            UnknownBool::Unknown => "BoolUnknown",
        };
        write!(f, "{s}")
    }
}

impl Serialize for UnknownBool {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for UnknownBool {
    fn deserialize<D>(deserializer: D) -> Result<UnknownBool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = i8::deserialize(deserializer)?;
        UnknownBool::from_i8(v)
            .ok_or_else(|| de::Error::custom(format!("invalid UnknownBool value: {v}")))
    }
}
