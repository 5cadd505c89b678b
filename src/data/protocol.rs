use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Number of folds in the second view of the benchmark.
pub const VIEW2_FOLDS: u8 = 10;

/// Number of world (training) folds of a `foldN` protocol.
pub const WORLD_FOLDS: u8 = 7;

// ---------------------------------------------------------------------------
// Name tables
// ---------------------------------------------------------------------------

/// Look `value` up in a `(name, item)` table, reporting the accepted names on failure.
fn parse_named<T: Copy>(kind: &'static str, value: &str, table: &[(&str, T)]) -> QueryResult<T> {
    let wanted = value.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, item)| *item)
        .ok_or_else(|| {
            let names: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
            QueryError::invalid(kind, value, &names)
        })
}

// ---------------------------------------------------------------------------
// Fold – one named partition of the people in the dataset
// ---------------------------------------------------------------------------

/// A partition of the dataset's people and pairs.
///
/// `view1_train` / `view1_test` form the development view, `fold1` … `fold10`
/// the ten-fold evaluation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Fold {
    View1Train,
    View1Test,
    View2(u8),
}

impl Fold {
    /// Fold `n` of the ten-fold view; `None` outside `1..=10`.
    pub fn view2(n: u8) -> Option<Fold> {
        (1..=VIEW2_FOLDS).contains(&n).then_some(Fold::View2(n))
    }

    /// Every fold, in canonical order.
    pub fn all() -> Vec<Fold> {
        let mut folds = vec![Fold::View1Train, Fold::View1Test];
        folds.extend((1..=VIEW2_FOLDS).map(Fold::View2));
        folds
    }

    pub fn is_view2(self) -> bool {
        matches!(self, Fold::View2(_))
    }

    /// The ten-fold fold `k` steps away from fold `n`, wrapping around.
    fn offset(n: u8, k: i32) -> Fold {
        let index = (i32::from(n) - 1 + k).rem_euclid(i32::from(VIEW2_FOLDS)) + 1;
        Fold::View2(index as u8)
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fold::View1Train => write!(f, "view1_train"),
            Fold::View1Test => write!(f, "view1_test"),
            Fold::View2(n) => write!(f, "fold{n}"),
        }
    }
}

impl FromStr for Fold {
    type Err = QueryError;

    fn from_str(s: &str) -> QueryResult<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "view1_train" => Ok(Fold::View1Train),
            "view1_test" => Ok(Fold::View1Test),
            other => other
                .strip_prefix("fold")
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(Fold::view2)
                .ok_or_else(|| {
                    QueryError::invalid("fold", s, &["view1_train", "view1_test", "fold1..fold10"])
                }),
        }
    }
}

impl TryFrom<String> for Fold {
    type Error = QueryError;

    fn try_from(value: String) -> QueryResult<Self> {
        value.parse()
    }
}

impl From<Fold> for String {
    fn from(fold: Fold) -> String {
        fold.to_string()
    }
}

// ---------------------------------------------------------------------------
// Group / Purpose / WorldType / Subworld / PairLabel
// ---------------------------------------------------------------------------

/// Training, development and evaluation splits of a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    World,
    Dev,
    Eval,
}

const GROUP_NAMES: &[(&str, Group)] = &[
    ("world", Group::World),
    ("dev", Group::Dev),
    ("eval", Group::Eval),
];

impl Group {
    pub const ALL: [Group; 3] = [Group::World, Group::Dev, Group::Eval];

    pub fn name(self) -> &'static str {
        match self {
            Group::World => "world",
            Group::Dev => "dev",
            Group::Eval => "eval",
        }
    }
}

/// Role a file plays inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Purpose {
    Enrol,
    Probe,
    /// Training files of the world group.
    Train,
}

const PURPOSE_NAMES: &[(&str, Purpose)] = &[
    ("enrol", Purpose::Enrol),
    ("probe", Purpose::Probe),
    ("train", Purpose::Train),
    ("world", Purpose::Train),
];

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Enrol, Purpose::Probe, Purpose::Train];

    pub fn name(self) -> &'static str {
        match self {
            Purpose::Enrol => "enrol",
            Purpose::Probe => "probe",
            Purpose::Train => "train",
        }
    }
}

/// Training regime for the world group.
///
/// Restricted training may only use the files that appear in the world pairs;
/// unrestricted training may use every image of the world people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum WorldType {
    Restricted,
    #[default]
    Unrestricted,
}

const WORLD_TYPE_NAMES: &[(&str, WorldType)] = &[
    ("restricted", WorldType::Restricted),
    ("unrestricted", WorldType::Unrestricted),
];

impl WorldType {
    pub const ALL: [WorldType; 2] = [WorldType::Restricted, WorldType::Unrestricted];

    pub fn name(self) -> &'static str {
        match self {
            WorldType::Restricted => "restricted",
            WorldType::Unrestricted => "unrestricted",
        }
    }
}

/// Leading part of the world folds of a `foldN` protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Subworld {
    Onefolds,
    Twofolds,
    Threefolds,
    Fourfolds,
    Fivefolds,
    Sixfolds,
    #[default]
    Sevenfolds,
}

const SUBWORLD_NAMES: &[(&str, Subworld)] = &[
    ("onefolds", Subworld::Onefolds),
    ("twofolds", Subworld::Twofolds),
    ("threefolds", Subworld::Threefolds),
    ("fourfolds", Subworld::Fourfolds),
    ("fivefolds", Subworld::Fivefolds),
    ("sixfolds", Subworld::Sixfolds),
    ("sevenfolds", Subworld::Sevenfolds),
];

impl Subworld {
    /// How many of the world folds this subworld keeps.
    pub fn fold_count(self) -> u8 {
        match self {
            Subworld::Onefolds => 1,
            Subworld::Twofolds => 2,
            Subworld::Threefolds => 3,
            Subworld::Fourfolds => 4,
            Subworld::Fivefolds => 5,
            Subworld::Sixfolds => 6,
            Subworld::Sevenfolds => WORLD_FOLDS,
        }
    }

    pub fn name(self) -> &'static str {
        SUBWORLD_NAMES[usize::from(self.fold_count()) - 1].0
    }

    pub fn names() -> Vec<&'static str> {
        SUBWORLD_NAMES.iter().map(|(name, _)| *name).collect()
    }
}

/// Ground truth of a verification pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PairLabel {
    Match,
    Mismatch,
}

const PAIR_LABEL_NAMES: &[(&str, PairLabel)] = &[
    ("match", PairLabel::Match),
    ("mismatch", PairLabel::Mismatch),
    ("client", PairLabel::Match),
    ("impostor", PairLabel::Mismatch),
];

impl PairLabel {
    pub fn from_match(is_match: bool) -> Self {
        if is_match {
            PairLabel::Match
        } else {
            PairLabel::Mismatch
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PairLabel::Match => "match",
            PairLabel::Mismatch => "mismatch",
        }
    }
}

macro_rules! named_value {
    ($ty:ty, $kind:literal, $table:ident) => {
        impl FromStr for $ty {
            type Err = QueryError;

            fn from_str(s: &str) -> QueryResult<Self> {
                parse_named($kind, s, $table)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_value!(Group, "group", GROUP_NAMES);
named_value!(Purpose, "purpose", PURPOSE_NAMES);
named_value!(WorldType, "world type", WORLD_TYPE_NAMES);
named_value!(Subworld, "subworld", SUBWORLD_NAMES);
named_value!(PairLabel, "pair class", PAIR_LABEL_NAMES);

// ---------------------------------------------------------------------------
// Protocol – maps groups onto folds
// ---------------------------------------------------------------------------

/// A train/dev/eval partition scheme of the dataset.
///
/// ```text
///  protocol │ world (ordered)  │ dev        │ eval │ T/Z-norm
///  ─────────┼──────────────────┼────────────┼──────┼──────────
///  view1    │ view1_train      │ view1_test │  –   │  –
///  foldN    │ N+1 … N+7        │ N-2, N-1   │  N   │ N+6, N+7
/// ```
///
/// Fold numbers wrap around modulo ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    View1,
    Fold(u8),
}

impl Protocol {
    /// Every protocol, in canonical order.
    pub fn all() -> Vec<Protocol> {
        let mut protocols = vec![Protocol::View1];
        protocols.extend((1..=VIEW2_FOLDS).map(Protocol::Fold));
        protocols
    }

    pub fn names() -> Vec<String> {
        Protocol::all().iter().map(Protocol::to_string).collect()
    }

    /// Folds making up `group`; `subworld` only narrows the world of `foldN`.
    pub fn folds(self, group: Group, subworld: Subworld) -> Vec<Fold> {
        match (self, group) {
            (Protocol::View1, Group::World) => vec![Fold::View1Train],
            (Protocol::View1, Group::Dev) => vec![Fold::View1Test],
            (Protocol::View1, Group::Eval) => Vec::new(),
            (Protocol::Fold(n), Group::World) => (1..=i32::from(subworld.fold_count()))
                .map(|k| Fold::offset(n, k))
                .collect(),
            (Protocol::Fold(n), Group::Dev) => vec![Fold::offset(n, -2), Fold::offset(n, -1)],
            (Protocol::Fold(n), Group::Eval) => vec![Fold::View2(n)],
        }
    }

    /// World folds reserved for score normalisation: inside `sevenfolds`,
    /// outside `fivefolds`.
    pub fn tnorm_folds(self) -> Vec<Fold> {
        match self {
            Protocol::View1 => Vec::new(),
            Protocol::Fold(n) => vec![Fold::offset(n, 6), Fold::offset(n, 7)],
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::View1 => write!(f, "view1"),
            Protocol::Fold(n) => write!(f, "fold{n}"),
        }
    }
}

impl FromStr for Protocol {
    type Err = QueryError;

    fn from_str(s: &str) -> QueryResult<Self> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "view1" {
            return Ok(Protocol::View1);
        }
        lower
            .strip_prefix("fold")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=VIEW2_FOLDS).contains(n))
            .map(Protocol::Fold)
            .ok_or_else(|| QueryError::invalid("protocol", s, &["view1", "fold1..fold10"]))
    }
}
