use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Permission level of a user.
///
/// Lower numeric values carry more privilege: `Root` outranks everyone,
/// `Visitor` is the least privileged level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PermLevel {
    Root = 0,
    Admin = 1,
    Mod = 2,
    #[default]
    Visitor = 3,
}

/// Outcome of comparing a candidate level against a reference level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermRelation {
    Superior,
    Inferior,
    Equal,
}

/// Selects the shape of a permission comparison result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    #[default]
    Boolean,
    #[serde(alias = "string")]
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PermComparison {
    Boolean(bool),
    Label(PermRelation),
}

impl PermLevel {
    pub const ALL: [PermLevel; 4] = [
        PermLevel::Root,
        PermLevel::Admin,
        PermLevel::Mod,
        PermLevel::Visitor,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(PermLevel::Root),
            1 => Some(PermLevel::Admin),
            2 => Some(PermLevel::Mod),
            3 => Some(PermLevel::Visitor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PermLevel::Root => "Root",
            PermLevel::Admin => "Admin",
            PermLevel::Mod => "Mod",
            PermLevel::Visitor => "Visitor",
        }
    }

    /// True when `self` is at least as privileged as `reference`.
    ///
    /// Since smaller numbers mean more privilege this is `self <= reference`
    /// on the numeric levels.
    pub fn at_least(self, reference: PermLevel) -> bool {
        self.level() <= reference.level()
    }

    pub fn relation_to(self, reference: PermLevel) -> PermRelation {
        match self.level().cmp(&reference.level()) {
            std::cmp::Ordering::Less => PermRelation::Superior,
            std::cmp::Ordering::Greater => PermRelation::Inferior,
            std::cmp::Ordering::Equal => PermRelation::Equal,
        }
    }

    pub fn compare(self, reference: PermLevel, mode: CompareMode) -> PermComparison {
        match mode {
            CompareMode::Boolean => PermComparison::Boolean(self.at_least(reference)),
            CompareMode::Label => PermComparison::Label(self.relation_to(reference)),
        }
    }
}

impl fmt::Display for PermLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PermRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PermRelation::Superior => "superior",
            PermRelation::Inferior => "inferior",
            PermRelation::Equal => "equal",
        };
        f.write_str(label)
    }
}

/// Resolves either a level name (`"Admin"`, case-insensitive) or its
/// numeric form (`"1"`).
impl FromStr for PermLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(level) = trimmed.parse::<u8>() {
            return PermLevel::from_level(level)
                .ok_or_else(|| format!("unknown permission level: {}", level));
        }

        PermLevel::ALL
            .into_iter()
            .find(|perm| perm.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown permission: {}", s))
    }
}

impl Serialize for PermLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PermLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Resolvable {
            Level(u8),
            Name(String),
        }

        match Resolvable::deserialize(deserializer)? {
            Resolvable::Level(level) => PermLevel::from_level(level)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown permission level: {}", level))),
            Resolvable::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
