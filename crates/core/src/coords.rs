//! Coordinate name standardisation.
//!
//! Model output and reanalysis products disagree on coordinate names (`lat`,
//! `XLAT`, `xlong_u`, ...). Regridding tools expect `latitude`, `longitude`
//! and `time`; this module works out which coordinates need renaming.

use std::collections::HashSet;
use std::fmt;

/// Canonical coordinate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardCoordinate {
    Latitude,
    Longitude,
    Time,
}

impl StandardCoordinate {
    pub const ALL: [StandardCoordinate; 3] = [Self::Latitude, Self::Longitude, Self::Time];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Time => "time",
        }
    }

    /// Known spellings, lower case.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Latitude => &["lat", "latitude", "xlat", "xlat_u", "xlat_v"],
            Self::Longitude => &[
                "lon",
                "longitude",
                "xlon",
                "xlong",
                "xlong_u",
                "xlong_v",
                "long",
            ],
            Self::Time => &["time", "xtime"],
        }
    }
}

impl fmt::Display for StandardCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard coordinate for `name`, matched case-insensitively.
pub fn standard_coordinate_name(name: &str) -> Option<StandardCoordinate> {
    let lower = name.to_ascii_lowercase();
    StandardCoordinate::ALL
        .into_iter()
        .find(|coord| coord.aliases().contains(&lower.as_str()))
}

/// A single coordinate rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateRename {
    pub from: String,
    pub to: StandardCoordinate,
}

/// Renames that bring `names` to standard coordinate names.
///
/// Coordinates already carrying their standard name are left alone, as are
/// unrecognised ones. A target is assigned at most once, and never when a
/// coordinate already holds it, so applying the result cannot create
/// duplicate names.
pub fn standardise_names<I, S>(names: I) -> Vec<CoordinateRename>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<S> = names.into_iter().collect();
    let mut taken: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
    let mut renames = Vec::new();

    for name in &names {
        let name = name.as_ref();
        let Some(target) = standard_coordinate_name(name) else {
            continue;
        };
        if name == target.as_str() || taken.contains(target.as_str()) {
            continue;
        }
        taken.insert(target.as_str());
        renames.push(CoordinateRename {
            from: name.to_string(),
            to: target,
        });
    }

    renames
}
