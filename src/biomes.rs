//! Biome classification from temperature, rainfall and elevation.
//!
//! The table is ordered and first-match wins: Ice Shelf must be tested
//! before the other water biomes. Every rule is plain data (numeric range
//! clauses interpreted by one shared function), so the table serializes and
//! the range logic is testable in isolation.
//!
//! Range conventions: temperature and rainfall bands are half-open
//! `[lo, hi)`, except that a rainfall bound equal to the 7000 mm domain
//! maximum also accepts the maximum itself, so a fully saturated cell still
//! classifies. The table must be total over the reachable input domain:
//! temperature [-30, 35), rainfall [0, 7000], elevation 0-255. A cell no
//! rule matches is a fatal configuration error, never a silent default.

use serde::{Deserialize, Serialize};

/// Maximum rainfall the synthesizer can produce (mm/year).
pub const RAIN_MAX: f32 = 7000.0;

/// Water warm enough for reef growth.
const CORAL_REEF_TEMP_CUTOFF: f32 = 25.0;

/// Depth below sea level separating coastal shallows from open ocean.
const SHELF_DEPTH: f32 = 10.0;

/// Biome identifiers. Discriminants are the rule-table indices and the byte
/// ids stored in tile grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    PolarDesert = 0,
    Tundra = 1,
    AlpineTundra = 2,
    AridDesert = 3,
    AridShrubland = 4,
    SemiaridDesert = 5,
    DrySteppe = 6,
    TemperateSteppe = 7,
    GrassSavanna = 8,
    TreeSavanna = 9,
    Woodland = 10,
    BorealForest = 11,
    TemperateForest = 12,
    TropicalForest = 13,
    TemperateRainforest = 14,
    TropicalRainforest = 15,
    IceShelf = 16,
    Coast = 17,
    Ocean = 18,
    CoralReef = 19,
}

impl Biome {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Biome> {
        RULES.get(id as usize).map(|rule| rule.biome)
    }

    pub fn title(self) -> &'static str {
        RULES[self as usize].title
    }

    pub fn color(self) -> [u8; 3] {
        RULES[self as usize].color
    }

    pub fn domain(self) -> Domain {
        RULES[self as usize].domain
    }
}

/// Which side of sea level a rule applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Land,
    Water,
}

impl Domain {
    /// Land is strictly above sea level; a cell at exactly sea level is water.
    pub fn of(elevation: u8, sealevel: u8) -> Domain {
        if elevation > sealevel {
            Domain::Land
        } else {
            Domain::Water
        }
    }
}

/// Elevation constraint of a rule clause, relative to sea level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HeightBand {
    /// No elevation constraint beyond the rule's domain.
    Any,
    /// Relief (elevation minus sea level) strictly below the threshold.
    ReliefBelow(f32),
    /// Relief at or above the threshold.
    ReliefAtLeast(f32),
    /// Shallow water: within `SHELF_DEPTH` units below sea level, inclusive.
    Shelf,
    /// Open water: more than `SHELF_DEPTH` units below sea level.
    Deep,
}

impl HeightBand {
    fn matches(self, elevation: u8, sealevel: u8) -> bool {
        let relief = elevation as f32 - sealevel as f32;
        match self {
            HeightBand::Any => true,
            HeightBand::ReliefBelow(limit) => relief < limit,
            HeightBand::ReliefAtLeast(limit) => relief >= limit,
            HeightBand::Shelf => (-SHELF_DEPTH..=0.0).contains(&relief),
            HeightBand::Deep => relief < -SHELF_DEPTH,
        }
    }
}

/// One numeric-range clause; a rule matches if any of its clauses match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleClause {
    /// Temperature band [lo, hi) in Celsius.
    pub temperature: (f32, f32),
    /// Rainfall band [lo, hi) in mm; hi == `RAIN_MAX` is inclusive.
    pub rainfall: (f32, f32),
    pub band: HeightBand,
}

impl RuleClause {
    fn matches(&self, temperature: f32, rainfall: f32, elevation: u8, sealevel: u8) -> bool {
        let (t_lo, t_hi) = self.temperature;
        let (r_lo, r_hi) = self.rainfall;
        let temp_ok = temperature >= t_lo && temperature < t_hi;
        let rain_ok = rainfall >= r_lo && (rainfall < r_hi || (r_hi >= RAIN_MAX && rainfall <= r_hi));
        temp_ok && rain_ok && self.band.matches(elevation, sealevel)
    }
}

/// One biome rule: identity, display metadata, domain and match clauses.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BiomeRule {
    pub biome: Biome,
    pub title: &'static str,
    pub color: [u8; 3],
    pub domain: Domain,
    pub clauses: &'static [RuleClause],
}

const fn clause(temperature: (f32, f32), rainfall: (f32, f32), band: HeightBand) -> RuleClause {
    RuleClause {
        temperature,
        rainfall,
        band,
    }
}

/// The ordered rule table. Index == biome id.
pub static RULES: &[BiomeRule] = &[
    BiomeRule {
        biome: Biome::PolarDesert,
        title: "Polar Desert",
        color: [224, 224, 224],
        domain: Domain::Land,
        clauses: &[
            clause((-31.0, -15.0), (0.0, 7000.0), HeightBand::Any),
            clause((-15.0, -10.0), (1000.0, 7000.0), HeightBand::Any),
        ],
    },
    BiomeRule {
        biome: Biome::Tundra,
        title: "Tundra",
        color: [114, 153, 128],
        domain: Domain::Land,
        clauses: &[clause((-15.0, -10.0), (0.0, 1000.0), HeightBand::ReliefBelow(20.0))],
    },
    BiomeRule {
        biome: Biome::AlpineTundra,
        title: "Alpine Tundra",
        color: [157, 181, 216],
        domain: Domain::Land,
        clauses: &[clause((-15.0, -10.0), (0.0, 1000.0), HeightBand::ReliefAtLeast(20.0))],
    },
    BiomeRule {
        biome: Biome::AridDesert,
        title: "Arid Desert",
        color: [130, 66, 37],
        domain: Domain::Land,
        clauses: &[clause((-10.0, 35.0), (0.0, 25.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::AridShrubland,
        title: "Arid Shrubland",
        color: [171, 95, 57],
        domain: Domain::Land,
        clauses: &[clause((-10.0, 35.0), (25.0, 125.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::SemiaridDesert,
        title: "Semiarid Desert",
        color: [215, 170, 110],
        domain: Domain::Land,
        clauses: &[
            clause((5.0, 20.0), (125.0, 250.0), HeightBand::Any),
            clause((20.0, 35.0), (125.0, 500.0), HeightBand::Any),
        ],
    },
    BiomeRule {
        biome: Biome::DrySteppe,
        title: "Dry Steppe",
        color: [147, 123, 56],
        domain: Domain::Land,
        clauses: &[clause((10.0, 15.0), (250.0, 500.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::TemperateSteppe,
        title: "Temperate Steppe",
        color: [247, 236, 88],
        domain: Domain::Land,
        clauses: &[
            clause((0.0, 10.0), (250.0, 1000.0), HeightBand::Any),
            clause((0.0, 5.0), (125.0, 250.0), HeightBand::Any),
        ],
    },
    BiomeRule {
        biome: Biome::GrassSavanna,
        title: "Grass Savanna",
        color: [199, 196, 61],
        domain: Domain::Land,
        clauses: &[
            clause((15.0, 20.0), (250.0, 625.0), HeightBand::Any),
            clause((20.0, 35.0), (500.0, 625.0), HeightBand::Any),
        ],
    },
    BiomeRule {
        biome: Biome::TreeSavanna,
        title: "Tree Savanna",
        color: [164, 159, 0],
        domain: Domain::Land,
        clauses: &[clause((20.0, 35.0), (625.0, 1000.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::Woodland,
        title: "Woodland",
        color: [125, 95, 135],
        domain: Domain::Land,
        clauses: &[
            clause((10.0, 15.0), (500.0, 1000.0), HeightBand::Any),
            clause((15.0, 20.0), (625.0, 1000.0), HeightBand::Any),
        ],
    },
    BiomeRule {
        biome: Biome::BorealForest,
        title: "Boreal Forest",
        color: [28, 94, 74],
        domain: Domain::Land,
        clauses: &[clause((-10.0, 0.0), (125.0, 7000.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::TemperateForest,
        title: "Temperate Forest",
        color: [144, 218, 58],
        domain: Domain::Land,
        clauses: &[clause((0.0, 20.0), (1000.0, 3000.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::TropicalForest,
        title: "Tropical Forest",
        color: [96, 122, 34],
        domain: Domain::Land,
        clauses: &[clause((20.0, 35.0), (1000.0, 3000.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::TemperateRainforest,
        title: "Temperate Rainforest",
        color: [89, 129, 89],
        domain: Domain::Land,
        clauses: &[clause((0.0, 20.0), (3000.0, 7000.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::TropicalRainforest,
        title: "Tropical Rainforest",
        color: [0, 70, 0],
        domain: Domain::Land,
        clauses: &[clause((20.0, 35.0), (3000.0, 7000.0), HeightBand::Any)],
    },
    // Water rules. Ice Shelf stays ahead of Coast and Ocean; the order is
    // part of the contract.
    BiomeRule {
        biome: Biome::IceShelf,
        title: "Ice Shelf",
        color: [224, 224, 244],
        domain: Domain::Water,
        clauses: &[clause((-30.0, -20.0), (0.0, 7000.0), HeightBand::Any)],
    },
    BiomeRule {
        biome: Biome::Coast,
        title: "Coast",
        color: [14, 63, 80],
        domain: Domain::Water,
        clauses: &[clause((-20.0, CORAL_REEF_TEMP_CUTOFF), (0.0, 7000.0), HeightBand::Shelf)],
    },
    BiomeRule {
        biome: Biome::Ocean,
        title: "Ocean",
        color: [4, 53, 70],
        domain: Domain::Water,
        clauses: &[clause((-20.0, 35.0), (0.0, 7000.0), HeightBand::Deep)],
    },
    BiomeRule {
        biome: Biome::CoralReef,
        title: "Coral Reef",
        color: [24, 83, 90],
        domain: Domain::Water,
        clauses: &[clause((CORAL_REEF_TEMP_CUTOFF, 35.0), (0.0, 7000.0), HeightBand::Shelf)],
    },
];

/// Classify a cell. Scans the ordered table restricted to the cell's domain
/// and returns the first matching rule's biome, or None on a table gap.
pub fn classify(temperature: f32, rainfall: f32, elevation: u8, sealevel: u8) -> Option<Biome> {
    let domain = Domain::of(elevation, sealevel);
    RULES
        .iter()
        .filter(|rule| rule.domain == domain)
        .find(|rule| {
            rule.clauses
                .iter()
                .any(|c| c.matches(temperature, rainfall, elevation, sealevel))
        })
        .map(|rule| rule.biome)
}
