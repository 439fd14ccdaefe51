use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Column names – the fixed header of the survey table
// ---------------------------------------------------------------------------

pub const COL_SPECIES: &str = "species";
pub const COL_REGION: &str = "region";
pub const COL_COUNTRY: &str = "country";
pub const COL_POPULATION_2020: &str = "population_2020";
pub const COL_POPULATION_2023: &str = "population_2023";
pub const COL_HABITAT_TYPE: &str = "habitat_type";
pub const COL_CONSERVATION_STATUS: &str = "conservation_status";
pub const COL_ALTITUDE_METERS: &str = "altitude_meters";
pub const COL_TEMPERATURE_CELSIUS: &str = "temperature_celsius";
pub const COL_WATER_SALINITY: &str = "water_salinity";

/// Every column the loader requires, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_SPECIES,
    COL_REGION,
    COL_COUNTRY,
    COL_POPULATION_2020,
    COL_POPULATION_2023,
    COL_HABITAT_TYPE,
    COL_CONSERVATION_STATUS,
    COL_ALTITUDE_METERS,
    COL_TEMPERATURE_CELSIUS,
    COL_WATER_SALINITY,
];

// ---------------------------------------------------------------------------
// Closed vocabularies
// ---------------------------------------------------------------------------

/// A categorical field with a fixed set of canonical labels.
///
/// Text is matched on its lowercase ASCII alphanumerics only, so casing,
/// spacing, hyphens and underscores never matter. Anything that matches no
/// label or alias becomes [`Vocabulary::UNRECOGNIZED`].
pub trait Vocabulary: Copy + Eq + 'static {
    /// All recognised members, in display order.
    const KNOWN: &'static [Self];
    /// The member used for values outside the vocabulary.
    const UNRECOGNIZED: Self;

    fn label(self) -> &'static str;

    /// Alternative spellings accepted on input.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    fn normalize(text: &str) -> Self {
        let key = match_key(text);
        if key.is_empty() {
            return Self::UNRECOGNIZED;
        }
        Self::KNOWN
            .iter()
            .copied()
            .find(|member| {
                match_key(member.label()) == key
                    || member.aliases().iter().any(|alias| match_key(alias) == key)
            })
            .unwrap_or(Self::UNRECOGNIZED)
    }

    fn is_recognized(self) -> bool {
        self != Self::UNRECOGNIZED
    }
}

/// Label used by every vocabulary for out-of-vocabulary values.
pub const UNRECOGNIZED_LABEL: &str = "Unrecognized";

fn match_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Declares a vocabulary enum with its labels and aliases, plus `Display`
/// and `Serialize` impls that write the canonical label.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $label:literal $( [ $($alias:literal),* ] )? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $variant, )+
            Unrecognized,
        }

        impl Vocabulary for $name {
            const KNOWN: &'static [Self] = &[ $( $name::$variant ),+ ];
            const UNRECOGNIZED: Self = $name::Unrecognized;

            fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                    $name::Unrecognized => UNRECOGNIZED_LABEL,
                }
            }

            fn aliases(self) -> &'static [&'static str] {
                match self {
                    $( $name::$variant => &[ $( $($alias),* )? ], )+
                    $name::Unrecognized => &[],
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

vocabulary! {
    /// The six extant flamingo species.
    pub enum Species {
        Greater => "Greater Flamingo",
        Lesser => "Lesser Flamingo",
        Chilean => "Chilean Flamingo",
        Andean => "Andean Flamingo",
        James => "James's Flamingo" ["James Flamingo", "Puna Flamingo"],
        American => "American Flamingo" ["Caribbean Flamingo"],
    }
}

vocabulary! {
    pub enum HabitatType {
        CoastalLagoon => "Coastal Lagoon",
        SaltLake => "Salt Lake" ["Saline Lake"],
        SodaLake => "Soda Lake" ["Alkaline Lake"],
        SaltPan => "Salt Pan" ["Salt Flat", "Salar"],
        Estuary => "Estuary",
        Mudflat => "Mudflat" ["Mud Flat"],
        Wetland => "Wetland" ["Marsh"],
    }
}

vocabulary! {
    /// IUCN Red List categories that apply to living populations.
    pub enum ConservationStatus {
        LeastConcern => "Least Concern" ["LC"],
        NearThreatened => "Near Threatened" ["NT"],
        Vulnerable => "Vulnerable" ["VU"],
        Endangered => "Endangered" ["EN"],
        CriticallyEndangered => "Critically Endangered" ["CR"],
        DataDeficient => "Data Deficient" ["DD"],
    }
}

vocabulary! {
    pub enum WaterSalinity {
        Freshwater => "Freshwater" ["Fresh"],
        Brackish => "Brackish",
        Saline => "Saline" ["Salt", "Saltwater"],
        Hypersaline => "Hypersaline",
    }
}

// ---------------------------------------------------------------------------
// RawObservation – one parsed but not yet normalised row
// ---------------------------------------------------------------------------

/// A row as the loader produced it: trimmed text, numbers parsed where
/// possible, nothing checked against a vocabulary yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    /// Zero-based data row index (the header is not counted).
    pub row: usize,
    pub species: String,
    pub region: String,
    pub country: String,
    pub population_2020: Option<f64>,
    pub population_2023: Option<f64>,
    pub habitat_type: String,
    pub conservation_status: String,
    pub altitude_meters: Option<f64>,
    pub temperature_celsius: Option<f64>,
    pub water_salinity: String,
}

impl From<&Observation> for RawObservation {
    fn from(obs: &Observation) -> Self {
        RawObservation {
            row: obs.row,
            species: obs.species.label().to_string(),
            region: obs.region.clone(),
            country: obs.country.clone(),
            population_2020: obs.population_2020.map(|p| p as f64),
            population_2023: obs.population_2023.map(|p| p as f64),
            habitat_type: obs.habitat_type.label().to_string(),
            conservation_status: obs.conservation_status.label().to_string(),
            altitude_meters: obs.altitude_meters,
            temperature_celsius: obs.temperature_celsius,
            water_salinity: obs.water_salinity.label().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Observation – one cleaned row of the survey table
// ---------------------------------------------------------------------------

/// A validated survey row. Unknown numbers are `None`, never 0 or -1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub row: usize,
    pub species: Species,
    pub region: String,
    pub country: String,
    pub population_2020: Option<u64>,
    pub population_2023: Option<u64>,
    pub habitat_type: HabitatType,
    pub conservation_status: ConservationStatus,
    pub altitude_meters: Option<f64>,
    pub temperature_celsius: Option<f64>,
    pub water_salinity: WaterSalinity,
}

// ---------------------------------------------------------------------------
// NumericField / Dimension – how stages address columns
// ---------------------------------------------------------------------------

/// The numeric columns statistics are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Population2020,
    Population2023,
    AltitudeMeters,
    TemperatureCelsius,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [
        NumericField::Population2020,
        NumericField::Population2023,
        NumericField::AltitudeMeters,
        NumericField::TemperatureCelsius,
    ];

    pub fn column(self) -> &'static str {
        match self {
            NumericField::Population2020 => COL_POPULATION_2020,
            NumericField::Population2023 => COL_POPULATION_2023,
            NumericField::AltitudeMeters => COL_ALTITUDE_METERS,
            NumericField::TemperatureCelsius => COL_TEMPERATURE_CELSIUS,
        }
    }

    /// Whether values are head counts (reported as integers).
    pub fn is_count(self) -> bool {
        matches!(self, NumericField::Population2020 | NumericField::Population2023)
    }

    pub fn value(self, obs: &Observation) -> Option<f64> {
        match self {
            NumericField::Population2020 => obs.population_2020.map(|p| p as f64),
            NumericField::Population2023 => obs.population_2023.map(|p| p as f64),
            NumericField::AltitudeMeters => obs.altitude_meters,
            NumericField::TemperatureCelsius => obs.temperature_celsius,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A categorical column observations can be partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Species,
    Region,
    Country,
    HabitatType,
    ConservationStatus,
    WaterSalinity,
}

impl Dimension {
    /// The dimensions grouped summaries and trends are reported for.
    pub const GROUPING: [Dimension; 3] =
        [Dimension::Species, Dimension::Region, Dimension::HabitatType];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::Species => COL_SPECIES,
            Dimension::Region => COL_REGION,
            Dimension::Country => COL_COUNTRY,
            Dimension::HabitatType => COL_HABITAT_TYPE,
            Dimension::ConservationStatus => COL_CONSERVATION_STATUS,
            Dimension::WaterSalinity => COL_WATER_SALINITY,
        }
    }

    /// The normalised label of `obs` along this dimension.
    pub fn key(self, obs: &Observation) -> &str {
        match self {
            Dimension::Species => obs.species.label(),
            Dimension::Region => &obs.region,
            Dimension::Country => &obs.country,
            Dimension::HabitatType => obs.habitat_type.label(),
            Dimension::ConservationStatus => obs.conservation_status.label(),
            Dimension::WaterSalinity => obs.water_salinity.label(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete cleaned table
// ---------------------------------------------------------------------------

/// The cleaned survey table. Built once by the cleaner and only ever
/// borrowed afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub observations: Vec<Observation>,
}

impl Dataset {
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        Dataset { observations }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Known values of `field`, in row order.
    pub fn known_values(&self, field: NumericField) -> Vec<f64> {
        self.iter().filter_map(|obs| field.value(obs)).collect()
    }

    /// Render back to raw rows carrying canonical labels.
    pub fn to_raw(&self) -> Vec<RawObservation> {
        self.iter().map(RawObservation::from).collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_normalization_ignores_case_and_punctuation() {
        assert_eq!(Species::normalize("lesser flamingo"), Species::Lesser);
        assert_eq!(Species::normalize("LESSER_FLAMINGO"), Species::Lesser);
        assert_eq!(Species::normalize(" Lesser-Flamingo "), Species::Lesser);
        assert_eq!(Species::normalize("james's flamingo"), Species::James);
        assert_eq!(Species::normalize("Puna Flamingo"), Species::James);
        assert_eq!(Species::normalize("Caribbean Flamingo"), Species::American);
    }

    #[test]
    fn unknown_labels_become_unrecognized() {
        assert_eq!(Species::normalize("Pink Pelican"), Species::Unrecognized);
        assert_eq!(HabitatType::normalize(""), HabitatType::Unrecognized);
        assert!(!WaterSalinity::normalize("Muddy").is_recognized());
    }

    #[test]
    fn unrecognized_label_round_trips() {
        let label = ConservationStatus::Unrecognized.label();
        assert_eq!(
            ConservationStatus::normalize(label),
            ConservationStatus::Unrecognized
        );
    }

    #[test]
    fn iucn_codes_are_aliases() {
        assert_eq!(
            ConservationStatus::normalize("NT"),
            ConservationStatus::NearThreatened
        );
        assert_eq!(
            ConservationStatus::normalize("least concern"),
            ConservationStatus::LeastConcern
        );
    }

    #[test]
    fn every_species_label_normalizes_to_itself() {
        for &species in Species::KNOWN {
            assert_eq!(Species::normalize(species.label()), species);
        }
        assert_eq!(Species::KNOWN.len(), 6);
    }

    #[test]
    fn vocabulary_serializes_as_label() {
        let json = serde_json::to_string(&HabitatType::CoastalLagoon).unwrap();
        assert_eq!(json, "\"Coastal Lagoon\"");
    }
}
