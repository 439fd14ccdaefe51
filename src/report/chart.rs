use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;

use crate::data::model::{Dimension, NumericField};
use crate::pipeline::Analysis;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues, as
/// `#rrggbb` strings.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category label → colour
// ---------------------------------------------------------------------------

/// Maps category labels to distinct colours so a species keeps its colour
/// across charts.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, String>,
    default_color: String,
}

impl ColorMap {
    /// Build a colour map from the labels, assigned in sorted order.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut labels: Vec<&str> = labels.into_iter().collect();
        labels.sort_unstable();
        labels.dedup();

        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(label, color)| (label.to_string(), color))
            .collect();

        ColorMap {
            mapping,
            default_color: "#808080".to_string(),
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> &str {
        self.mapping
            .get(label)
            .map(String::as_str)
            .unwrap_or(&self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Chart specifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    /// `None` when the value is undefined; renderers leave a gap.
    pub value: Option<f64>,
    pub color: String,
}

/// A bar chart ready for an external renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Stem for the rendered file name.
    pub id: String,
    pub title: String,
    pub orientation: Orientation,
    pub category_label: String,
    pub value_label: String,
    pub bars: Vec<Bar>,
    /// Value at which to draw a dashed reference line.
    pub reference_line: Option<f64>,
}

/// Chart data derived from an analysis: 2023 population by species and
/// 2020-2023 growth by species.
pub fn prepare_charts(analysis: &Analysis) -> Vec<ChartSpec> {
    let species_labels = analysis
        .dataset
        .iter()
        .map(|obs| Dimension::Species.key(obs));
    let colors = ColorMap::new(species_labels);

    let mut population: Vec<Bar> = analysis
        .shares
        .get(&Dimension::Species)
        .map(|shares| {
            shares
                .iter()
                .map(|s| Bar {
                    label: s.key.clone(),
                    value: s.total.defined(),
                    color: colors.color_for(&s.key).to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    // Ascending, so the largest bar sits at the top of a horizontal chart.
    population.reverse();

    let growth: Vec<Bar> = analysis
        .group_trends
        .get(&Dimension::Species)
        .map(|trends| {
            trends
                .iter()
                .map(|t| Bar {
                    label: t.key.clone(),
                    value: t.growth.map(|g| g * 100.0).defined(),
                    color: colors.color_for(&t.key).to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    vec![
        ChartSpec {
            id: "species_distribution".to_string(),
            title: "Flamingo Population by Species (2023)".to_string(),
            orientation: Orientation::Horizontal,
            category_label: "Species".to_string(),
            value_label: format!("Population Count ({})", NumericField::Population2023),
            bars: population,
            reference_line: None,
        },
        ChartSpec {
            id: "growth_rates".to_string(),
            title: "Population Growth Rate by Species (2020-2023)".to_string(),
            orientation: Orientation::Vertical,
            category_label: "Species".to_string(),
            value_label: "Growth Rate (%)".to_string(),
            bars: growth,
            reference_line: Some(0.0),
        },
    ]
}
