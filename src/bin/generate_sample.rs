use std::path::PathBuf;

use anyhow::{Context, Result};

use flamingo_analytics::data::model::REQUIRED_COLUMNS;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

struct Site {
    species: &'static str,
    region: &'static str,
    country: &'static str,
    population: f64,
    habitat: &'static str,
    status: &'static str,
    altitude: f64,
    temperature: f64,
    salinity: &'static str,
}

const SITES: &[Site] = &[
    Site {
        species: "Greater Flamingo",
        region: "Mediterranean",
        country: "Spain",
        population: 25_000.0,
        habitat: "Coastal Lagoon",
        status: "Least Concern",
        altitude: 2.0,
        temperature: 17.5,
        salinity: "Saline",
    },
    Site {
        species: "Greater Flamingo",
        region: "Mediterranean",
        country: "France",
        population: 18_000.0,
        habitat: "Salt Pan",
        status: "Least Concern",
        altitude: 1.0,
        temperature: 15.0,
        salinity: "Hypersaline",
    },
    Site {
        species: "Greater Flamingo",
        region: "Middle East",
        country: "Iran",
        population: 40_000.0,
        habitat: "Salt Lake",
        status: "Least Concern",
        altitude: 1_270.0,
        temperature: 19.0,
        salinity: "Hypersaline",
    },
    Site {
        species: "Lesser Flamingo",
        region: "East Africa",
        country: "Kenya",
        population: 1_000_000.0,
        habitat: "Soda Lake",
        status: "Near Threatened",
        altitude: 1_754.0,
        temperature: 24.0,
        salinity: "Saline",
    },
    Site {
        species: "Lesser Flamingo",
        region: "East Africa",
        country: "Tanzania",
        population: 600_000.0,
        habitat: "Soda Lake",
        status: "Near Threatened",
        altitude: 600.0,
        temperature: 26.0,
        salinity: "Hypersaline",
    },
    Site {
        species: "Lesser Flamingo",
        region: "South Asia",
        country: "India",
        population: 250_000.0,
        habitat: "Mudflat",
        status: "Near Threatened",
        altitude: 10.0,
        temperature: 28.0,
        salinity: "Brackish",
    },
    Site {
        species: "Chilean Flamingo",
        region: "South America",
        country: "Argentina",
        population: 120_000.0,
        habitat: "Salt Lake",
        status: "Near Threatened",
        altitude: 150.0,
        temperature: 16.0,
        salinity: "Brackish",
    },
    Site {
        species: "Chilean Flamingo",
        region: "Andes",
        country: "Chile",
        population: 60_000.0,
        habitat: "Salt Pan",
        status: "Near Threatened",
        altitude: 2_300.0,
        temperature: 9.0,
        salinity: "Saline",
    },
    Site {
        species: "Andean Flamingo",
        region: "Andes",
        country: "Bolivia",
        population: 20_000.0,
        habitat: "Salt Lake",
        status: "Vulnerable",
        altitude: 4_300.0,
        temperature: 3.0,
        salinity: "Hypersaline",
    },
    Site {
        species: "Andean Flamingo",
        region: "Andes",
        country: "Chile",
        population: 12_000.0,
        habitat: "Salt Pan",
        status: "Vulnerable",
        altitude: 3_900.0,
        temperature: 5.0,
        salinity: "Hypersaline",
    },
    Site {
        species: "James's Flamingo",
        region: "Andes",
        country: "Bolivia",
        population: 64_000.0,
        habitat: "Salt Lake",
        status: "Near Threatened",
        altitude: 4_280.0,
        temperature: 2.5,
        salinity: "Saline",
    },
    Site {
        species: "James's Flamingo",
        region: "Andes",
        country: "Peru",
        population: 15_000.0,
        habitat: "Wetland",
        status: "Near Threatened",
        altitude: 4_100.0,
        temperature: 4.0,
        salinity: "Brackish",
    },
    Site {
        species: "American Flamingo",
        region: "Caribbean",
        country: "Bahamas",
        population: 60_000.0,
        habitat: "Coastal Lagoon",
        status: "Least Concern",
        altitude: 1.0,
        temperature: 26.5,
        salinity: "Saline",
    },
    Site {
        species: "American Flamingo",
        region: "Caribbean",
        country: "Mexico",
        population: 30_000.0,
        habitat: "Estuary",
        status: "Least Concern",
        altitude: 3.0,
        temperature: 27.0,
        salinity: "Brackish",
    },
    Site {
        species: "American Flamingo",
        region: "South America",
        country: "Venezuela",
        population: 25_000.0,
        habitat: "Mudflat",
        status: "Least Concern",
        altitude: 5.0,
        temperature: 28.5,
        salinity: "Brackish",
    },
];

/// Number of survey sub-sites generated per site.
const SURVEYS_PER_SITE: usize = 4;
const DEFAULT_OUTPUT: &str = "data/flamingo_data.csv";

fn fmt_count(v: f64) -> String {
    format!("{}", v.max(0.0).round() as u64)
}

fn survey_row(site: &Site, rng: &mut SimpleRng) -> [String; 10] {
    let share = rng.next_f64() * 0.4 + 0.1;
    let p2020 = site.population * share;
    let p2023 = p2020 * rng.gauss(1.0, 0.12).max(0.2);

    let mut row = [
        site.species.to_string(),
        site.region.to_string(),
        site.country.to_string(),
        fmt_count(p2020),
        fmt_count(p2023),
        site.habitat.to_string(),
        site.status.to_string(),
        format!("{:.0}", (site.altitude + rng.gauss(0.0, 15.0)).max(0.0)),
        format!("{:.1}", site.temperature + rng.gauss(0.0, 1.5)),
        site.salinity.to_string(),
    ];

    // Sprinkle the gaps real surveys have.
    if rng.chance(0.06) {
        row[3] = String::new();
    }
    if rng.chance(0.04) {
        row[4] = "NA".to_string();
    }
    if rng.chance(0.05) {
        row[8] = "unknown".to_string();
    }
    row
}

/// Rows the cleaner has to deal with.
fn malformed_rows() -> Vec<[&'static str; 10]> {
    vec![
        [
            "Lesser Flamingo", "East Africa", "Kenya", "-1", "5400", "Soda Lake", "Near Threatened",
            "1850", "23.5", "Saline",
        ],
        [
            "Andean Flamingo", "Andes", "Argentina", "0", "350", "Salt Lake", "Vulnerable", "3950",
            "4.5", "Hypersaline",
        ],
        [
            "Chilean Flamingo", "South America", "Uruguay", "820", "910", "Rocky Shore",
            "Near Threatened", "4", "18.0", "Brackish",
        ],
        [
            "Greater Flamingo", "", "Turkey", "9000", "9500", "Salt Lake", "Least Concern", "900",
            "14.0", "Saline",
        ],
        [
            "American Flamingo", "Caribbean", "Cuba", "4500.5", "lots", "Coastal Lagoon", "LC", "2",
            "26.0", "Saltwater",
        ],
    ]
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    writer.write_record(REQUIRED_COLUMNS)?;

    let mut rows = 0usize;
    for site in SITES {
        for _ in 0..SURVEYS_PER_SITE {
            writer.write_record(survey_row(site, &mut rng))?;
            rows += 1;
        }
    }
    for row in malformed_rows() {
        writer.write_record(row)?;
        rows += 1;
    }
    writer.flush()?;

    println!("Wrote {rows} observations to {}", output_path.display());
    Ok(())
}
