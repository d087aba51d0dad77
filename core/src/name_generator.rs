//! Deterministic names for synthetic populations.
//!
//! Country names are built from curated syllables so they never collide
//! with a real country. ISO3-style codes are derived from the name and
//! made unique within one generator.

use crate::{rng::SeededRng, types::Iso3};
use std::collections::HashSet;

/// Humanitarian clusters used for synthetic projects.
pub const CLUSTERS: &[&str] = &[
    "Food Security",
    "Health",
    "Nutrition",
    "Protection",
    "Shelter",
    "Water Sanitation Hygiene",
    "Education",
    "Logistics",
];

/// Tracks issued codes so every generated country gets a distinct one.
#[derive(Default)]
pub struct NameGenerator {
    issued: HashSet<Iso3>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two or three syllables plus an optional suffix, e.g. "Keloria".
    pub fn country_name(rng: &mut SeededRng) -> String {
        let syllables = if rng.chance(0.5) { 2 } else { 3 };
        let mut name = String::new();
        for _ in 0..syllables {
            name.push_str(*rng.pick(Self::syllables()));
        }
        if rng.chance(0.6) {
            name.push_str(*rng.pick(Self::suffixes()));
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => name,
        }
    }

    /// First three letters of the name, upper-cased. On collision the
    /// last two letters walk the alphabet, then the leading one. None
    /// once every three-letter code is taken.
    pub fn iso3_for(&mut self, name: &str) -> Option<Iso3> {
        let letters: Vec<char> = name
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .chain(std::iter::repeat('X'))
            .take(3)
            .collect();
        let lead = letters[0];

        let same_lead =
            ('A'..='Z').flat_map(move |mid| ('A'..='Z').map(move |last| [lead, mid, last]));
        let any_lead = ('A'..='Z').flat_map(|first| {
            ('A'..='Z').flat_map(move |mid| ('A'..='Z').map(move |last| [first, mid, last]))
        });
        std::iter::once([letters[0], letters[1], letters[2]])
            .chain(same_lead)
            .chain(any_lead)
            .map(|code| code.iter().collect::<Iso3>())
            .find(|code| self.issued.insert(code.clone()))
    }

    /// A fresh (name, code) pair; None when the code space is exhausted.
    pub fn country(&mut self, rng: &mut SeededRng) -> Option<(String, Iso3)> {
        let name = Self::country_name(rng);
        let iso3 = self.iso3_for(&name)?;
        Some((name, iso3))
    }

    pub fn project_name(rng: &mut SeededRng, country: &str, cluster: &str) -> String {
        format!("{} {} {}", country, cluster, rng.pick(Self::project_kinds()))
    }

    fn syllables() -> &'static [&'static str] {
        &[
            "ka", "lo", "ri", "ma", "den", "sor", "val", "tan", "bel", "qu",
            "zen", "ora", "mir", "tes", "nu", "gal", "ves", "ar", "to", "lin",
            "ba", "ser", "kor", "eth", "dra", "mon", "fi", "har", "sul", "ye",
        ]
    }

    fn suffixes() -> &'static [&'static str] {
        &["ia", "land", "stan", "ora", "ea", "mar", "is", "onia"]
    }

    fn project_kinds() -> &'static [&'static str] {
        &[
            "Response",
            "Emergency Programme",
            "Resilience Project",
            "Integrated Assistance",
            "Recovery Initiative",
            "Outreach",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    #[test]
    fn name_generation_is_deterministic() {
        let mut rng1 = RngBank::new(12345).for_stream(StreamSlot::Names);
        let mut rng2 = RngBank::new(12345).for_stream(StreamSlot::Names);

        let name1 = NameGenerator::country_name(&mut rng1);
        let name2 = NameGenerator::country_name(&mut rng2);

        assert_eq!(name1, name2, "Same seed should produce same name");
    }

    #[test]
    fn generated_codes_are_unique_three_letter_codes() {
        let mut rng = RngBank::new(12345).for_stream(StreamSlot::Names);
        let mut names = NameGenerator::new();
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let (name, iso3) = names.country(&mut rng).expect("code space");
            assert!(!name.is_empty(), "Country name should not be empty");
            assert_eq!(iso3.len(), 3, "Code should have 3 characters: {}", iso3);
            assert!(seen.insert(iso3.clone()), "Duplicate code issued: {}", iso3);
        }
    }

    #[test]
    fn colliding_names_get_distinct_codes() {
        let mut names = NameGenerator::new();
        let first = names.iso3_for("Keloria").unwrap();
        let second = names.iso3_for("Kelmar").unwrap();
        assert_eq!(first, "KEL");
        assert_ne!(first, second);
        assert!(second.starts_with('K'), "Leading letter should be kept: {}", second);
    }
}
