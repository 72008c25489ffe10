use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::models::DisplayLanguage;

const DUA_JSON: &str = include_str!("../../data/dua.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dua {
    pub arabic: String,
    pub transliteration: String,
    pub translation: String,
}

impl Dua {
    pub fn text(&self, language: DisplayLanguage) -> &str {
        match language {
            DisplayLanguage::Arabic => &self.arabic,
            DisplayLanguage::Transliteration => &self.transliteration,
            DisplayLanguage::Translation => &self.translation,
        }
    }
}

pub fn parse_duas(json: &str) -> Result<Vec<Dua>> {
    let duas: Vec<Dua> = serde_json::from_str(json).context("Parsing dua collection")?;
    if duas.is_empty() {
        anyhow::bail!("Dua collection is empty");
    }
    Ok(duas)
}

/// The collection bundled into the binary, parsed on first use.
pub fn builtin_duas() -> Result<&'static [Dua]> {
    static DUAS: OnceLock<Vec<Dua>> = OnceLock::new();
    if let Some(duas) = DUAS.get() {
        return Ok(duas);
    }
    let parsed = parse_duas(DUA_JSON)?;
    Ok(DUAS.get_or_init(|| parsed))
}

/// Uniform pick. `None` only for an empty slice.
pub fn random_dua<'a, R: Rng + ?Sized>(duas: &'a [Dua], rng: &mut R) -> Option<&'a Dua> {
    duas.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn bundled_collection_parses() {
        let duas = builtin_duas().unwrap();
        assert!(duas.len() >= 10);
        assert!(duas.iter().all(|d| !d.arabic.is_empty()));
    }

    #[test]
    fn text_follows_language() {
        let dua = Dua {
            arabic: "سُبْحَانَ اللَّهِ".into(),
            transliteration: "Subhan Allah".into(),
            translation: "Glory be to Allah".into(),
        };
        assert_eq!(dua.text(DisplayLanguage::Transliteration), "Subhan Allah");
        assert_eq!(dua.text(DisplayLanguage::Translation), "Glory be to Allah");
    }

    #[test]
    fn random_pick_reaches_every_entry() {
        let duas = builtin_duas().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = vec![false; duas.len()];
        for _ in 0..2_000 {
            let picked = random_dua(duas, &mut rng).unwrap();
            let idx = duas.iter().position(|d| d == picked).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn empty_collection_is_an_error() {
        assert!(parse_duas("[]").is_err());
        assert!(random_dua(&[], &mut StdRng::seed_from_u64(1)).is_none());
    }
}
