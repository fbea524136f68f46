//! Six-string chord assembly in standard tuning.
//!
//! Every fretted string is a [`StringSynthesizer`] over its vibrating length
//! `L - fret_offset(L, fret)`, plucked the same way, with a propagation speed
//! raised by the string's semitone offset above low E.

use crate::error::{ensure_in_domain, OscilloError, Result};
use crate::fretboard::{effective_length, fret_offset, FRETS_PER_OCTAVE};
use crate::string::StringSynthesizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuitarString {
    LowE,
    A,
    D,
    G,
    B,
    HighE,
}

impl GuitarString {
    pub const ALL: [GuitarString; 6] = [
        GuitarString::LowE,
        GuitarString::A,
        GuitarString::D,
        GuitarString::G,
        GuitarString::B,
        GuitarString::HighE,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            GuitarString::LowE => "E",
            GuitarString::A => "A",
            GuitarString::D => "D",
            GuitarString::G => "G",
            GuitarString::B => "B",
            GuitarString::HighE => "e",
        }
    }

    /// Semitones above the low E string.
    pub fn semitones(self) -> u32 {
        match self {
            GuitarString::LowE => 0,
            GuitarString::A => 5,
            GuitarString::D => 10,
            GuitarString::G => 15,
            GuitarString::B => 19,
            GuitarString::HighE => 24,
        }
    }

    pub fn speed_multiplier(self) -> f64 {
        (self.semitones() as f64 / FRETS_PER_OCTAVE as f64).exp2()
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.symbol() == symbol)
    }
}

impl fmt::Display for GuitarString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordName {
    EMinor,
    G,
    D,
    A,
}

impl ChordName {
    pub const ALL: [ChordName; 4] = [ChordName::EMinor, ChordName::G, ChordName::D, ChordName::A];

    pub fn symbol(self) -> &'static str {
        match self {
            ChordName::EMinor => "Em",
            ChordName::G => "G",
            ChordName::D => "D",
            ChordName::A => "A",
        }
    }

    /// Fret held on each sounding string. Strings not listed are muted.
    pub fn frets(self) -> &'static [(GuitarString, u32)] {
        use GuitarString::*;
        match self {
            ChordName::EMinor => &[(LowE, 0), (A, 2), (D, 2), (G, 0), (B, 0), (HighE, 0)],
            ChordName::G => &[(LowE, 3), (A, 2), (D, 0), (G, 0), (B, 0), (HighE, 3)],
            ChordName::D => &[(D, 0), (G, 2), (B, 3), (HighE, 2)],
            ChordName::A => &[(A, 0), (D, 2), (G, 2), (B, 2), (HighE, 0)],
        }
    }
}

impl FromStr for ChordName {
    type Err = OscilloError;

    fn from_str(s: &str) -> Result<Self> {
        ChordName::ALL
            .into_iter()
            .find(|chord| chord.symbol() == s)
            .ok_or_else(|| OscilloError::UnknownChord { name: s.to_string() })
    }
}

impl fmt::Display for ChordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Neck and pluck parameters shared by every string of a chord.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChordConfig {
    pub scale_length: f64,
    pub pluck_distance: f64,
    pub wave_speed: f64,
    pub order: usize,
    pub peak: f64,
    pub gamma: f64,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            scale_length: 4.0,
            pluck_distance: 0.5,
            wave_speed: 1.5,
            order: 2,
            peak: 0.6,
            gamma: 0.125,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordString {
    pub fret: u32,
    pub fret_offset: f64,
    pub effective_length: f64,
    pub synthesizer: StringSynthesizer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    name: Option<ChordName>,
    config: ChordConfig,
    strings: BTreeMap<GuitarString, ChordString>,
}

impl Chord {
    pub fn build(name: ChordName, config: &ChordConfig) -> Result<Self> {
        let mut chord = Self::from_frets(name.frets(), config)?;
        chord.name = Some(name);
        debug!(chord = %name, strings = chord.strings.len(), "chord assembled");
        Ok(chord)
    }

    /// Looks `name` up ("Em", "G", "D", "A") and assembles it.
    pub fn assemble(
        name: &str,
        scale_length: f64,
        pluck_distance: f64,
        wave_speed: f64,
        order: usize,
        peak: f64,
        gamma: f64,
    ) -> Result<Self> {
        let config = ChordConfig {
            scale_length,
            pluck_distance,
            wave_speed,
            order,
            peak,
            gamma,
        };
        Self::build(name.parse()?, &config)
    }

    /// Assembles an arbitrary fingering. A string listed twice keeps its last fret.
    pub fn from_frets(frets: &[(GuitarString, u32)], config: &ChordConfig) -> Result<Self> {
        let mut strings = BTreeMap::new();
        for &(string, fret) in frets {
            let length = effective_length(config.scale_length, fret)?;
            let synthesizer = StringSynthesizer::get_string(
                config.pluck_distance,
                config.peak,
                length,
                config.wave_speed * string.speed_multiplier(),
                config.order,
                config.gamma,
            )?;
            strings.insert(
                string,
                ChordString {
                    fret,
                    fret_offset: fret_offset(config.scale_length, fret)?,
                    effective_length: length,
                    synthesizer,
                },
            );
        }
        Ok(Self {
            name: None,
            config: *config,
            strings,
        })
    }

    pub fn name(&self) -> Option<ChordName> {
        self.name
    }

    pub fn config(&self) -> &ChordConfig {
        &self.config
    }

    pub fn get(&self, string: GuitarString) -> Option<&ChordString> {
        self.strings.get(&string)
    }

    /// Sounding strings from low E to high e.
    pub fn iter(&self) -> impl Iterator<Item = (GuitarString, &ChordString)> {
        self.strings.iter().map(|(s, c)| (*s, c))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Displacement at neck coordinate `x ∈ [fret_offset, L]`, measured from the nut.
    ///
    /// Muted strings report `None`.
    pub fn displacement_on_neck(
        &self,
        string: GuitarString,
        t: f64,
        x: f64,
    ) -> Result<Option<f64>> {
        match self.strings.get(&string) {
            Some(entry) => {
                ensure_in_domain("x", x, entry.fret_offset, self.config.scale_length)?;
                let local = (x - entry.fret_offset).clamp(0.0, entry.effective_length);
                entry.synthesizer.displacement(t, local).map(Some)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_major_uses_the_listed_frets() {
        let chord = Chord::build(ChordName::A, &ChordConfig::default()).expect("chord");
        let frets: Vec<(&str, u32)> = chord.iter().map(|(s, c)| (s.symbol(), c.fret)).collect();
        assert_eq!(frets, vec![("A", 0), ("D", 2), ("G", 2), ("B", 2), ("e", 0)]);
        assert!(chord.get(GuitarString::LowE).is_none());
    }

    #[test]
    fn effective_length_subtracts_the_fret_offset() {
        let chord = Chord::build(ChordName::A, &ChordConfig::default()).expect("chord");
        let d_string = chord.get(GuitarString::D).expect("D sounds");
        assert!((d_string.fret_offset - 0.4364).abs() < 1e-4);
        assert!((d_string.effective_length - 3.5636).abs() < 1e-4);
        assert_eq!(d_string.synthesizer.length(), d_string.effective_length);

        let open_a = chord.get(GuitarString::A).expect("A sounds");
        assert_eq!(open_a.effective_length, 4.0);
    }

    #[test]
    fn string_speeds_follow_tuning() {
        let config = ChordConfig::default();
        let chord = Chord::build(ChordName::EMinor, &config).expect("chord");
        assert_eq!(chord.len(), 6);
        for (string, entry) in chord.iter() {
            let expected = config.wave_speed * (string.semitones() as f64 / 12.0).exp2();
            assert_eq!(entry.synthesizer.config().wave_speed, expected);
        }
        assert!((GuitarString::HighE.speed_multiplier() - 4.0).abs() < 1e-14);
    }

    #[test]
    fn every_chord_assembles_from_its_name() {
        for name in ["Em", "G", "D", "A"] {
            let chord = Chord::assemble(name, 4.0, 0.5, 1.5, 2, 0.6, 0.125).expect("known chord");
            assert_eq!(chord.name().map(|c| c.symbol()), Some(name));
        }
        let d = Chord::build(ChordName::D, &ChordConfig::default()).expect("D");
        assert_eq!(d.len(), 4);
    }

    #[test]
    fn unknown_chord_is_a_lookup_error() {
        let err = Chord::assemble("Z", 4.0, 0.5, 1.5, 2, 0.6, 0.125).expect_err("no Z chord");
        assert_eq!(err, OscilloError::UnknownChord { name: "Z".into() });
        assert_eq!(err.to_string(), "Unknown chord `Z`");
    }

    #[test]
    fn neck_coordinates_start_at_the_fret() {
        let chord = Chord::build(ChordName::A, &ChordConfig::default()).expect("chord");
        let d_string = chord.get(GuitarString::D).expect("D sounds").clone();
        let offset = d_string.fret_offset;

        let on_neck = chord
            .displacement_on_neck(GuitarString::D, 0.7, offset + 1.0)
            .expect("on neck")
            .expect("D sounds");
        let local = d_string.synthesizer.displacement(0.7, 1.0).expect("local");
        assert!((on_neck - local).abs() < 1e-12);

        assert!(chord.displacement_on_neck(GuitarString::D, 0.7, 0.1).is_err());
        assert_eq!(
            chord.displacement_on_neck(GuitarString::LowE, 0.7, 1.0).expect("muted"),
            None
        );
    }

    #[test]
    fn invalid_pluck_propagates() {
        let config = ChordConfig {
            pluck_distance: 3.8,
            ..ChordConfig::default()
        };
        // 3.8 fits the open string but not one fretted at the 2nd fret
        let err = Chord::build(ChordName::A, &config).expect_err("pluck beyond string");
        assert!(err.to_string().contains("distance"));
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: ChordConfig =
            serde_json::from_str(r#"{"order": 6}"#).expect("partial config parses");
        assert_eq!(config.order, 6);
        assert_eq!(config.scale_length, 4.0);
        assert_eq!(GuitarString::from_symbol("e"), Some(GuitarString::HighE));
    }
}
