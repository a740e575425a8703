use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::services::normalize::normalize_card_name;

/// Normalized card name used as the key for every corpus and metadata lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CardId(String);

impl CardId {
    /// Normalizes a raw card name into an identifier
    pub fn new(raw_name: &str) -> Self {
        Self(normalize_card_name(raw_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CardId {
    fn from(raw_name: String) -> Self {
        Self::new(&raw_name)
    }
}

impl From<&str> for CardId {
    fn from(raw_name: &str) -> Self {
        Self::new(raw_name)
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the five card colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl Color {
    /// All colors in WUBRG order
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    pub fn letter(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Color::White => 1 << 0,
            Color::Blue => 1 << 1,
            Color::Black => 1 << 2,
            Color::Red => 1 << 3,
            Color::Green => 1 << 4,
        }
    }
}

/// Error returned when a color identity contains an unknown letter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid color letter: '{0}'")]
pub struct InvalidColor(pub char);

/// A color identity, stored as a five-bit set over WUBRG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColorIdentity(u8);

impl ColorIdentity {
    pub const COLORLESS: Self = Self(0);
    pub const ALL: Self = Self(0b1_1111);

    /// Number of distinct identities (every subset of WUBRG)
    pub const COMBINATIONS: usize = 32;

    pub fn with(self, color: Color) -> Self {
        Self(self.0 | color.bit())
    }

    pub fn contains(self, color: Color) -> bool {
        self.0 & color.bit() != 0
    }

    /// Returns true if every color of `other` is also in this identity
    pub fn contains_all(self, other: ColorIdentity) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: ColorIdentity) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_colorless(self) -> bool {
        self.0 == 0
    }

    /// Dense index in `0..COMBINATIONS`, usable as a table slot
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self((index as u8) & Self::ALL.0)
    }

    pub fn colors(self) -> impl Iterator<Item = Color> {
        Color::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Parses letters such as `"WUB"`; `C` (colorless) is accepted and adds nothing
    pub fn from_letters(letters: &str) -> Result<Self, InvalidColor> {
        letters
            .chars()
            .filter(|c| !c.is_whitespace())
            .try_fold(Self::COLORLESS, |identity, letter| {
                if letter.eq_ignore_ascii_case(&'c') {
                    return Ok(identity);
                }
                Color::from_letter(letter)
                    .map(|color| identity.with(color))
                    .ok_or(InvalidColor(letter))
            })
    }

    /// Parses a corpus bucket key (`"wub"`, `"Colorless"`).
    ///
    /// Bucket keys are matched one letter at a time; characters that are not
    /// color letters are ignored. `"colorless"` is deliberately special-cased
    /// to the empty identity so its "r" is not read as red.
    pub fn from_bucket_key(key: &str) -> Self {
        if key.trim().eq_ignore_ascii_case("colorless") {
            return Self::COLORLESS;
        }
        key.chars()
            .filter_map(Color::from_letter)
            .fold(Self::COLORLESS, ColorIdentity::with)
    }
}

impl Display for ColorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_colorless() {
            return write!(f, "C");
        }
        for color in self.colors() {
            write!(f, "{}", color.letter())?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for ColorIdentity {
    type Error = InvalidColor;

    fn try_from(letters: Vec<String>) -> Result<Self, Self::Error> {
        letters.iter().try_fold(Self::COLORLESS, |identity, part| {
            Ok(identity.union(Self::from_letters(part)?))
        })
    }
}

impl From<ColorIdentity> for Vec<String> {
    fn from(identity: ColorIdentity) -> Self {
        identity.colors().map(|c| c.letter().to_string()).collect()
    }
}

/// Card attributes the engine needs from the card database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardMetadata {
    #[serde(alias = "color_identity", default)]
    pub color_identity: ColorIdentity,
    #[serde(alias = "type_line")]
    pub type_line: String,
    #[serde(alias = "cmc", default)]
    pub mana_value: f64,
    #[serde(alias = "full_name")]
    pub display_name: String,
}

impl CardMetadata {
    /// A card is a land when its type line mentions "Land"
    pub fn is_land(&self) -> bool {
        self.type_line.contains("Land")
    }
}
