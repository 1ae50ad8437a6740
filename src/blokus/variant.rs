use crate::utils::prelude::*;

/// Upper bound on colors across all variants; result arrays are sized
/// separately because Classic-3 duplicates per-player results.
pub const MAX_COLORS: usize = 4;

/// Number of slots in a playout result array.
pub const MAX_RESULTS: usize = 6;

/// A player color. In two-players-with-two-colors variants a player owns
/// two of these; wins and losses are pooled per player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color(pub u8);

impl Color {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterates the first `nu_colors` colors in play order.
    pub fn all(nu_colors: usize) -> impl Iterator<Item = Color> {
        (0..nu_colors as u8).map(Color)
    }
}

/// A fixed-size per-color table. Slots beyond the variant's color count
/// stay at their default and are never read.
#[derive(Clone, Debug, Default)]
pub struct ColorMap<T>([T; MAX_COLORS]);

impl<T> ColorMap<T> {
    pub fn from_fn(mut f: impl FnMut(Color) -> T) -> ColorMap<T> {
        ColorMap(std::array::from_fn(|i| f(Color(i as u8))))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.0.iter_mut()
    }
}

impl<T> std::ops::Index<Color> for ColorMap<T> {
    type Output = T;
    #[inline]
    fn index(&self, c: Color) -> &T {
        &self.0[c.index()]
    }
}

impl<T> std::ops::IndexMut<Color> for ColorMap<T> {
    #[inline]
    fn index_mut(&mut self, c: Color) -> &mut T {
        &mut self.0[c.index()]
    }
}

/// The board family a variant is played on.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BoardType {
    /// 20x20 square board.
    Classic = 0,
    /// 14x14 square board.
    Duo = 1,
    /// Hexagon of side 9 on a 35x18 triangle grid.
    Trigon = 2,
    /// Hexagon of side 8 on a 31x16 triangle grid.
    Trigon3 = 3,
}

impl BoardType {
    /// Triangle rows are flatter than they are wide; distance computations
    /// scale the y axis by this factor.
    pub fn y_ratio(self) -> f32 {
        match self {
            BoardType::Trigon | BoardType::Trigon3 => 1.732,
            _ => 1.0,
        }
    }

    pub fn is_trigon(self) -> bool {
        matches!(self, BoardType::Trigon | BoardType::Trigon3)
    }
}

/// A game variant.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Variant {
    Duo = 0,
    Junior = 1,
    Classic = 2,
    Classic2 = 3,
    Classic3 = 4,
    Trigon = 5,
    Trigon2 = 6,
    Trigon3 = 7,
}

impl Variant {
    pub fn board_type(self) -> BoardType {
        match self {
            Variant::Duo | Variant::Junior => BoardType::Duo,
            Variant::Classic | Variant::Classic2 | Variant::Classic3 => BoardType::Classic,
            Variant::Trigon | Variant::Trigon2 => BoardType::Trigon,
            Variant::Trigon3 => BoardType::Trigon3,
        }
    }

    pub fn nu_colors(self) -> usize {
        match self {
            Variant::Duo | Variant::Junior => 2,
            Variant::Trigon3 => 3,
            _ => 4,
        }
    }

    pub fn nu_players(self) -> usize {
        match self {
            Variant::Duo | Variant::Junior | Variant::Classic2 | Variant::Trigon2 => 2,
            Variant::Classic3 | Variant::Trigon3 => 3,
            Variant::Classic | Variant::Trigon => 4,
        }
    }

    /// The partner color in two-colors-per-player variants, the color
    /// itself everywhere else.
    pub fn second_color(self, c: Color) -> Color {
        match self {
            Variant::Classic2 | Variant::Trigon2 => Color(c.0 ^ 2),
            _ => c,
        }
    }

    /// Whether each piece shape exists exactly once per color.
    pub fn one_instance_per_piece(self) -> bool {
        self != Variant::Junior
    }

    /// Variants whose board and rules admit the mirror-copy strategy.
    pub fn has_symmetry_detection(self) -> bool {
        matches!(self, Variant::Duo | Variant::Junior | Variant::Trigon2)
    }

    pub fn all() -> [Variant; 8] {
        [
            Variant::Duo,
            Variant::Junior,
            Variant::Classic,
            Variant::Classic2,
            Variant::Classic3,
            Variant::Trigon,
            Variant::Trigon2,
            Variant::Trigon3,
        ]
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Variant::Duo => "duo",
            Variant::Junior => "junior",
            Variant::Classic => "classic",
            Variant::Classic2 => "classic2",
            Variant::Classic3 => "classic3",
            Variant::Trigon => "trigon",
            Variant::Trigon2 => "trigon2",
            Variant::Trigon3 => "trigon3",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Variant {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duo" => Ok(Variant::Duo),
            "junior" => Ok(Variant::Junior),
            "classic" => Ok(Variant::Classic),
            "classic2" | "classic-2" => Ok(Variant::Classic2),
            "classic3" | "classic-3" => Ok(Variant::Classic3),
            "trigon" => Ok(Variant::Trigon),
            "trigon2" | "trigon-2" => Ok(Variant::Trigon2),
            "trigon3" | "trigon-3" => Ok(Variant::Trigon3),
            _ => Err(anyhow!("unknown game variant {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_colors_pair_up() {
        assert_eq!(Variant::Classic2.second_color(Color(0)), Color(2));
        assert_eq!(Variant::Classic2.second_color(Color(3)), Color(1));
        assert_eq!(Variant::Trigon2.second_color(Color(1)), Color(3));
        assert_eq!(Variant::Duo.second_color(Color(1)), Color(1));
        assert_eq!(Variant::Classic.second_color(Color(2)), Color(2));
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!("duo".parse::<Variant>().unwrap(), Variant::Duo);
        assert_eq!("classic-2".parse::<Variant>().unwrap(), Variant::Classic2);
        assert!("gomoku".parse::<Variant>().is_err());
    }
}
