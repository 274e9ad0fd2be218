use std::{fmt::Display, io, str::FromStr};

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::Vec3;

pub const NUMBER_TO_SYMBOL: [&str; 55] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg",
    "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn",
    "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb",
    "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe",
];

/// atomic numbers of the first-row transition metals screened in the EFEI
/// campaigns
const METALS: [usize; 5] = [24, 25, 26, 27, 28];

fn symbol_to_number(s: &str) -> Option<usize> {
    NUMBER_TO_SYMBOL.iter().position(|&x| x == s)
}

fn titlecase(s: &str) -> String {
    let cs: Vec<_> = s.chars().collect();
    let mut ret = String::from(cs[0]).to_uppercase();
    for c in cs.iter().skip(1) {
        ret.push_str(&c.to_lowercase().to_string());
    }
    ret
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Atom {
    pub atomic_number: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        let eps = 1e-8;
        let close = |a: f64, b: f64| (a - b).abs() < eps;
        self.atomic_number == other.atomic_number
            && close(self.x, other.x)
            && close(self.y, other.y)
            && close(self.z, other.z)
    }
}

impl AbsDiffEq for Atom {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-8
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < epsilon;
        self.atomic_number == other.atomic_number
            && close(self.x, other.x)
            && close(self.y, other.y)
            && close(self.z, other.z)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:2} {:15.10} {:15.10} {:15.10}",
            self.label(),
            self.x,
            self.y,
            self.z
        )
    }
}

impl FromStr for Atom {
    type Err = io::Error;

    /// parse an Atom from a line like
    ///  C 1.0 1.0 1.0
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = s.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(io::Error::other("wrong number of fields in Atom"));
        }
        let coord = fields[1..].iter().map(|s| s.parse());
        if coord.clone().any(|s| s.is_err()) {
            return Err(io::Error::other(
                "failed to parse coordinate field as f64",
            ));
        }
        let coord: Vec<_> = coord.flatten().collect();
        Ok(Self::new_from_label(
            fields[0], coord[0], coord[1], coord[2],
        ))
    }
}

impl Atom {
    pub fn new(atomic_number: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            atomic_number,
            x,
            y,
            z,
        }
    }

    pub fn new_from_label(atomic_symbol: &str, x: f64, y: f64, z: f64) -> Self {
        let sym = match symbol_to_number(atomic_symbol) {
            Some(s) => s,
            None => symbol_to_number(&titlecase(atomic_symbol)).unwrap_or_else(
                || panic!("failed to locate atomic symbol {atomic_symbol}"),
            ),
        };
        Self::new(sym, x, y, z)
    }

    #[inline]
    pub const fn label(&self) -> &str {
        debug_assert!(self.atomic_number != 0 && self.atomic_number < 55);
        NUMBER_TO_SYMBOL[self.atomic_number]
    }

    pub fn coord(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_metal(&self) -> bool {
        METALS.contains(&self.atomic_number)
    }
}

/// a single geometry snapshot in XYZ format: an atom-count line, a comment
/// line, and `natoms` coordinate lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub comment: String,
    pub atoms: Vec<Atom>,
}

impl Frame {
    pub fn new(comment: String, atoms: Vec<Atom>) -> Self {
        Self { comment, atoms }
    }

    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    /// distance in Å between the atoms at `i` and `j`
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.atoms[i].coord() - self.atoms[j].coord()).norm()
    }

    /// index of the first transition-metal atom, if any
    pub fn metal(&self) -> Option<usize> {
        self.atoms.iter().position(Atom::is_metal)
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.natoms())?;
        writeln!(f, "{}", self.comment)?;
        for atom in &self.atoms {
            writeln!(f, "{atom}")?;
        }
        Ok(())
    }
}

impl FromStr for Frame {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let natoms: usize = lines
            .next()
            .and_then(|l| l.split_whitespace().next())
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| io::Error::other("missing atom count line"))?;
        let comment = lines.next().unwrap_or_default().to_string();
        let atoms = lines.map(str::parse).collect::<Result<Vec<Atom>, _>>()?;
        if atoms.len() != natoms {
            return Err(io::Error::other(format!(
                "expected {natoms} atoms, got {}",
                atoms.len()
            )));
        }
        Ok(Self { comment, atoms })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("FE", "Fe"; "upper")]
    #[test_case("fe", "Fe"; "lower")]
    #[test_case("Fe", "Fe"; "title")]
    #[test_case("h", "H"; "single")]
    fn titlecase(got: &str, want: &str) {
        assert_eq!(super::titlecase(got), want);
    }

    #[test]
    fn frame_from_str() {
        let got: Frame = "3
water
O 0.0 0.0 -0.0657441581
H 0.0 0.7574590773 0.5217905246
H 0.0 -0.7574590773 0.5217905246
"
        .parse()
        .unwrap();
        assert_eq!(got.natoms(), 3);
        assert_eq!(got.comment, "water");
        assert_eq!(got.atoms[0].atomic_number, 8);
        assert!(got.metal().is_none());
    }

    #[test]
    fn distance() {
        let frame = Frame::new(
            String::new(),
            vec![Atom::new(26, 0.0, 0.0, 0.0), Atom::new(7, 0.0, 0.0, 2.0)],
        );
        assert_eq!(frame.distance(0, 1), 2.0);
        assert_eq!(frame.metal(), Some(0));
    }
}
