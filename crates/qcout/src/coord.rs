//! Structural classification of metal-complex frames. Deciding which atoms
//! coordinate the metal and how they group into ligands is the job of an
//! external structure toolkit; this module only consumes that information
//! through [CoordinationModel] and applies it frame by frame.

use std::{error::Error, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::geom::Frame;

#[derive(Debug, PartialEq, Eq)]
pub enum CoordError {
    /// the reference structure does not have exactly six coordinating atoms
    NotOctahedral(usize),
    /// a coordinating-atom index is out of bounds for the frame
    MissingAtom(usize),
    NoMetal,
}

impl Display for CoordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for CoordError {}

/// per-ligand dentate counts, e.g. `[3, 3]` for an intact bis-tridentate
/// complex
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denticity(pub Vec<usize>);

impl Denticity {
    /// both tridentate ligands fully bound
    pub fn is_intact(&self) -> bool {
        self.0 == [3, 3]
    }
}

/// classifies one geometry frame into per-ligand dentate counts
pub trait CoordinationModel {
    fn classify(&self, frame: &Frame) -> Result<Denticity, CoordError>;
}

/// A coordination model that avoids a full structural analysis per frame: a
/// metal-donor bond counts as bound while it is shorter than `ratio` times
/// its length in the reference frame. The metal index and the per-ligand
/// donor indices come from the external toolkit's breakdown of the reference
/// structure.
#[derive(Clone, Debug)]
pub struct BondRatioModel {
    metal: usize,
    ligands: Vec<Vec<usize>>,
    ratio: f64,
    /// reference bond length per donor, in ligand order
    reference: Vec<Vec<f64>>,
}

impl BondRatioModel {
    pub fn from_reference(
        frame: &Frame,
        metal: usize,
        ligands: Vec<Vec<usize>>,
        ratio: f64,
    ) -> Result<Self, CoordError> {
        if frame.atoms.get(metal).is_none() {
            return Err(CoordError::NoMetal);
        }
        let ndonors: usize = ligands.iter().map(Vec::len).sum();
        if ndonors != 6 {
            return Err(CoordError::NotOctahedral(ndonors));
        }
        let mut reference = Vec::with_capacity(ligands.len());
        for donors in &ligands {
            let mut bonds = Vec::with_capacity(donors.len());
            for &idx in donors {
                if frame.atoms.get(idx).is_none() {
                    return Err(CoordError::MissingAtom(idx));
                }
                bonds.push(frame.distance(metal, idx));
            }
            reference.push(bonds);
        }
        Ok(Self {
            metal,
            ligands,
            ratio,
            reference,
        })
    }

    /// how many of the six donor bonds are still bound in `frame`
    pub fn coordination_number(
        &self,
        frame: &Frame,
    ) -> Result<usize, CoordError> {
        Ok(self.classify(frame)?.0.iter().sum())
    }
}

impl CoordinationModel for BondRatioModel {
    fn classify(&self, frame: &Frame) -> Result<Denticity, CoordError> {
        let mut dents = Vec::with_capacity(self.ligands.len());
        for (donors, bonds) in self.ligands.iter().zip(&self.reference) {
            let mut dent = 0;
            for (&idx, &b0) in donors.iter().zip(bonds) {
                if frame.atoms.get(idx).is_none() {
                    return Err(CoordError::MissingAtom(idx));
                }
                if frame.distance(self.metal, idx) < b0 * self.ratio {
                    dent += 1;
                }
            }
            dents.push(dent);
        }
        Ok(Denticity(dents))
    }
}

/// the outcome of inspecting the tail of a trajectory for dissociation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DissStatus {
    /// every one of the last `window` frames shows a broken coordination
    /// motif
    Dissociated,
    /// at least one of the last `window` frames is intact
    Intact,
    /// fewer than `window` frames exist yet
    Insufficient,
}

impl DissStatus {
    /// collapse to the boolean the screening table records. Insufficient
    /// data counts as not dissociated
    pub fn dissociated(&self) -> bool {
        matches!(self, Self::Dissociated)
    }
}

/// inspect the last `window` frames of `frames`: dissociated only if every
/// one of them is broken
pub fn dissociated_tail(
    frames: &[Frame],
    model: &impl CoordinationModel,
    window: usize,
) -> Result<DissStatus, CoordError> {
    if window > frames.len() {
        return Ok(DissStatus::Insufficient);
    }
    for frame in &frames[frames.len() - window..] {
        if model.classify(frame)?.is_intact() {
            return Ok(DissStatus::Intact);
        }
    }
    Ok(DissStatus::Dissociated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Atom;

    fn octahedron(stretch: f64) -> Frame {
        let mut atoms = vec![Atom::new(26, 0.0, 0.0, 0.0)];
        for (x, y, z) in [
            (2.0, 0.0, 0.0),
            (-2.0, 0.0, 0.0),
            (0.0, 2.0, 0.0),
            (0.0, -2.0, 0.0),
            (0.0, 0.0, 2.0),
        ] {
            atoms.push(Atom::new(7, x, y, z));
        }
        // the donor pulled by the external force
        atoms.push(Atom::new(7, 0.0, 0.0, -2.0 * stretch));
        Frame::new(String::new(), atoms)
    }

    fn model() -> BondRatioModel {
        BondRatioModel::from_reference(
            &octahedron(1.0),
            0,
            vec![vec![1, 3, 5], vec![2, 4, 6]],
            1.5,
        )
        .unwrap()
    }

    #[test]
    fn intact() {
        let m = model();
        let got = m.classify(&octahedron(1.2)).unwrap();
        assert!(got.is_intact());
        assert_eq!(m.coordination_number(&octahedron(1.2)).unwrap(), 6);
    }

    #[test]
    fn broken() {
        let m = model();
        let got = m.classify(&octahedron(1.8)).unwrap();
        assert_eq!(got, Denticity(vec![3, 2]));
        assert!(!got.is_intact());
    }

    #[test]
    fn not_octahedral() {
        let got = BondRatioModel::from_reference(
            &octahedron(1.0),
            0,
            vec![vec![1, 3], vec![2, 4]],
            1.5,
        );
        assert_eq!(got.unwrap_err(), CoordError::NotOctahedral(4));
    }

    #[test]
    fn tail() {
        let m = model();
        let frames =
            vec![octahedron(1.0), octahedron(1.8), octahedron(2.0)];
        assert_eq!(
            dissociated_tail(&frames, &m, 2).unwrap(),
            DissStatus::Dissociated
        );
        assert_eq!(
            dissociated_tail(&frames, &m, 3).unwrap(),
            DissStatus::Intact
        );
        assert_eq!(
            dissociated_tail(&frames, &m, 4).unwrap(),
            DissStatus::Insufficient
        );
        assert!(!dissociated_tail(&frames, &m, 4)
            .unwrap()
            .dissociated());
    }
}
