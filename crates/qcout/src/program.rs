use std::{error::Error, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::geom::Frame;

pub mod orca;
pub mod terachem;

/// the parsed result of a converged geometry optimization
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramResult {
    /// the last reported single-point energy in hartree
    pub energy: f64,

    /// the last reported external-potential energy term. absent for 0 nN
    /// baseline runs, where no force is applied
    pub external_potential: Option<f64>,
}

impl ProgramResult {
    /// the total energy: single-point energy plus the external-potential term
    /// when one was reported
    pub fn total(&self) -> f64 {
        self.energy + self.external_potential.unwrap_or(0.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum OutputError {
    FileNotFound(String),
    ReadFileError(String, std::io::ErrorKind),
    /// a convergence marker is missing or the engine reported that the
    /// optimization did not converge
    NotConverged(String),
    EnergyNotFound(String),
    EnergyParseError(String),
    GeomParseError(String),
    MarkerNotFound(String),
    EmptyFile(String),
}

impl OutputError {
    /// Returns `true` if the output error is [`NotConverged`].
    ///
    /// [`NotConverged`]: OutputError::NotConverged
    #[must_use]
    pub fn is_not_converged(&self) -> bool {
        matches!(self, Self::NotConverged(..))
    }

    /// Returns `true` if the output error is [`FileNotFound`].
    ///
    /// [`FileNotFound`]: OutputError::FileNotFound
    #[must_use]
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(..))
    }
}

impl Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for OutputError {}

/// A trait for reading the output files of a quantum chemistry engine. All of
/// the methods are pure, stateless reads: a missing or truncated file yields
/// an error, never a retry.
pub trait Program {
    /// determine the convergence status of the optimization logged in
    /// `filename` and extract its final energy
    fn read_output(filename: &str) -> Result<ProgramResult, OutputError>;

    /// extract the sequence of optimizer geometries logged in `filename` for
    /// a molecule of `natoms` atoms, in the order they were written
    fn opt_frames(
        filename: &str,
        natoms: usize,
    ) -> Result<Vec<Frame>, OutputError>;
}

/// parses the `nth` field of `line` into a float and returns
/// [OutputError::EnergyParseError] containing `outname` if it fails. a string
/// containing `outname` is allocated in the Err case
#[inline]
fn parse_energy(
    line: &str,
    nth: usize,
    outname: &str,
) -> Result<f64, OutputError> {
    line.split_whitespace()
        .nth(nth)
        .map(str::parse::<f64>)
        .transpose()
        .map_err(|_| OutputError::EnergyParseError(outname.to_owned()))?
        .ok_or_else(|| OutputError::EnergyParseError(outname.to_owned()))
}
