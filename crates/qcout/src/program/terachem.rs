use std::{fs::read_to_string, path::Path};

use crate::{
    geom::Frame,
    traj::Trajectory,
};

use super::{OutputError, Program, ProgramResult, parse_energy};


/// hartree to kJ/mol
const HARTREE_TO_KJMOL: f64 = 2625.5;

/// kJ/(mol Å) to nN
const KJ_PER_ANG_TO_NN: f64 = 1.66 / 100.0;

/// Terachem COGEF output. A relaxed scan appends one frame per converged
/// scan step to `scan_optim.xyz`; the comment line of each frame carries a
/// `Converged` marker with the step energy (5th field) and the constrained
/// bond length in parentheses (7th field).
pub struct Terachem;

impl Program for Terachem {
    fn read_output(filename: &str) -> Result<ProgramResult, OutputError> {
        let scan = Scan::read_scan(filename)?;
        let Some(&energy) = scan.energies.last() else {
            return Err(OutputError::EnergyNotFound(filename.to_owned()));
        };
        Ok(ProgramResult {
            energy,
            external_potential: None,
        })
    }

    fn opt_frames(
        filename: &str,
        natoms: usize,
    ) -> Result<Vec<Frame>, OutputError> {
        let traj = Trajectory::load(filename)?;
        if traj.natoms != natoms {
            return Err(OutputError::GeomParseError(filename.to_owned()));
        }
        Ok(traj.frames().to_vec())
    }
}

/// the parsed contents of a `scan_optim.xyz` file: one entry per converged
/// scan step, plus the geometry frames themselves
#[derive(Clone, Debug, PartialEq)]
pub struct Scan {
    /// constrained bond length at each converged step, in Å
    pub distances: Vec<f64>,

    /// energy at each converged step, in hartree
    pub energies: Vec<f64>,

    pub frames: Vec<Frame>,
}

impl Scan {
    pub fn read_scan(filename: &str) -> Result<Self, OutputError> {
        if !Path::new(filename).exists() {
            return Err(OutputError::FileNotFound(filename.to_owned()));
        }
        let contents = read_to_string(filename).map_err(|e| {
            OutputError::ReadFileError(filename.to_owned(), e.kind())
        })?;

        let mut distances = Vec::new();
        let mut energies = Vec::new();
        for line in contents.lines() {
            if !line.contains("Converged") {
                continue;
            }
            energies.push(parse_energy(line, 4, filename)?);
            let dist = line
                .split_whitespace()
                .nth(6)
                .map(|t| t.replace(['(', ')'], ""))
                .ok_or_else(|| {
                    OutputError::EnergyParseError(filename.to_owned())
                })?;
            distances.push(dist.parse().map_err(|_| {
                OutputError::EnergyParseError(filename.to_owned())
            })?);
        }

        let traj: Trajectory = contents.parse()?;
        Ok(Self {
            distances,
            energies,
            frames: traj.frames().to_vec(),
        })
    }

    /// the peak force along the scan in nN, from the slope of the energy
    /// profile over the stretch step in Å. None for fewer than two steps
    pub fn max_force(&self, step: f64) -> Option<f64> {
        if self.energies.len() < 2 {
            return None;
        }
        let e0 = self.energies[0];
        let rels: Vec<f64> = self
            .energies
            .iter()
            .map(|e| (e - e0) * HARTREE_TO_KJMOL)
            .collect();
        rels.windows(2)
            .map(|w| (w[1] - w[0]) / step * KJ_PER_ANG_TO_NN)
            .fold(None, |acc, f| Some(acc.map_or(f, |a: f64| a.max(f))))
    }
}

/// the number of converged scan steps logged in `filename`. the 0 Å
/// optimization counts as a step, so a 10 Å stretch at 0.2 Å per step logs
/// 51. a missing file counts as 0
pub fn count_steps(filename: &str) -> usize {
    let Ok(contents) = read_to_string(filename) else {
        return 0;
    };
    contents.lines().filter(|l| l.contains("Converged")).count()
}

/// for each completed scan step in an `optim.xyz` file, the number of
/// optimizer iterations it took. frame numbers restart from 0 at each scan
/// step, so a step's count is the last frame number seen plus one
pub fn iters_each_step(filename: &str) -> Result<Vec<usize>, OutputError> {
    if !Path::new(filename).exists() {
        return Err(OutputError::FileNotFound(filename.to_owned()));
    }
    let contents = read_to_string(filename).map_err(|e| {
        OutputError::ReadFileError(filename.to_owned(), e.kind())
    })?;
    if contents.lines().count() < 2 {
        return Err(OutputError::EmptyFile(filename.to_owned()));
    }

    let mut nums = Vec::new();
    for line in contents.lines() {
        if line.contains("frame") {
            let n = line
                .split_whitespace()
                .nth(2)
                .and_then(|t| t.parse::<usize>().ok())
                .ok_or_else(|| {
                    OutputError::GeomParseError(filename.to_owned())
                })?;
            nums.push(n);
        }
    }

    let mut iters = Vec::new();
    for i in 1..nums.len() {
        if nums[i] == 0 {
            iters.push(nums[i - 1] + 1);
        }
    }
    Ok(iters)
}
