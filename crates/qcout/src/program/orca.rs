use std::{fs::read_to_string, path::Path, sync::OnceLock};

use regex::Regex;

use crate::geom::Frame;

use super::{OutputError, Program, ProgramResult, parse_energy};

#[cfg(test)]
mod tests;

/// Orca geometry optimization output. The convergence contract is keyed on
/// three marker lines: `OPTIMIZATION RUN DONE` and `ORCA TERMINATED NORMALLY`
/// must both be present and `The optimization did not converge` must be
/// absent. Energies are taken from the last `FINAL SINGLE POINT ENERGY` line
/// and, when the run applied an external force, the last `External Potential`
/// line.
pub struct Orca;

static CELL: OnceLock<[Regex; 5]> = OnceLock::new();

fn markers() -> &'static [Regex; 5] {
    CELL.get_or_init(|| {
        [
            Regex::new("OPTIMIZATION RUN DONE").unwrap(),
            Regex::new("ORCA TERMINATED NORMALLY").unwrap(),
            Regex::new("The optimization did not converge").unwrap(),
            Regex::new("FINAL SINGLE POINT ENERGY").unwrap(),
            Regex::new("External Potential").unwrap(),
        ]
    })
}

fn read_lines(filename: &str) -> Result<String, OutputError> {
    if !Path::new(filename).exists() {
        return Err(OutputError::FileNotFound(filename.to_owned()));
    }
    read_to_string(filename)
        .map_err(|e| OutputError::ReadFileError(filename.to_owned(), e.kind()))
}

impl Program for Orca {
    fn read_output(filename: &str) -> Result<ProgramResult, OutputError> {
        let contents = read_lines(filename)?;
        let [run_done, terminated, no_conv, final_sp, ext_pot] = markers();

        let mut done = false;
        let mut normal = false;
        let mut energy = None;
        let mut external = None;
        for line in contents.lines() {
            if run_done.is_match(line) {
                done = true;
            } else if terminated.is_match(line) {
                normal = true;
            } else if no_conv.is_match(line) {
                return Err(OutputError::NotConverged(filename.to_owned()));
            } else if final_sp.is_match(line) {
                let nth = line.split_whitespace().count() - 1;
                energy = Some(parse_energy(line, nth, filename)?);
            } else if ext_pot.is_match(line) {
                external = Some(parse_energy(line, 3, filename)?);
            }
        }

        if !done || !normal {
            return Err(OutputError::NotConverged(filename.to_owned()));
        }

        let Some(energy) = energy else {
            return Err(OutputError::EnergyNotFound(filename.to_owned()));
        };

        Ok(ProgramResult {
            energy,
            external_potential: external,
        })
    }

    /// collect the geometries following each `CARTESIAN COORDINATES
    /// (ANGSTROEM)` marker (coordinates start two lines after it). N
    /// optimization cycles log N+1 geometries, the last a duplicate of the
    /// converged structure, so the final frame is dropped before returning.
    fn opt_frames(
        filename: &str,
        natoms: usize,
    ) -> Result<Vec<Frame>, OutputError> {
        let contents = read_lines(filename)?;
        let lines: Vec<&str> = contents.lines().collect();
        let mut frames = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if !line.contains("CARTESIAN COORDINATES (ANGSTROEM)") {
                continue;
            }
            let first = i + 2;
            let last = first + natoms;
            if last > lines.len() {
                return Err(OutputError::GeomParseError(filename.to_owned()));
            }
            let atoms = lines[first..last]
                .iter()
                .map(|l| l.parse())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| {
                    OutputError::GeomParseError(filename.to_owned())
                })?;
            frames.push(Frame::new(String::new(), atoms));
        }
        frames.pop();
        Ok(frames)
    }
}

impl Orca {
    /// like [Orca::read_output] but for a frequency run, taking the energy
    /// from the last `Final Gibbs free energy` line (second-to-last token)
    pub fn read_gibbs(filename: &str) -> Result<f64, OutputError> {
        let contents = read_lines(filename)?;
        let [run_done, terminated, no_conv, ..] = markers();

        let mut done = false;
        let mut normal = false;
        let mut gibbs = None;
        for line in contents.lines() {
            if run_done.is_match(line) {
                done = true;
            } else if terminated.is_match(line) {
                normal = true;
            } else if no_conv.is_match(line) {
                return Err(OutputError::NotConverged(filename.to_owned()));
            } else if line.contains("Final Gibbs free energy") {
                let nth = line.split_whitespace().count() - 2;
                gibbs = Some(parse_energy(line, nth, filename)?);
            }
        }

        if !done || !normal {
            return Err(OutputError::NotConverged(filename.to_owned()));
        }
        gibbs.ok_or_else(|| OutputError::EnergyNotFound(filename.to_owned()))
    }

    /// the amount of spin density not located on the metal, from the last
    /// `MULLIKEN ATOMIC CHARGES AND SPIN POPULATIONS` block. `metal` is the
    /// atomic symbol as printed by Orca
    pub fn spin_delocalization(
        filename: &str,
        metal: &str,
    ) -> Result<f64, OutputError> {
        let contents = read_lines(filename)?;
        let lines: Vec<&str> = contents.lines().collect();

        let last_block = lines
            .iter()
            .rposition(|l| {
                l.contains("MULLIKEN ATOMIC CHARGES AND SPIN POPULATIONS")
            })
            .ok_or_else(|| {
                OutputError::MarkerNotFound(filename.to_owned())
            })?;
        let total_line = lines
            .iter()
            .position(|l| l.contains("Sum of atomic spin populations"))
            .ok_or_else(|| {
                OutputError::MarkerNotFound(filename.to_owned())
            })?;

        let total = last_token(lines[total_line], filename)?;
        for line in &lines[last_block..] {
            if line.contains(metal) {
                let metal_spin = last_token(line, filename)?;
                return Ok(total - metal_spin);
            }
        }
        Err(OutputError::MarkerNotFound(filename.to_owned()))
    }
}

fn last_token(line: &str, outname: &str) -> Result<f64, OutputError> {
    let nth = line.split_whitespace().count().saturating_sub(1);
    parse_energy(line, nth, outname)
}
