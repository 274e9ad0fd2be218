//! The screening table: one row per molecule, growing one set of round
//! columns per force probe. The table is the interchange format with the
//! job-generation tooling, so it serializes to JSON with the legacy sentinel
//! strings intact.

use std::{error::Error, fmt::Display, fs::File, path::Path};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    eval::{RoundObs, Step, Verdict, next_round, second_round},
    round::{EnergyCell, ForceCell, ForceStatus, Sentinel},
    spin::{PerSpin, SpinVerdict, ground_spin},
};

#[derive(Debug)]
pub enum TableError {
    Io(String, std::io::Error),
    Json(String, serde_json::Error),
}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{path}: {e}"),
            Self::Json(path, e) => write!(f, "{path}: {e}"),
        }
    }
}

impl Error for TableError {}

/// one completed (or pending) force probe of one molecule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub force: ForceCell,

    pub energies: PerSpin<EnergyCell>,

    /// whether the structure dissociated, per spin state
    pub diss: PerSpin<bool>,

    /// derived ground-spin classification, filled in by the analysis pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<SpinVerdict>,

    /// adiabatic spin splitting in kcal/mol, when every state converged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splitting: Option<f64>,
}

impl Round {
    /// a round whose force has been assigned but whose jobs have not been
    /// analyzed yet
    pub fn pending(force: f64) -> Self {
        Self {
            force: ForceCell::Force(force),
            energies: PerSpin::filled(EnergyCell::Status(
                Sentinel::Unperformed,
            )),
            diss: PerSpin::filled(false),
            spin: None,
            splitting: None,
        }
    }

    /// the placeholder appended when a failure halts the scan
    pub fn failed_unperformed() -> Self {
        Self {
            force: ForceCell::Status(ForceStatus::FailedUnperformed),
            energies: PerSpin::filled(EnergyCell::Status(
                Sentinel::Unperformed,
            )),
            diss: PerSpin::filled(false),
            spin: None,
            splitting: None,
        }
    }
}

/// the derived classification of a round
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoundResult {
    /// the scan was already halted before this round ran
    FailedUnperformed,
    Classified { spin: SpinVerdict, diss: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// six-letter CSD refcode of the molecule
    pub refcode: String,

    pub metal: String,

    /// oxidation state from the CSD curation
    pub ox: isize,

    /// index of the metal atom in the job geometries
    pub metal_idx: usize,

    /// coordinating-atom indices per ligand, from the structure toolkit's
    /// breakdown of the relaxed zero-force geometry
    pub ligands: Vec<Vec<usize>>,

    #[serde(default)]
    pub rounds: Vec<Round>,

    /// forces already probed in earlier rounds, in nN
    #[serde(default)]
    pub performed_forces: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl Row {
    /// the 1-indexed round `n`
    pub fn round(&self, n: usize) -> Option<&Round> {
        if n == 0 {
            return None;
        }
        self.rounds.get(n - 1)
    }

    pub fn round_mut(&mut self, n: usize) -> Option<&mut Round> {
        if n == 0 {
            return None;
        }
        self.rounds.get_mut(n - 1)
    }

    /// job basename for round `n` in the given spin state, matching the
    /// directory layout written by the input-generation tooling
    pub fn basename(&self, n: usize, spin: crate::spin::Spin) -> String {
        format!("{}_round{n}_{}", self.refcode, spin.suffix())
    }

    /// derive the (spin, dissociated) classification of round `n`.
    /// Dissociation in any spin state takes precedence over a failed energy
    pub fn round_result(
        &self,
        n: usize,
        two_state: bool,
    ) -> Option<RoundResult> {
        let round = self.round(n)?;
        if round.force == ForceCell::Status(ForceStatus::FailedUnperformed) {
            return Some(RoundResult::FailedUnperformed);
        }
        let mut spin = ground_spin(&round.energies, two_state);
        let diss = round.diss.ls || round.diss.is || round.diss.hs;
        if diss && spin == SpinVerdict::Failed {
            spin = SpinVerdict::Diss;
        }
        Some(RoundResult::Classified { spin, diss })
    }

    /// whether `force` was already probed in an earlier round
    pub fn performed(&self, force: f64) -> bool {
        self.performed_forces
            .iter()
            .any(|&f| (f - force).abs() < 1e-9)
    }

    /// decide the next probe force or terminal verdict from the most recent
    /// one or two rounds. None when no round has been analyzed yet
    pub fn plan_next(
        &self,
        step: f64,
        threshold: f64,
        two_state: bool,
    ) -> Option<Step> {
        let n = self.rounds.len();
        let curr = match self.obs(n, two_state)? {
            Ok(obs) => obs,
            Err(halt) => return Some(halt),
        };
        if n == 1 {
            return Some(second_round(&curr, step));
        }
        let prev = match self.obs(n - 1, two_state)? {
            Ok(obs) => obs,
            Err(halt) => return Some(halt),
        };
        Some(next_round(&prev, &curr, step, threshold))
    }

    /// the observation for round `n`, or the halting step when the round
    /// carries no usable force/classification
    fn obs(
        &self,
        n: usize,
        two_state: bool,
    ) -> Option<Result<RoundObs, Step>> {
        let round = self.round(n)?;
        let result = self.round_result(n, two_state)?;
        Some(match (result, round.force.force()) {
            (RoundResult::Classified { spin, diss }, Some(force)) => {
                Ok(RoundObs::new(force, spin, diss))
            }
            _ => Err(Step::Done(Verdict::FailedUnperformed)),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,

    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl Table {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TableError::Io(path.display().to_string(), e)
        })?;
        let mut ret: Self = serde_json::from_reader(f).map_err(|e| {
            TableError::Json(path.display().to_string(), e)
        })?;
        ret.rebuild_index();
        Ok(ret)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| {
            TableError::Io(path.display().to_string(), e)
        })?;
        serde_json::to_writer_pretty(f, self).map_err(|e| {
            TableError::Json(path.display().to_string(), e)
        })
    }

    pub fn get(&self, refcode: &str) -> Option<&Row> {
        self.index.get(refcode).map(|&i| &self.rows[i])
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.refcode.clone(), i))
            .collect();
    }
}
