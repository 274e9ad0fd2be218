//! Configuration settings for running an fsco pass

use std::{
    fmt::{Debug, Display},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::table::Row;

#[cfg(test)]
mod tests;

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// Path to the screening table JSON.
    table: String,

    /// Directory holding the per-job directories, one per
    /// (molecule, round, spin) with the layout `basename/basename.out`.
    data_dir: String,

    /// The quantum chemistry engine that produced the outputs.
    /// Currently-supported values are "orca" and "terachem".
    program: Program,

    /// The 1-indexed round whose outputs to ingest before evaluating.
    round: usize,

    /// The force increment between rounds in nN. Defaults to 0.5.
    force_step: Option<f64>,

    /// The force ceiling in nN: a computed probe force above this concludes
    /// the scan as a threshold non-SCO. Defaults to 5.
    force_threshold: Option<f64>,

    /// How many trailing optimizer frames must all be broken before a job
    /// counts as dissociated. Defaults to 10.
    diss_window: Option<usize>,

    /// A metal-donor bond counts as broken when longer than this ratio
    /// times its reference length. Defaults to 1.5.
    bond_ratio: Option<f64>,

    /// Metal/oxidation pairs with no intermediate spin state, so only LS
    /// and HS compete. Defaults to Co(II).
    two_state: Option<Vec<TwoState>>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Program {
    #[serde(alias = "orca")]
    Orca,
    #[serde(alias = "terachem")]
    Terachem,
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Program::Orca => write!(f, "orca"),
            Program::Terachem => write!(f, "terachem"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TwoState {
    pub metal: String,
    pub ox: isize,
}

/// Construct a full `Config` using [Config::load] on a TOML file
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(from = "RawConfig")]
pub struct Config {
    /// path to the screening table JSON
    pub table: String,

    /// directory holding the per-job directories
    pub data_dir: String,

    /// the engine that produced the outputs, as deserialized from [Program]
    pub program: Program,

    /// the 1-indexed round whose outputs to ingest
    pub round: usize,

    /// force increment between rounds in nN
    pub force_step: f64,

    /// force ceiling in nN for the threshold non-SCO conclusion
    pub force_threshold: f64,

    /// trailing-frame window for the dissociation check
    pub diss_window: usize,

    /// broken-bond length ratio for the coordination model
    pub bond_ratio: f64,

    /// metal/oxidation pairs with only LS and HS states
    pub two_state: Vec<TwoState>,
}

impl From<RawConfig> for Config {
    fn from(rc: RawConfig) -> Self {
        Self {
            table: rc.table,
            data_dir: rc.data_dir,
            program: rc.program,
            round: rc.round,
            force_step: rc.force_step.unwrap_or(0.5),
            force_threshold: rc.force_threshold.unwrap_or(5.0),
            diss_window: rc.diss_window.unwrap_or(10),
            bond_ratio: rc.bond_ratio.unwrap_or(1.5),
            two_state: rc.two_state.unwrap_or_else(|| {
                vec![TwoState {
                    metal: "Co".to_string(),
                    ox: 2,
                }]
            }),
        }
    }
}

impl Config {
    /// load a [Config] from the TOML file specified by `filename`. panics on
    /// failure to read the file and on failure to deserialize it
    pub fn load<P>(filename: P) -> Self
    where
        P: AsRef<Path> + Debug,
    {
        let contents = std::fs::read_to_string(&filename)
            .expect("failed to load config file");
        let ret: Self = toml::from_str(&contents).unwrap_or_else(|e| {
            panic!("failed to deserialize config file '{filename:?}' with {e}")
        });

        ret.validate();

        ret
    }

    /// check that the settings in `self` make any sense
    fn validate(&self) {
        if self.round < 1 {
            eprintln!("In fsco.toml: round must be at least 1, exiting");
            std::process::exit(1);
        }
        if self.force_step <= 0.0 {
            eprintln!(
                "In fsco.toml: force_step ({}) must be positive, exiting",
                self.force_step
            );
            std::process::exit(1);
        }
        if self.force_threshold <= self.force_step {
            eprintln!(
                "In fsco.toml: force_threshold ({}) must exceed \
                 force_step ({}), exiting",
                self.force_threshold, self.force_step
            );
            std::process::exit(1);
        }
    }

    /// whether `row`'s metal/oxidation pair has only LS and HS spin states
    pub fn is_two_state(&self, row: &Row) -> bool {
        self.two_state
            .iter()
            .any(|t| t.metal == row.metal && t.ox == row.ox)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Config {
            table,
            data_dir,
            program,
            round,
            force_step,
            force_threshold,
            diss_window,
            bond_ratio,
            two_state,
        } = self;
        write!(
            f,
            "
Configuration Options:
table = {table}
data_dir = {data_dir}
program = {program}
round = {round}
force_step = {force_step}
force_threshold = {force_threshold}
diss_window = {diss_window}
bond_ratio = {bond_ratio}
"
        )?;
        write!(f, "two_state = [ ")?;
        for t in two_state {
            write!(f, "{}({}), ", t.metal, t.ox)?;
        }
        writeln!(f, "]")
    }
}
