//! The round-wise force-scan decision. Given the classifications of the two
//! most recent rounds, decide the next force magnitude to probe or conclude
//! a terminal verdict for the molecule.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::spin::{Spin, SpinVerdict};

/// the observed state of one completed round
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundObs {
    /// applied force in nN
    pub force: f64,
    pub spin: SpinVerdict,
    /// dissociated in at least one spin state
    pub diss: bool,
}

impl RoundObs {
    pub fn new(force: f64, spin: SpinVerdict, diss: bool) -> Self {
        Self { force, spin, diss }
    }
}

/// a terminal classification of the scan for one molecule
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    /// structurally intact but stays low-spin under any force that does not
    /// break it
    NonSco,
    /// the probe force exceeded the scan ceiling without a crossover
    ThresholdNonSco,
    /// dissociated at a lower force than a prior intact IS/HS round: the
    /// observations are inconsistent
    DissError,
    /// spin crossover bracketed between the two force magnitudes, low then
    /// high
    Sco(f64, f64),
    /// a failed round halts the scan permanently
    FailedUnperformed,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonSco => write!(f, "concluded nonSCO"),
            Self::ThresholdNonSco => write!(f, "concluded-threshold nonSCO"),
            Self::DissError => write!(f, "Diss Error"),
            // the zero-force boundary prints without a decimal point, as the
            // downstream tooling expects
            Self::Sco(lo, hi) if *lo == 0.0 => write!(f, "SCO 0 {hi:?}"),
            Self::Sco(lo, hi) => write!(f, "SCO {lo:?} {hi:?}"),
            Self::FailedUnperformed => write!(f, "failed_unperformed"),
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concluded nonSCO" => return Ok(Self::NonSco),
            "concluded-threshold nonSCO" => return Ok(Self::ThresholdNonSco),
            "Diss Error" => return Ok(Self::DissError),
            "failed_unperformed" => return Ok(Self::FailedUnperformed),
            _ => {}
        }
        let fields: Vec<&str> = s.split_whitespace().collect();
        if let ["SCO", lo, hi] = fields[..] {
            let lo = lo.parse().map_err(|_| s.to_owned())?;
            let hi = hi.parse().map_err(|_| s.to_owned())?;
            return Ok(Self::Sco(lo, hi));
        }
        Err(format!("unknown verdict {s}"))
    }
}

impl Serialize for Verdict {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// the outcome of one evaluation: probe again at a new force, or stop
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Continue(f64),
    Done(Verdict),
}

/// Decide round 2 from round 1 alone (there is no earlier history). Round 1
/// probes at 1 nN; a molecule that dissociated or left LS there needs a
/// lower force, one that stayed LS needs a higher one.
pub fn second_round(first: &RoundObs, step: f64) -> Step {
    match first.spin {
        SpinVerdict::Failed if !first.diss => {
            Step::Done(Verdict::FailedUnperformed)
        }
        _ if first.diss => Step::Continue(first.force - step),
        SpinVerdict::Ground(Spin::Is | Spin::Hs) | SpinVerdict::Diss => {
            Step::Continue(first.force - step)
        }
        SpinVerdict::Ground(Spin::Ls) => Step::Continue(first.force + step),
        SpinVerdict::Failed => Step::Done(Verdict::FailedUnperformed),
    }
}

/// Decide round n from rounds n-1 (`curr`) and n-2 (`prev`). A `Failed`
/// classification at `curr` is the only fatal condition: the scan halts
/// permanently. A computed force of exactly 0 nN with an IS/HS
/// classification is the boundary case `SCO 0 <step>`, and any computed
/// force above `threshold` concludes the scan without a crossover.
pub fn next_round(
    prev: &RoundObs,
    curr: &RoundObs,
    step: f64,
    threshold: f64,
) -> Step {
    use SpinVerdict::*;

    if curr.spin == Failed {
        return Step::Done(Verdict::FailedUnperformed);
    }

    let next = if prev.diss || prev.spin == Diss {
        if curr.diss {
            // still dissociating: keep backing off
            Step::Continue(curr.force - step)
        } else {
            match curr.spin {
                // intact but already past the crossover: the intact LS
                // region must be at a still lower force
                Ground(Spin::Is | Spin::Hs) => {
                    Step::Continue(curr.force - step)
                }
                // intact and low-spin: no crossover exists for this molecule
                Ground(Spin::Ls) => Step::Done(Verdict::NonSco),
                Failed | Diss => Step::Done(Verdict::FailedUnperformed),
            }
        }
    } else {
        match prev.spin {
            Ground(Spin::Ls) => {
                if curr.diss {
                    Step::Done(Verdict::NonSco)
                } else {
                    match curr.spin {
                        Ground(Spin::Ls) => Step::Continue(curr.force + step),
                        Ground(Spin::Is | Spin::Hs) => {
                            Step::Done(Verdict::Sco(prev.force, curr.force))
                        }
                        Failed | Diss => {
                            Step::Done(Verdict::FailedUnperformed)
                        }
                    }
                }
            }
            Ground(Spin::Is | Spin::Hs) => {
                if curr.diss {
                    // it survived a larger force in the previous round
                    Step::Done(Verdict::DissError)
                } else {
                    match curr.spin {
                        Ground(Spin::Ls) => {
                            Step::Done(Verdict::Sco(curr.force, prev.force))
                        }
                        Ground(Spin::Is | Spin::Hs) => {
                            Step::Continue(curr.force - step)
                        }
                        Failed | Diss => {
                            Step::Done(Verdict::FailedUnperformed)
                        }
                    }
                }
            }
            // a failed previous round would already have halted the scan
            Failed | Diss => Step::Done(Verdict::FailedUnperformed),
        }
    };

    match next {
        Step::Continue(f)
            if f == 0.0
                && matches!(curr.spin, Ground(Spin::Is | Spin::Hs)) =>
        {
            Step::Done(Verdict::Sco(0.0, step))
        }
        Step::Continue(f) if f > threshold => {
            Step::Done(Verdict::ThresholdNonSco)
        }
        s => s,
    }
}
