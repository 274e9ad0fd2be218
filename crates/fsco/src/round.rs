//! Typed table cells. The screening table historically carried sentinel
//! strings mixed with numbers in its energy and force columns; these enums
//! keep the same serialized form while making the two kinds impossible to
//! confuse in code.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// a per-spin energy column entry: a converged total energy in hartree, or
/// one of the legacy status markers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnergyCell {
    Energy(f64),
    Status(Sentinel),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentinel {
    /// the job did not converge or its output is unreadable
    Failed,
    /// the job has not been run yet
    Unperformed,
    /// the spin state does not exist for this metal/oxidation pair
    #[serde(rename = "N/A")]
    NotApplicable,
    /// the structure dissociated, so no converged energy can exist
    Diss,
}

impl EnergyCell {
    pub fn energy(&self) -> Option<f64> {
        match self {
            Self::Energy(e) => Some(*e),
            Self::Status(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Status(Sentinel::Failed))
    }

    pub fn is_diss(&self) -> bool {
        matches!(self, Self::Status(Sentinel::Diss))
    }
}

impl Display for Sentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed => write!(f, "Failed"),
            Self::Unperformed => write!(f, "Unperformed"),
            Self::NotApplicable => write!(f, "N/A"),
            Self::Diss => write!(f, "Diss"),
        }
    }
}

impl Display for EnergyCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Energy(e) => write!(f, "{e}"),
            Self::Status(s) => write!(f, "{s}"),
        }
    }
}

/// a round's force column entry, in nN
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForceCell {
    Force(f64),
    Status(ForceStatus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceStatus {
    /// a failure in a previous round halted the scan; this round was never
    /// assigned a force
    #[serde(rename = "failed_unperformed")]
    FailedUnperformed,
    Unperformed,
}

impl ForceCell {
    pub fn force(&self) -> Option<f64> {
        match self {
            Self::Force(x) => Some(*x),
            Self::Status(_) => None,
        }
    }
}

impl Display for ForceCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Force(x) => write!(f, "{x}"),
            Self::Status(ForceStatus::FailedUnperformed) => {
                write!(f, "failed_unperformed")
            }
            Self::Status(ForceStatus::Unperformed) => write!(f, "Unperformed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_cell_serde() {
        let cells = vec![
            EnergyCell::Energy(-2158.1735),
            EnergyCell::Status(Sentinel::Failed),
            EnergyCell::Status(Sentinel::NotApplicable),
            EnergyCell::Status(Sentinel::Diss),
        ];
        let got = serde_json::to_string(&cells).unwrap();
        assert_eq!(got, r#"[-2158.1735,"Failed","N/A","Diss"]"#);
        let back: Vec<EnergyCell> = serde_json::from_str(&got).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn force_cell_serde() {
        let cells = vec![
            ForceCell::Force(1.5),
            ForceCell::Status(ForceStatus::FailedUnperformed),
        ];
        let got = serde_json::to_string(&cells).unwrap();
        assert_eq!(got, r#"[1.5,"failed_unperformed"]"#);
        let back: Vec<ForceCell> = serde_json::from_str(&got).unwrap();
        assert_eq!(back, cells);
    }
}
