use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::round::EnergyCell;

/// hartree to kcal/mol
const HARTREE_TO_KCAL: f64 = 627.509;

/// electronic spin multiplicity class of a metal complex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spin {
    #[serde(rename = "LS")]
    Ls,
    #[serde(rename = "IS")]
    Is,
    #[serde(rename = "HS")]
    Hs,
}

impl Display for Spin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ls => write!(f, "LS"),
            Self::Is => write!(f, "IS"),
            Self::Hs => write!(f, "HS"),
        }
    }
}

impl Spin {
    /// directory/file suffix used by the job naming convention
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Ls => "LS",
            Self::Is => "IS",
            Self::Hs => "HS",
        }
    }
}

/// one value per spin state
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerSpin<T> {
    pub ls: T,
    pub is: T,
    pub hs: T,
}

impl<T> PerSpin<T> {
    pub fn get(&self, spin: Spin) -> &T {
        match spin {
            Spin::Ls => &self.ls,
            Spin::Is => &self.is,
            Spin::Hs => &self.hs,
        }
    }

    pub fn get_mut(&mut self, spin: Spin) -> &mut T {
        match spin {
            Spin::Ls => &mut self.ls,
            Spin::Is => &mut self.is,
            Spin::Hs => &mut self.hs,
        }
    }
}

impl<T: Clone> PerSpin<T> {
    pub fn filled(value: T) -> Self {
        Self {
            ls: value.clone(),
            is: value.clone(),
            hs: value,
        }
    }
}

/// the derived per-round classification of a molecule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SpinVerdict {
    Ground(Spin),
    /// at least one spin-state job failed and the molecule did not
    /// dissociate
    Failed,
    /// dissociated in at least one spin state
    Diss,
}

impl Display for SpinVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ground(s) => write!(f, "{s}"),
            Self::Failed => write!(f, "Failed"),
            Self::Diss => write!(f, "diss"),
        }
    }
}

impl From<SpinVerdict> for String {
    fn from(value: SpinVerdict) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for SpinVerdict {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "LS" => Ok(Self::Ground(Spin::Ls)),
            "IS" => Ok(Self::Ground(Spin::Is)),
            "HS" => Ok(Self::Ground(Spin::Hs)),
            "Failed" => Ok(Self::Failed),
            "diss" => Ok(Self::Diss),
            _ => Err(format!("unknown spin verdict {value}")),
        }
    }
}

/// the spin states that exist for a molecule. Co(II) d7 complexes have no
/// intermediate spin state, so only LS and HS compete
fn states(two_state: bool) -> &'static [Spin] {
    if two_state {
        &[Spin::Ls, Spin::Hs]
    } else {
        &[Spin::Ls, Spin::Is, Spin::Hs]
    }
}

/// the ground spin state: lowest converged energy across the spin states.
/// Any failed or missing energy among them makes the whole round `Failed`;
/// ties keep the lower multiplicity
pub fn ground_spin(
    energies: &PerSpin<EnergyCell>,
    two_state: bool,
) -> SpinVerdict {
    let mut best: Option<(Spin, f64)> = None;
    for &spin in states(two_state) {
        let Some(e) = energies.get(spin).energy() else {
            return SpinVerdict::Failed;
        };
        if best.is_none_or(|(_, b)| e < b) {
            best = Some((spin, e));
        }
    }
    // states() is never empty
    SpinVerdict::Ground(best.unwrap().0)
}

/// the adiabatic spin-splitting energy in kcal/mol: second-lowest minus
/// lowest. None unless every competing state converged
pub fn splitting_kcal(
    energies: &PerSpin<EnergyCell>,
    two_state: bool,
) -> Option<f64> {
    let mut es: Vec<f64> = states(two_state)
        .iter()
        .map(|&s| energies.get(s).energy())
        .collect::<Option<_>>()?;
    es.sort_by(|a, b| a.total_cmp(b));
    Some((es[1] - es[0]) * HARTREE_TO_KCAL)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::round::Sentinel;

    use super::*;

    fn energies(ls: f64, is: f64, hs: f64) -> PerSpin<EnergyCell> {
        PerSpin {
            ls: EnergyCell::Energy(ls),
            is: EnergyCell::Energy(is),
            hs: EnergyCell::Energy(hs),
        }
    }

    #[test]
    fn ground() {
        let e = energies(-2158.35, -2158.20, -2158.10);
        assert_eq!(ground_spin(&e, false), SpinVerdict::Ground(Spin::Ls));

        let e = energies(-2158.10, -2158.20, -2158.35);
        assert_eq!(ground_spin(&e, false), SpinVerdict::Ground(Spin::Hs));
    }

    #[test]
    fn ground_failed() {
        let mut e = energies(-2158.35, -2158.20, -2158.10);
        e.is = EnergyCell::Status(Sentinel::Failed);
        assert_eq!(ground_spin(&e, false), SpinVerdict::Failed);
        // but a two-state molecule never consults IS
        assert_eq!(ground_spin(&e, true), SpinVerdict::Ground(Spin::Ls));
    }

    #[test]
    fn ground_two_state() {
        // IS is the lowest but does not exist for this metal
        let e = energies(-2158.20, -2158.35, -2158.30);
        assert_eq!(ground_spin(&e, true), SpinVerdict::Ground(Spin::Hs));
    }

    #[test]
    fn splitting() {
        let e = energies(-2158.35, -2158.20, -2158.10);
        assert_abs_diff_eq!(
            splitting_kcal(&e, false).unwrap(),
            0.15 * 627.509,
            epsilon = 1e-6
        );
        let mut e = e;
        e.hs = EnergyCell::Status(Sentinel::Failed);
        assert_eq!(splitting_kcal(&e, false), None);
    }

    #[test]
    fn verdict_serde() {
        let vs = vec![
            SpinVerdict::Ground(Spin::Ls),
            SpinVerdict::Ground(Spin::Is),
            SpinVerdict::Failed,
            SpinVerdict::Diss,
        ];
        let got = serde_json::to_string(&vs).unwrap();
        assert_eq!(got, r#"["LS","IS","Failed","diss"]"#);
        let back: Vec<SpinVerdict> = serde_json::from_str(&got).unwrap();
        assert_eq!(back, vs);
    }
}
