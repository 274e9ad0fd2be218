//! Ingest the outputs of one screening round: per-(molecule, spin) job
//! energies and dissociation checks, then the derived classification and the
//! next probe decision. A molecule whose jobs failed crosses the table as
//! sentinel cells; nothing here aborts the batch.

use std::path::Path;

use rayon::prelude::*;

use qcout::{
    coord::{BondRatioModel, DissStatus, dissociated_tail},
    program::{Program, orca::Orca, terachem::Terachem},
    traj::read_natoms,
};

use crate::{
    config::{self, Config},
    eval::Step,
    round::{EnergyCell, Sentinel},
    spin::{PerSpin, Spin, splitting_kcal},
    table::{Round, Row, Table},
};

/// the outcome of analyzing one (molecule, spin) job
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JobAnalysis {
    pub energy: EnergyCell,
    pub diss: bool,
    pub status: DissStatus,
}

impl JobAnalysis {
    fn failed() -> Self {
        Self {
            energy: EnergyCell::Status(Sentinel::Failed),
            diss: false,
            status: DissStatus::Insufficient,
        }
    }
}

/// Analyze the job in `data_dir/basename/`: energy from `basename.out`,
/// dissociation from the tail of the logged optimizer geometries. A job
/// that failed to converge but whose structure broke is recorded as `Diss`
/// rather than `Failed`.
pub fn analyze_job<P: Program>(
    data_dir: &Path,
    basename: &str,
    row: &Row,
    cfg: &Config,
) -> JobAnalysis {
    let job_dir = data_dir.join(basename);
    let out = job_dir.join(format!("{basename}.out"));
    let out = out.to_string_lossy();
    let xyz = job_dir.join(format!("{basename}.xyz"));

    let natoms = match read_natoms(&xyz) {
        Ok(n) => n,
        Err(e) => {
            log::warn!("no geometry for {basename}: {e}");
            return JobAnalysis::failed();
        }
    };

    let mut energy = match P::read_output(&out) {
        Ok(res) => EnergyCell::Energy(res.total()),
        Err(e) => {
            log::debug!("{basename}: {e}");
            EnergyCell::Status(Sentinel::Failed)
        }
    };

    let frames = P::opt_frames(&out, natoms).unwrap_or_default();
    let status = if frames.is_empty() {
        DissStatus::Insufficient
    } else {
        let model = BondRatioModel::from_reference(
            &frames[0],
            row.metal_idx,
            row.ligands.clone(),
            cfg.bond_ratio,
        );
        match model {
            Ok(model) => {
                match dissociated_tail(&frames, &model, cfg.diss_window) {
                    Ok(status) => status,
                    Err(e) => {
                        log::warn!("{basename}: {e}");
                        DissStatus::Insufficient
                    }
                }
            }
            Err(e) => {
                log::warn!("{basename}: {e}");
                DissStatus::Insufficient
            }
        }
    };
    if status == DissStatus::Insufficient {
        log::warn!(
            "{basename}: fewer than {} usable frames, assuming intact",
            cfg.diss_window
        );
    }

    let diss = status.dissociated();
    if diss && energy.is_failed() {
        energy = EnergyCell::Status(Sentinel::Diss);
    }

    JobAnalysis {
        energy,
        diss,
        status,
    }
}

/// fill in round `cfg.round` of every row from the job outputs on disk
pub fn ingest_round<P: Program>(table: &mut Table, cfg: &Config) {
    let n = cfg.round;
    let data_dir = Path::new(&cfg.data_dir);
    table.rows.par_iter_mut().for_each(|row| {
        if row.verdict.is_some() {
            return;
        }
        let two_state = cfg.is_two_state(row);
        let Some(round) = row.round(n) else {
            log::warn!("{} has no round {n}, skipping", row.refcode);
            return;
        };
        let Some(force) = round.force.force() else {
            // scan already halted for this molecule
            return;
        };

        let mut energies = PerSpin::filled(EnergyCell::Status(
            Sentinel::Unperformed,
        ));
        let mut diss = PerSpin::filled(false);
        for spin in [Spin::Ls, Spin::Is, Spin::Hs] {
            if two_state && spin == Spin::Is {
                *energies.get_mut(spin) =
                    EnergyCell::Status(Sentinel::NotApplicable);
                continue;
            }
            let basename = row.basename(n, spin);
            let job = analyze_job::<P>(data_dir, &basename, row, cfg);
            *energies.get_mut(spin) = job.energy;
            *diss.get_mut(spin) = job.diss;
        }

        let splitting = splitting_kcal(&energies, two_state);
        let round = row.round_mut(n).unwrap();
        round.energies = energies;
        round.diss = diss;
        round.splitting = splitting;

        if !row.performed(force) {
            row.performed_forces.push(force);
        }
        if let Some(crate::table::RoundResult::Classified { spin, .. }) =
            row.round_result(n, two_state)
        {
            row.round_mut(n).unwrap().spin = Some(spin);
        }
    });
}

/// counts of where the campaign stands after an evaluation pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub continuing: usize,
    pub concluded: usize,
    pub failed: usize,
}

/// decide the next probe force or verdict for every active row, appending
/// the new round column or recording the verdict
pub fn evaluate(table: &mut Table, cfg: &Config) -> Summary {
    let mut summary = Summary::default();
    for row in &mut table.rows {
        if row.verdict.is_some() {
            summary.concluded += 1;
            continue;
        }
        // a pending round whose jobs have not been ingested yet would read
        // as Failed; leave it for the next pass instead
        if let Some(last) = row.rounds.last()
            && last.force.force().is_some()
            && last.spin.is_none()
        {
            log::info!(
                "{}: round {} not analyzed yet, skipping",
                row.refcode,
                row.rounds.len()
            );
            continue;
        }
        let two_state = cfg.is_two_state(row);
        let Some(step) =
            row.plan_next(cfg.force_step, cfg.force_threshold, two_state)
        else {
            log::warn!("{}: nothing to evaluate", row.refcode);
            continue;
        };
        match step {
            Step::Continue(force) => {
                if row.performed(force) {
                    log::info!(
                        "{}: {force} nN already probed, repeating anyway",
                        row.refcode
                    );
                }
                println!(
                    "{}: round {} at {force} nN",
                    row.refcode,
                    row.rounds.len() + 1
                );
                row.rounds.push(Round::pending(force));
                summary.continuing += 1;
            }
            Step::Done(verdict) => {
                println!("{}: {verdict}", row.refcode);
                if verdict == crate::eval::Verdict::FailedUnperformed {
                    // keep the legacy column shape: the halted round still
                    // appears, with no force assigned
                    if row
                        .rounds
                        .last()
                        .is_none_or(|r| r.force.force().is_some())
                    {
                        row.rounds.push(Round::failed_unperformed());
                    }
                    summary.failed += 1;
                } else {
                    summary.concluded += 1;
                }
                row.verdict = Some(verdict);
            }
        }
    }
    summary
}

/// one full pass: ingest the configured round's outputs, then evaluate
pub fn run(table: &mut Table, cfg: &Config) -> Summary {
    match cfg.program {
        config::Program::Orca => ingest_round::<Orca>(table, cfg),
        config::Program::Terachem => ingest_round::<Terachem>(table, cfg),
    }
    evaluate(table, cfg)
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        round::ForceCell,
        spin::SpinVerdict,
        table::Table,
    };

    use super::*;

    fn config() -> Config {
        let dir = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/testfiles/campaign"
        );
        Config::load(format!("{dir}/fsco.toml"))
    }

    #[test]
    fn missing_job_dir() {
        let cfg = config();
        let table = Table::load(
            Path::new(&cfg.data_dir).join("table.json"),
        )
        .unwrap();
        let row = table.get("FETEST").unwrap();
        let got = analyze_job::<Orca>(
            Path::new(&cfg.data_dir),
            "FETEST_round9_LS",
            row,
            &cfg,
        );
        assert_eq!(
            got,
            JobAnalysis {
                energy: EnergyCell::Status(Sentinel::Failed),
                diss: false,
                status: DissStatus::Insufficient,
            }
        );
    }

    #[test]
    fn ingest_and_evaluate() {
        let cfg = config();
        let mut table = Table::load(
            Path::new(&cfg.data_dir).join("table.json"),
        )
        .unwrap();
        ingest_round::<Orca>(&mut table, &cfg);

        let row = table.get("FETEST").unwrap();
        let round = row.round(1).unwrap();
        assert_eq!(round.spin, Some(SpinVerdict::Ground(crate::spin::Spin::Ls)));
        assert!(!round.diss.ls);
        assert!(round.splitting.is_some());
        assert!(row.performed(1.0));

        let summary = evaluate(&mut table, &cfg);
        assert_eq!(
            summary,
            Summary {
                continuing: 1,
                concluded: 0,
                failed: 0
            }
        );
        let row = table.get("FETEST").unwrap();
        assert_eq!(row.rounds.len(), 2);
        assert_eq!(row.round(2).unwrap().force, ForceCell::Force(1.5));
    }
}
