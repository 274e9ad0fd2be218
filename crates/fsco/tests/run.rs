use std::{fs, path::Path};

use assert_cmd::Command;
use tempfile::tempdir;

use fsco::{
    round::ForceCell,
    spin::{Spin, SpinVerdict},
    table::Table,
};

/// run the binary over a miniature one-molecule campaign: round 1 at 1 nN
/// converged low-spin in every state, so the scan should step up to 1.5 nN
#[test]
fn run() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let campaign = Path::new("testfiles/campaign");
    for base in ["FETEST_round1_LS", "FETEST_round1_IS", "FETEST_round1_HS"] {
        let d = dir.path().join(base);
        fs::create_dir(&d)?;
        for ext in ["out", "xyz"] {
            let name = format!("{base}.{ext}");
            fs::copy(campaign.join(base).join(&name), d.join(&name))?;
        }
    }
    fs::copy(campaign.join("table.json"), dir.path().join("table.json"))?;
    fs::write(
        dir.path().join("fsco.toml"),
        "table = \"table.json\"
data_dir = \".\"
program = \"orca\"
round = 1
diss_window = 2
",
    )?;

    let mut cmd = Command::cargo_bin("fsco")?;
    let assert = cmd.arg("fsco.toml").current_dir(&dir).assert();
    let output = assert.get_output();

    assert!(
        output.status.success(),
        "stderr: {}\nlog: {}",
        String::from_utf8_lossy(&output.stderr),
        fs::read_to_string(dir.path().join("fsco.log"))
            .unwrap_or_default(),
    );

    let out = fs::read_to_string(dir.path().join("fsco.out"))?;
    assert!(out.contains("FETEST: round 2 at 1.5 nN"), "got:\n{out}");
    assert!(out.contains("1 continuing, 0 concluded, 0 failed"));
    assert!(out.contains("normal termination of fsco"));

    let table = Table::load(dir.path().join("table.json"))?;
    let row = table.get("FETEST").unwrap();
    assert_eq!(
        row.round(1).unwrap().spin,
        Some(SpinVerdict::Ground(Spin::Ls))
    );
    assert_eq!(row.rounds.len(), 2);
    assert_eq!(row.round(2).unwrap().force, ForceCell::Force(1.5));
    assert!(row.verdict.is_none());
    assert_eq!(row.performed_forces, vec![1.0]);

    Ok(())
}
