use super::*;

#[test]
fn config() {
    let got = Config::load("testfiles/campaign/fsco.toml");
    let want = Config {
        table: String::from("table.json"),
        data_dir: String::from("testfiles/campaign"),
        program: Program::Orca,
        round: 1,
        force_step: 0.5,
        force_threshold: 5.0,
        diss_window: 2,
        bond_ratio: 1.5,
        two_state: vec![TwoState {
            metal: String::from("Co"),
            ox: 2,
        }],
    };
    assert_eq!(got, want);
}

#[test]
fn two_state() {
    let config = Config::load("testfiles/campaign/fsco.toml");
    let mut row = crate::table::Row {
        refcode: String::from("COTEST"),
        metal: String::from("Co"),
        ox: 2,
        metal_idx: 0,
        ligands: Vec::new(),
        rounds: Vec::new(),
        performed_forces: Vec::new(),
        verdict: None,
    };
    assert!(config.is_two_state(&row));
    row.ox = 3;
    assert!(!config.is_two_state(&row));
}
