use super::*;

mod read_output {
    use insta::assert_debug_snapshot;

    use super::*;

    #[test]
    fn opt() {
        let got = Orca::read_output("testfiles/orca/opt.out").unwrap();
        assert_debug_snapshot!(got, @r"
        ProgramResult {
            energy: -2158.123456789012,
            external_potential: Some(
                -0.05024918,
            ),
        }
        ");
        assert_eq!(got.total(), -2158.123456789012 + -0.05024918);
    }

    #[test]
    fn zero_force() {
        // no external force applied, so no External Potential term
        let got = Orca::read_output("testfiles/orca/zero_force.out").unwrap();
        assert_eq!(
            got,
            ProgramResult {
                energy: -2158.204857112233,
                external_potential: None,
            }
        );
        assert_eq!(got.total(), -2158.204857112233);
    }

    #[test]
    fn noconv() {
        let got = Orca::read_output("testfiles/orca/noconv.out");
        assert!(got.unwrap_err().is_not_converged());
    }

    #[test]
    fn killed() {
        // job ran out of walltime: neither success marker was written
        let got = Orca::read_output("testfiles/orca/killed.out");
        assert!(got.unwrap_err().is_not_converged());
    }

    #[test]
    fn missing() {
        let got = Orca::read_output("testfiles/orca/nonexistent.out");
        assert!(got.unwrap_err().is_file_not_found());
    }
}

mod opt_frames {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn opt() {
        let got = Orca::opt_frames("testfiles/orca/opt.out", 5).unwrap();
        // three logged geometries, minus the duplicate of the converged
        // structure
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].natoms(), 5);
        assert_eq!(got[0].metal(), Some(0));
        assert_abs_diff_eq!(got[1].distance(0, 1), 2.05, epsilon = 1e-12);
    }

    #[test]
    fn killed() {
        // a single logged geometry yields no usable frames
        let got = Orca::opt_frames("testfiles/orca/killed.out", 5).unwrap();
        assert!(got.is_empty());
    }
}

mod read_gibbs {
    use super::*;

    #[test]
    fn freq() {
        let got = Orca::read_gibbs("testfiles/orca/freq.out").unwrap();
        assert_eq!(got, -2158.04885668);
    }

    #[test]
    fn noconv() {
        let got = Orca::read_gibbs("testfiles/orca/noconv.out");
        assert!(got.unwrap_err().is_not_converged());
    }
}

mod spin_delocalization {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn opt() {
        let got =
            Orca::spin_delocalization("testfiles/orca/opt.out", "Fe").unwrap();
        assert_abs_diff_eq!(got, 0.105894, epsilon = 1e-8);
    }

    #[test]
    fn missing_marker() {
        let got =
            Orca::spin_delocalization("testfiles/orca/zero_force.out", "Fe");
        assert_eq!(
            got.unwrap_err(),
            OutputError::MarkerNotFound(
                "testfiles/orca/zero_force.out".to_owned()
            )
        );
    }
}
