//! Parsers for the output files written by the quantum chemistry engines used
//! in COGEF/EFEI force-spectroscopy screening: Orca geometry optimization
//! logs and Terachem relaxed-scan trajectories.

pub mod coord;
pub mod geom;
pub mod program;
pub mod traj;

pub type Vec3 = nalgebra::Vector3<f64>;
