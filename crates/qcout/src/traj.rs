//! Multi-frame XYZ trajectories as appended by an external optimizer. Frames
//! are grouped contiguously, natoms + 2 lines each, and a file whose line
//! count is not an exact multiple of the frame size is still being written.

use std::{fs::read_to_string, path::Path, str::FromStr};

use crate::{
    geom::{Atom, Frame},
    program::OutputError,
};

/// the number of frames in a trajectory file, or [FrameCount::Running] when
/// the final frame is incomplete
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameCount {
    Complete(usize),
    Running,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub natoms: usize,
    frames: Vec<Frame>,
    /// a trailing partial frame was present when the file was read
    partial: bool,
}

impl FromStr for Trajectory {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().collect();
        if lines.is_empty() {
            return Err(OutputError::EmptyFile(String::new()));
        }
        let natoms: usize = lines[0]
            .split_whitespace()
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| {
                OutputError::GeomParseError("bad atom count line".to_owned())
            })?;
        let frame_size = natoms + 2;
        let partial = !lines.len().is_multiple_of(frame_size);
        let mut frames = Vec::with_capacity(lines.len() / frame_size);
        for chunk in lines.chunks_exact(frame_size) {
            let comment = chunk[1].to_string();
            let atoms = chunk[2..]
                .iter()
                .map(|l| l.parse::<Atom>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| OutputError::GeomParseError(e.to_string()))?;
            frames.push(Frame::new(comment, atoms));
        }
        Ok(Self {
            natoms,
            frames,
            partial,
        })
    }
}

/// read the atom count from the first line of an XYZ file
pub fn read_natoms(path: impl AsRef<Path>) -> Result<usize, OutputError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(OutputError::FileNotFound(path.display().to_string()));
    }
    let contents = read_to_string(path).map_err(|e| {
        OutputError::ReadFileError(path.display().to_string(), e.kind())
    })?;
    contents
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().next())
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| {
            OutputError::GeomParseError(path.display().to_string())
        })
}

impl Trajectory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OutputError::FileNotFound(
                path.display().to_string(),
            ));
        }
        let contents = read_to_string(path).map_err(|e| {
            OutputError::ReadFileError(path.display().to_string(), e.kind())
        })?;
        contents.parse()
    }

    /// total lines / frame size when exact, [FrameCount::Running] otherwise
    pub fn frame_count(&self) -> FrameCount {
        if self.partial {
            FrameCount::Running
        } else {
            FrameCount::Complete(self.frames.len())
        }
    }

    /// the 1-indexed `n`-th frame
    pub fn frame(&self, n: usize) -> Option<&Frame> {
        if n == 0 {
            return None;
        }
        self.frames.get(n - 1)
    }

    /// the last `k` complete frames, or None if fewer than `k` exist yet
    pub fn last_frames(&self, k: usize) -> Option<&[Frame]> {
        let n = self.frames.len();
        if k > n {
            return None;
        }
        Some(&self.frames[n - k..])
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // a 5-atom, 2-frame trajectory: 14 lines
    const SCAN: &str = "5
step 1
Fe 0.0 0.0 0.0
N 0.0 0.0 2.0
N 0.0 0.0 -2.0
N 0.0 2.0 0.0
N 0.0 -2.0 0.0
5
step 2
Fe 0.0 0.0 0.0
N 0.0 0.0 2.1
N 0.0 0.0 -2.1
N 0.0 2.0 0.0
N 0.0 -2.0 0.0
";

    #[test]
    fn frame_count() {
        let traj: Trajectory = SCAN.parse().unwrap();
        assert_eq!(traj.frame_count(), FrameCount::Complete(2));
    }

    #[test]
    fn running() {
        // drop the last line to simulate a file still being appended
        let partial: String = SCAN
            .lines()
            .take(13)
            .map(|l| format!("{l}\n"))
            .collect();
        let traj: Trajectory = partial.parse().unwrap();
        assert_eq!(traj.frame_count(), FrameCount::Running);
        // the complete frames are still available
        assert_eq!(traj.frames().len(), 1);
    }

    #[test]
    fn extract_frame() {
        let traj: Trajectory = SCAN.parse().unwrap();
        // lines 8-14 of the file
        let want: Frame = "5
step 2
Fe 0.0 0.0 0.0
N 0.0 0.0 2.1
N 0.0 0.0 -2.1
N 0.0 2.0 0.0
N 0.0 -2.0 0.0
"
        .parse()
        .unwrap();
        assert_eq!(traj.frame(2), Some(&want));
        assert_eq!(traj.frame(0), None);
        assert_eq!(traj.frame(3), None);
    }

    #[test]
    fn last_frames() {
        let traj: Trajectory = SCAN.parse().unwrap();
        assert_eq!(traj.last_frames(2).unwrap().len(), 2);
        assert!(traj.last_frames(3).is_none());
    }

    #[test]
    fn load() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{SCAN}").unwrap();
        let got = Trajectory::load(f.path()).unwrap();
        assert_eq!(got, SCAN.parse().unwrap());
        assert_eq!(read_natoms(f.path()).unwrap(), 5);
    }

    #[test]
    fn missing_file() {
        let got = Trajectory::load("testfiles/does_not_exist.xyz");
        assert!(got.unwrap_err().is_file_not_found());
    }
}
