//! The recording state machine.
//!
//! `paused` and `hidden` are independent flags. A frame is only captured
//! while a recording is active and both flags are clear. `resume` clears
//! both, `show` clears only `hidden`.

use crate::error::RunError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of the per-recording frame directories under the output
/// directory.
pub const FRAME_DIR_PREFIX: &str = ".reeltty-frames-";

/// Outcome of a state-machine request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The request did not fit the current state and changed nothing.
    Ignored(&'static str),
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

#[derive(Debug)]
pub struct RecordingSession {
    paused: bool,
    hidden: bool,
    frames: Vec<PathBuf>,
    frame_dir: TempDir,
    cols: u16,
}

impl RecordingSession {
    /// Terminal width the frames are rendered at.
    pub fn cols(&self) -> u16 {
        self.cols
    }
}

/// A stopped recording, ready to be compiled.
///
/// The frame directory is removed when this is dropped.
#[derive(Debug)]
pub struct FinishedRecording {
    pub frames: Vec<PathBuf>,
    pub frame_dir: TempDir,
}

#[derive(Debug, Default)]
pub struct Recorder {
    session: Option<RecordingSession>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a frame request would currently capture anything.
    pub fn is_capturing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.paused && !s.hidden)
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    pub fn frame_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.frames.len())
    }

    /// Begin recording, storing frames in a fresh directory under
    /// `output_dir`.
    pub fn start(&mut self, output_dir: &Path, cols: u16) -> Result<Transition, RunError> {
        if self.session.is_some() {
            return Ok(Transition::Ignored("a recording is already active"));
        }
        std::fs::create_dir_all(output_dir)
            .map_err(|e| RunError::io(format!("failed to create {}", output_dir.display()), e))?;
        let frame_dir = tempfile::Builder::new()
            .prefix(FRAME_DIR_PREFIX)
            .tempdir_in(output_dir)
            .map_err(|e| RunError::io("failed to create frame directory", e))?;
        tracing::debug!("recording frames into {}", frame_dir.path().display());
        self.session = Some(RecordingSession {
            paused: false,
            hidden: false,
            frames: Vec::new(),
            frame_dir,
            cols,
        });
        Ok(Transition::Applied)
    }

    pub fn pause(&mut self) -> Transition {
        match self.session.as_mut() {
            None => Transition::Ignored("no active recording to pause"),
            Some(s) if s.paused => Transition::Ignored("recording is already paused"),
            Some(s) => {
                s.paused = true;
                Transition::Applied
            }
        }
    }

    /// Leave the paused state. Also clears `hidden`; the caller captures a
    /// frame when this returns [`Transition::Applied`].
    pub fn resume(&mut self) -> Transition {
        match self.session.as_mut() {
            None => Transition::Ignored("no active recording to resume"),
            Some(s) if !s.paused => Transition::Ignored("recording is not paused"),
            Some(s) => {
                s.paused = false;
                s.hidden = false;
                Transition::Applied
            }
        }
    }

    pub fn hide(&mut self) -> Transition {
        match self.session.as_mut() {
            None => Transition::Ignored("no active recording to hide"),
            Some(s) if s.hidden => Transition::Ignored("recording is already hidden"),
            Some(s) => {
                s.hidden = true;
                Transition::Applied
            }
        }
    }

    pub fn show(&mut self) -> Transition {
        match self.session.as_mut() {
            None => Transition::Ignored("no active recording to show"),
            Some(s) if !s.hidden => Transition::Ignored("recording is not hidden"),
            Some(s) => {
                s.hidden = false;
                Transition::Applied
            }
        }
    }

    /// Path for the next frame, or `None` while capture is suppressed.
    pub fn next_frame_path(&self) -> Option<PathBuf> {
        let session = self.session.as_ref().filter(|s| !s.paused && !s.hidden)?;
        Some(
            session
                .frame_dir
                .path()
                .join(format!("frame_{:05}.png", session.frames.len())),
        )
    }

    /// Record a frame written to a path from [`next_frame_path`](Self::next_frame_path).
    pub fn commit_frame(&mut self, path: PathBuf) -> bool {
        match self.session.as_mut() {
            Some(s) if !s.paused && !s.hidden => {
                s.frames.push(path);
                true
            }
            _ => false,
        }
    }

    /// End the recording and hand over its frames.
    pub fn stop(&mut self) -> Option<FinishedRecording> {
        self.session.take().map(|s| FinishedRecording {
            frames: s.frames,
            frame_dir: s.frame_dir,
        })
    }

    /// Drop an unfinished recording and its frames.
    pub fn abandon(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!(
                "recording still active at end of script; {} frame(s) discarded",
                session.frames.len()
            );
        }
    }
}

/// Append the first `floor(offset_ms / delay_ms)` frames (at most all of
/// them) to the end so the animation loops without a jump.
pub fn loop_offset_frames(mut frames: Vec<PathBuf>, offset_ms: u64, delay_ms: u64) -> Vec<PathBuf> {
    if offset_ms == 0 || delay_ms == 0 {
        return frames;
    }
    let extra = usize::try_from(offset_ms / delay_ms)
        .unwrap_or(usize::MAX)
        .min(frames.len());
    frames.extend_from_within(..extra);
    frames
}

/// Frame directories left behind by earlier runs that did not finish.
pub fn stale_frame_dirs(output_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(output_dir) else {
        return Vec::new();
    };
    let mut stale: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(FRAME_DIR_PREFIX))
        .map(|entry| entry.path())
        .collect();
    stale.sort();
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(recorder: &mut Recorder) -> bool {
        match recorder.next_frame_path() {
            Some(path) => recorder.commit_frame(path),
            None => false,
        }
    }

    fn started(dir: &Path) -> Recorder {
        let mut recorder = Recorder::new();
        assert_eq!(recorder.start(dir, 80).unwrap(), Transition::Applied);
        recorder
    }

    #[test]
    fn test_hidden_frames_are_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = started(dir.path());
        assert!(recorder.hide().is_applied());
        for _ in 0..3 {
            assert!(!frame(&mut recorder));
        }
        assert!(recorder.show().is_applied());
        assert!(frame(&mut recorder));
        assert_eq!(recorder.frame_count(), 1);
    }

    #[test]
    fn test_paused_and_hidden_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = started(dir.path());
        recorder.pause();
        recorder.hide();
        assert!(recorder.show().is_applied());
        assert!(!recorder.is_capturing());
        recorder.hide();
        assert!(recorder.resume().is_applied());
        assert!(recorder.is_capturing());
    }

    #[test]
    fn test_redundant_transitions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new();
        assert!(matches!(recorder.pause(), Transition::Ignored(_)));
        assert!(matches!(recorder.show(), Transition::Ignored(_)));
        assert!(recorder.stop().is_none());

        recorder.start(dir.path(), 80).unwrap();
        assert!(matches!(
            recorder.start(dir.path(), 80).unwrap(),
            Transition::Ignored(_)
        ));
        assert!(matches!(recorder.resume(), Transition::Ignored(_)));
        assert!(matches!(recorder.show(), Transition::Ignored(_)));
        assert!(recorder.is_capturing());
    }

    #[test]
    fn test_frame_paths_are_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = started(dir.path());
        frame(&mut recorder);
        let next = recorder.next_frame_path().unwrap();
        assert!(next.ends_with("frame_00001.png"));
    }

    #[test]
    fn test_stop_hands_over_frames_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = started(dir.path());
        frame(&mut recorder);
        frame(&mut recorder);
        assert_eq!(stale_frame_dirs(dir.path()).len(), 1);

        let finished = recorder.stop().unwrap();
        assert_eq!(finished.frames.len(), 2);
        assert!(!recorder.is_active());
        drop(finished);
        assert!(stale_frame_dirs(dir.path()).is_empty());
    }

    #[test]
    fn test_stale_frame_dirs_ignores_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".reeltty-frames-abc")).unwrap();
        std::fs::create_dir(dir.path().join("frames")).unwrap();
        std::fs::write(dir.path().join(".reeltty-frames-file"), "").unwrap();
        assert_eq!(
            stale_frame_dirs(dir.path()),
            vec![dir.path().join(".reeltty-frames-abc")]
        );
    }

    #[test]
    fn test_loop_offset_duplicates_leading_frames() {
        let frames: Vec<PathBuf> = ["a", "b", "c"].iter().map(PathBuf::from).collect();
        let looped = loop_offset_frames(frames, 450, 200);
        let names: Vec<_> = looped.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["a", "b", "c", "a", "b"]);
    }

    proptest! {
        #[test]
        fn test_loop_offset_frame_count(f in 0usize..50, o in 0u64..20_000, d in 1u64..2_000) {
            let frames: Vec<PathBuf> = (0..f).map(|i| PathBuf::from(i.to_string())).collect();
            let looped = loop_offset_frames(frames, o, d);
            prop_assert_eq!(looped.len(), f + f.min((o / d) as usize));
        }
    }
}
