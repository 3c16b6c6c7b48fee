//! Audio sink that spools clips to numbered files
//!
//! Each clip is written as `NNNN.mp3`. With a playback rate configured the
//! clip "plays" for `len / rate` seconds; cancelling before then deletes the
//! file. Without a rate, playback finishes as soon as the file is written.

use crate::delivery::{NoopControl, PlaybackControl, PlaybackOutcome, PlaybackReporter};
use crate::error::SpeechResult;
use crate::proxy::{AudioClip, AudioSink};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spooling audio sink
#[derive(Debug)]
pub struct SpoolAudioSink {
    dir: PathBuf,
    counter: AtomicU64,
    bytes_per_second: Option<u64>,
}

impl SpoolAudioSink {
    /// Create sink writing into `dir`, creating it if needed
    ///
    /// # Errors
    /// - `SpeechError::Delivery` if the directory cannot be created
    pub fn new(dir: impl Into<PathBuf>) -> SpeechResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: AtomicU64::new(0),
            bytes_per_second: None,
        })
    }

    /// Simulate playback time at the given byte rate
    #[must_use]
    pub fn with_playback_rate(mut self, bytes_per_second: u64) -> Self {
        self.bytes_per_second = Some(bytes_per_second.max(1));
        self
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[allow(clippy::cast_precision_loss)]
    fn playback_time(&self, clip: &AudioClip) -> Duration {
        self.bytes_per_second.map_or(Duration::ZERO, |rate| {
            Duration::from_secs_f64(clip.len() as f64 / rate as f64)
        })
    }
}

struct SpoolPlayback {
    path: PathBuf,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackControl for SpoolPlayback {
    fn stop(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.abort();
            if let Err(err) = std::fs::remove_file(&self.path) {
                tracing::debug!(path = %self.path.display(), error = %err, "spool file already gone");
            }
        }
    }
}

impl AudioSink for SpoolAudioSink {
    fn play(
        &self,
        clip: AudioClip,
        reporter: Arc<PlaybackReporter>,
    ) -> SpeechResult<Arc<dyn PlaybackControl>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(format!("{n:04}.mp3"));
        std::fs::write(&path, &clip.bytes)?;
        tracing::debug!(path = %path.display(), bytes = clip.len(), "audio spooled");

        let duration = self.playback_time(&clip);
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) if duration > Duration::ZERO => runtime,
            _ => {
                reporter.finish(PlaybackOutcome::Completed);
                return Ok(Arc::new(NoopControl));
            }
        };

        let playback = Arc::new(SpoolPlayback {
            path,
            task: Mutex::new(None),
        });
        let finished = Arc::clone(&playback);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            finished.task.lock().take();
            reporter.finish(PlaybackOutcome::Completed);
        });
        *playback.task.lock() = Some(handle);
        Ok(playback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::Utterance;

    fn clip(len: usize) -> AudioClip {
        AudioClip::new(vec![7; len], "audio/mpeg").unwrap()
    }

    fn spooled(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn instant_playback_writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SpoolAudioSink::new(dir.path()).unwrap();

        for _ in 0..2 {
            let deferred = Arc::new(crate::delivery::DeferredControl::new());
            let (utterance, reporter) = Utterance::start(deferred.clone());
            deferred.attach(sink.play(clip(16), reporter).unwrap());
            assert_eq!(utterance.finished().await, PlaybackOutcome::Completed);
        }

        assert_eq!(spooled(dir.path()), vec!["0001.mp3", "0002.mp3"]);
    }

    #[tokio::test]
    async fn timed_playback_completes_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SpoolAudioSink::new(dir.path()).unwrap().with_playback_rate(1_000);

        let deferred = Arc::new(crate::delivery::DeferredControl::new());
        let (utterance, reporter) = Utterance::start(deferred.clone());
        deferred.attach(sink.play(clip(10), reporter).unwrap());

        assert_eq!(utterance.finished().await, PlaybackOutcome::Completed);
        assert_eq!(spooled(dir.path()), vec!["0001.mp3"]);
    }

    #[tokio::test]
    async fn cancel_deletes_unfinished_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SpoolAudioSink::new(dir.path()).unwrap().with_playback_rate(1);

        let deferred = Arc::new(crate::delivery::DeferredControl::new());
        let (utterance, reporter) = Utterance::start(deferred.clone());
        deferred.attach(sink.play(clip(60), reporter).unwrap());
        assert_eq!(spooled(dir.path()), vec!["0001.mp3"]);

        utterance.cancel();
        assert_eq!(utterance.finished().await, PlaybackOutcome::Cancelled);
        assert!(spooled(dir.path()).is_empty());
    }

    #[test]
    fn without_runtime_playback_is_instant() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SpoolAudioSink::new(dir.path().join("nested")).unwrap().with_playback_rate(1);
        let (utterance, reporter) = Utterance::start(Arc::new(NoopControl));
        sink.play(clip(5), reporter).unwrap();
        let (_, mut done) = utterance.into_parts();
        assert_eq!(done.try_recv().unwrap(), PlaybackOutcome::Completed);
    }
}
