// ffmpeg and ffprobe are driven as subprocesses (std::process::Command).
// Runtime prerequisite: both binaries on PATH.
//
// Layout:
//   - `probe_video`   : ffprobe → width/height/fps/duration
//   - `capture_frame` : one ffmpeg run → one raw RGBA frame at a position
//   - `VideoSource`   : capture thread answering seek requests, `FrameSource` impl
//   - `capture_loop`  : the thread body, coalesces pending seeks

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use al_core::frame::{FrameBuffer, Seeked};
use al_core::traits::FrameSource;

/// Commands for the capture thread.
///
/// # Example
/// ```
/// use al_source::video::VideoCommand;
/// let cmd = VideoCommand::Seek(5.0);
/// assert!(matches!(cmd, VideoCommand::Seek(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    /// Capture the frame at this absolute position (seconds).
    Seek(f64),
    /// Stop the thread.
    Quit,
}

/// Metadata extracted via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second (e.g. 23.976, 24.0, 30.0).
    pub fps: f64,
    /// Clip length in seconds.
    pub duration: f64,
}

/// Parse `key=value` lines printed by ffprobe.
///
/// # Errors
/// Fails when no usable video stream size or duration is present.
///
/// # Example
/// ```
/// use al_source::video::parse_probe_output;
/// let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=30000/1001\nduration=4.2\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;
    let mut duration: f64 = 0.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1", "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        } else if let Some(val) = line.strip_prefix("duration=") {
            // Stream and container may both report; keep the first real value.
            if duration <= 0.0 {
                duration = val.trim().parse().unwrap_or(0.0);
            }
        }
    }

    if width == 0 || height == 0 {
        anyhow::bail!("no video stream found");
    }
    if !(duration.is_finite() && duration > 0.0) {
        anyhow::bail!("video has no known duration");
    }
    Ok(VideoInfo {
        width,
        height,
        fps,
        duration,
    })
}

/// Query `ffprobe` for the main video stream.
///
/// # Errors
/// Returns an error if `ffprobe` cannot be run or the file has no
/// decodable video stream.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("video path is not valid UTF-8")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate:format=duration",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context("cannot run ffprobe; is it installed and on PATH?")?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).with_context(|| path.display().to_string())?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps, {:.2}s: {}",
        info.width,
        info.height,
        info.fps,
        info.duration,
        path.display()
    );
    Ok(info)
}

/// Capture size: native size capped at `max_width`, aspect preserved,
/// both sides even (ffmpeg scalers prefer it) and at least 2.
///
/// # Example
/// ```
/// use al_source::video::{capture_size, VideoInfo};
/// let info = VideoInfo { width: 1920, height: 1080, fps: 30.0, duration: 1.0 };
/// assert_eq!(capture_size(&info, 480), (480, 270));
/// ```
#[must_use]
pub fn capture_size(info: &VideoInfo, max_width: u32) -> (u32, u32) {
    let w = info.width.min(max_width.max(2));
    let h = (u64::from(info.height) * u64::from(w) / u64::from(info.width.max(1))) as u32;
    let even = |v: u32| (v & !1).max(2);
    (even(w), even(h))
}

/// Reads exactly `buf.len()` bytes from `reader`.
///
/// # Errors
/// Returns `Ok(true)` on success, `Ok(false)` on EOF before completion,
/// `Err` on a fatal I/O error.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Decode the single frame at `pos_secs`, scaled to `w × h` RGBA.
///
/// `Ok(None)` means ffmpeg produced no frame there (position not decodable).
///
/// # Errors
/// Returns an error if ffmpeg cannot be spawned or its pipe fails.
pub fn capture_frame(path: &Path, pos_secs: f64, w: u32, h: u32) -> Result<Option<FrameBuffer>> {
    let path_str = path.to_str().context("video path is not valid UTF-8")?;
    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let pos_str = format!("{:.3}", pos_secs.max(0.0));

    let mut child = Command::new("ffmpeg")
        .args([
            "-ss",
            &pos_str, // seek before -i: fast, keyframe based
            "-i",
            path_str,
            "-frames:v",
            "1",
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("cannot run ffmpeg; is it installed and on PATH?")?;

    let mut frame = FrameBuffer::new(w, h);
    let read = match child.stdout.as_mut() {
        Some(stdout) => read_exact_or_eof(stdout, &mut frame.data),
        None => Ok(false),
    };
    let _ = child.kill();
    let _ = child.wait();

    Ok(read?.then_some(frame))
}

/// Clip scrubbed by a dedicated capture thread.
///
/// `request_seek` posts the position; the thread decodes that frame and
/// posts a [`Seeked`] back. Dropping the source stops and joins the thread;
/// a capture still running at that point is discarded.
pub struct VideoSource {
    info: VideoInfo,
    cmd_tx: Sender<VideoCommand>,
    seeked_rx: Receiver<Seeked>,
    seeking: bool,
    handle: Option<thread::JoinHandle<()>>,
}

impl VideoSource {
    /// Probe `path` and start the capture thread.
    ///
    /// # Errors
    /// Returns an error if probing fails or the thread cannot be spawned.
    pub fn open(path: &Path, capture_width: u32) -> Result<Self> {
        let info = probe_video(path)?;
        let (w, h) = capture_size(&info, capture_width);
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let (seeked_tx, seeked_rx) = flume::unbounded();

        let thread_path = path.to_path_buf();
        let handle = thread::Builder::new()
            .name("al-video".to_string())
            .spawn(move || {
                capture_loop(
                    |pos| capture_frame(&thread_path, pos, w, h),
                    &cmd_rx,
                    &seeked_tx,
                );
            })
            .context("cannot spawn the video capture thread")?;

        log::debug!("VideoSource: capturing at {w}x{h}");
        Ok(Self {
            info,
            cmd_tx,
            seeked_rx,
            seeking: false,
            handle: Some(handle),
        })
    }
}

impl FrameSource for VideoSource {
    fn duration(&self) -> f64 {
        self.info.duration
    }

    fn is_seeking(&self) -> bool {
        self.seeking
    }

    fn request_seek(&mut self, position: f64) {
        if self.cmd_tx.send(VideoCommand::Seek(position)).is_ok() {
            self.seeking = true;
        } else {
            log::warn!("VideoSource: capture thread is gone, seek ignored");
        }
    }

    fn poll_seeked(&mut self) -> Option<Seeked> {
        match self.seeked_rx.try_recv() {
            Ok(seeked) => {
                self.seeking = false;
                Some(seeked)
            }
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => {
                if self.seeking {
                    log::warn!("VideoSource: capture thread stopped");
                    self.seeking = false;
                }
                None
            }
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(VideoCommand::Quit);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("VideoSource: capture thread panicked");
        }
    }
}

/// Capture thread body. `capture` decodes the frame at a position.
///
/// Only the most recent pending seek is honoured; older ones are stale.
/// A `Quit` anywhere in the queue stops the loop before any capture.
fn capture_loop<F>(mut capture: F, cmd_rx: &Receiver<VideoCommand>, seeked_tx: &Sender<Seeked>)
where
    F: FnMut(f64) -> Result<Option<FrameBuffer>>,
{
    while let Ok(cmd) = cmd_rx.recv() {
        let mut target = match cmd {
            VideoCommand::Seek(pos) => pos,
            VideoCommand::Quit => break,
        };
        let mut quit = false;
        for pending in cmd_rx.try_iter() {
            match pending {
                VideoCommand::Seek(pos) => target = pos,
                VideoCommand::Quit => quit = true,
            }
        }
        if quit {
            break;
        }

        let frame = match capture(target) {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                log::debug!("capture: no frame at {target:.3}s");
                None
            }
            Err(e) => {
                log::debug!("capture: {e:#}");
                None
            }
        };

        let seeked = Seeked {
            position: target,
            frame,
        };
        if seeked_tx.send(seeked).is_err() {
            break;
        }
    }
    log::info!("Video capture thread stopped.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_uses_first_duration() {
        let info = parse_probe_output(
            "width=1280\nheight=720\nr_frame_rate=24/1\nduration=N/A\nduration=12.5\n",
        )
        .unwrap();
        assert_eq!(info.fps, 24.0);
        assert_eq!(info.duration, 12.5);
    }

    #[test]
    fn probe_output_without_stream_fails() {
        assert!(parse_probe_output("duration=3.0\n").is_err());
        assert!(parse_probe_output("width=10\nheight=10\n").is_err());
    }

    #[test]
    fn bad_frame_rate_keeps_default() {
        let info =
            parse_probe_output("width=8\nheight=8\nr_frame_rate=0/0\nduration=1.0\n").unwrap();
        assert_eq!(info.fps, 30.0);
    }

    #[test]
    fn capture_size_never_upscales_and_stays_even() {
        let info = VideoInfo {
            width: 321,
            height: 241,
            fps: 30.0,
            duration: 1.0,
        };
        assert_eq!(capture_size(&info, 480), (320, 240));
        assert_eq!(capture_size(&info, 101), (100, 74));
    }

    /// Run the loop on this thread over `commands`, recording capture positions.
    fn run_loop(
        commands: &[VideoCommand],
        mut capture: impl FnMut(f64) -> Result<Option<FrameBuffer>>,
    ) -> (Vec<f64>, Vec<Seeked>) {
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let (seeked_tx, seeked_rx) = flume::unbounded();
        for &cmd in commands {
            cmd_tx.send(cmd).unwrap();
        }
        drop(cmd_tx);
        let mut captured = Vec::new();
        capture_loop(
            |pos| {
                captured.push(pos);
                capture(pos)
            },
            &cmd_rx,
            &seeked_tx,
        );
        (captured, seeked_rx.try_iter().collect())
    }

    #[test]
    fn pending_seeks_collapse_to_the_latest() {
        let (captured, seeked) = run_loop(
            &[
                VideoCommand::Seek(1.0),
                VideoCommand::Seek(2.0),
                VideoCommand::Seek(3.0),
            ],
            |_| Ok(Some(FrameBuffer::new(2, 2))),
        );
        assert_eq!(captured, vec![3.0]);
        assert_eq!(seeked.len(), 1);
        assert_eq!(seeked[0].position, 3.0);
        assert!(seeked[0].frame.is_some());
    }

    #[test]
    fn quit_behind_pending_seeks_stops_without_capturing() {
        let (captured, seeked) = run_loop(
            &[
                VideoCommand::Seek(1.0),
                VideoCommand::Seek(2.0),
                VideoCommand::Quit,
                VideoCommand::Seek(4.0),
            ],
            |_| Ok(Some(FrameBuffer::new(2, 2))),
        );
        assert!(captured.is_empty());
        assert!(seeked.is_empty());
    }

    #[test]
    fn failed_capture_completes_without_frame() {
        let (captured, seeked) = run_loop(&[VideoCommand::Seek(0.5)], |_| {
            Err(anyhow::anyhow!("ffmpeg exited"))
        });
        assert_eq!(captured, vec![0.5]);
        assert_eq!(seeked.len(), 1);
        assert!(seeked[0].frame.is_none());

        let (_, seeked) = run_loop(&[VideoCommand::Seek(9.0)], |_| Ok(None));
        assert_eq!(seeked[0].position, 9.0);
        assert!(seeked[0].frame.is_none());
    }

    #[test]
    fn seeks_after_a_capture_are_answered_in_turn() {
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let (seeked_tx, seeked_rx) = flume::unbounded();
        let handle = thread::spawn(move || {
            capture_loop(|_| Ok(Some(FrameBuffer::new(1, 1))), &cmd_rx, &seeked_tx);
        });
        for pos in [0.25, 0.5] {
            cmd_tx.send(VideoCommand::Seek(pos)).unwrap();
            let seeked = seeked_rx.recv().unwrap();
            assert_eq!(seeked.position, pos);
        }
        cmd_tx.send(VideoCommand::Quit).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn read_exact_reports_eof() {
        let mut short: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 4];
        assert!(!read_exact_or_eof(&mut short, &mut buf).unwrap());
        let mut full: &[u8] = &[1, 2, 3, 4, 5];
        assert!(read_exact_or_eof(&mut full, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
    }
}
