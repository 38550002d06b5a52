use crate::error::{GlossError, Result};
use crate::video::frame::RawFrame;
use std::path::{Path, PathBuf};

/// Trait for raw frame sources.
///
/// This trait allows swapping implementations (live camera vs file replay vs mock).
pub trait FrameSource: Send {
    /// Prepare the source for a capture session.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the source at the end of a capture session.
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    /// Capture the current frame. Called once per capture tick.
    fn capture_frame(&mut self) -> Result<RawFrame>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "frame-source"
    }
}

/// Replays decoded image files as a frame stream, looping at the end.
pub struct ImageSequenceSource {
    frames: Vec<RawFrame>,
    position: usize,
}

impl ImageSequenceSource {
    /// Decode every image in `paths`, in order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let frames = paths
            .iter()
            .map(|path| decode(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_frames(frames)
    }

    /// Decode every `.png`/`.jpg`/`.jpeg` file in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        Self::from_paths(&paths)
    }

    /// Replay already decoded frames.
    pub fn from_frames(frames: Vec<RawFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(GlossError::FrameSource {
                message: "image sequence is empty".to_string(),
            });
        }
        Ok(Self {
            frames,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn start(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<RawFrame> {
        let frame = self.frames[self.position].clone();
        self.position = (self.position + 1) % self.frames.len();
        Ok(frame)
    }

    fn name(&self) -> &'static str {
        "image-sequence"
    }
}

fn decode(path: &Path) -> Result<RawFrame> {
    let image = image::open(path).map_err(|e| GlossError::FrameSource {
        message: format!("failed to decode {}: {}", path.display(), e),
    })?;
    RawFrame::try_from(image.to_rgba8())
}

/// Mock frame source for testing
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    frame: Option<RawFrame>,
    should_fail_start: bool,
    fail_every: Option<u64>,
    captured: u64,
}

impl MockFrameSource {
    /// A source returning a uniform gray 640x480 frame.
    pub fn new() -> Self {
        Self {
            frame: RawFrame::solid(640, 480, [128, 128, 128]).ok(),
            should_fail_start: false,
            fail_every: None,
            captured: 0,
        }
    }

    /// Configure the mock to return a specific frame
    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on every `n`-th capture (1-based).
    pub fn with_failure_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    /// Number of capture calls so far.
    pub fn captured(&self) -> u64 {
        self.captured
    }
}

impl Default for MockFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockFrameSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(GlossError::FrameSource {
                message: "mock start failure".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn capture_frame(&mut self) -> Result<RawFrame> {
        self.captured += 1;
        if let Some(n) = self.fail_every
            && self.captured % n == 0
        {
            return Err(GlossError::FrameSource {
                message: format!("mock capture failure #{}", self.captured),
            });
        }
        self.frame.clone().ok_or_else(|| GlossError::FrameSource {
            message: "mock frame unavailable".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn frame_source_is_object_safe() {
        let _source: Box<dyn FrameSource> = Box::new(MockFrameSource::new());
    }

    #[test]
    fn mock_returns_configured_frame() {
        let frame = RawFrame::solid(8, 8, [1, 2, 3]).unwrap();
        let mut source = MockFrameSource::new().with_frame(frame.clone());
        assert_eq!(source.capture_frame().unwrap(), frame);
        assert_eq!(source.captured(), 1);
    }

    #[test]
    fn mock_fails_periodically() {
        let mut source = MockFrameSource::new().with_failure_every(3);
        assert!(source.capture_frame().is_ok());
        assert!(source.capture_frame().is_ok());
        assert!(matches!(
            source.capture_frame(),
            Err(GlossError::FrameSource { .. })
        ));
        assert!(source.capture_frame().is_ok());
    }

    #[test]
    fn mock_start_failure() {
        let mut source = MockFrameSource::new().with_start_failure();
        assert!(source.start().is_err());
    }

    #[test]
    fn image_sequence_loops() {
        let a = RawFrame::solid(2, 2, [0, 0, 0]).unwrap();
        let b = RawFrame::solid(2, 2, [255, 255, 255]).unwrap();
        let mut source = ImageSequenceSource::from_frames(vec![a.clone(), b.clone()]).unwrap();

        assert_eq!(source.capture_frame().unwrap(), a);
        assert_eq!(source.capture_frame().unwrap(), b);
        assert_eq!(source.capture_frame().unwrap(), a);

        source.start().unwrap();
        assert_eq!(source.capture_frame().unwrap(), a);
    }

    #[test]
    fn image_sequence_rejects_empty() {
        assert!(ImageSequenceSource::from_frames(Vec::new()).is_err());
    }

    #[test]
    fn image_sequence_from_dir_decodes_sorted_pngs() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 3, Rgba([200, 0, 0, 255]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbaImage::from_pixel(4, 3, Rgba([0, 200, 0, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.capture_frame().unwrap();
        assert_eq!((first.width(), first.height()), (4, 3));
        assert_eq!(first.data()[1], 200);
    }

    #[test]
    fn image_sequence_reports_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        match ImageSequenceSource::from_paths(&[path]) {
            Err(GlossError::FrameSource { message }) => assert!(message.contains("broken.png")),
            other => panic!("Expected FrameSource error, got {:?}", other.map(|s| s.len())),
        }
    }
}
