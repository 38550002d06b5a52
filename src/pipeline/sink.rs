use crate::error::{GlossError, Result};
use crate::gloss::PredictionSet;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Pluggable caption output. The transport that carries captions to peers
/// lives behind this trait.
pub trait CaptionSink: Send + 'static {
    /// Deliver one caption, already in `"<label> (<confidence>)"` form.
    fn send(&mut self, caption: &str) -> Result<()>;

    /// Called once per published prediction set. The default sends the top
    /// prediction's caption and ignores empty sets.
    fn handle(&mut self, predictions: &PredictionSet) -> Result<()> {
        match predictions.top() {
            Some(top) => self.send(&top.caption()),
            None => Ok(()),
        }
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Hands captions to a bounded channel. A full channel drops the caption
/// instead of stalling the inference thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }
}

impl CaptionSink for ChannelSink {
    fn send(&mut self, caption: &str) -> Result<()> {
        match self.tx.try_send(caption.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                debug!(caption = %dropped, "caption channel full, dropping");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(GlossError::Other("caption receiver disconnected".to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Collects captions in memory. Clones share the same list, so a test can
/// keep one clone and hand the other to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    collected: Arc<Mutex<Vec<String>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captions(&self) -> Vec<String> {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CaptionSink for CollectorSink {
    fn send(&mut self, caption: &str) -> Result<()> {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(caption.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gloss::Prediction;

    fn set(labels: &[(&str, f32)]) -> PredictionSet {
        PredictionSet::new(
            labels
                .iter()
                .enumerate()
                .map(|(index, (label, score))| Prediction {
                    index,
                    label: label.to_string(),
                    score: *score,
                })
                .collect(),
        )
    }

    #[test]
    fn trait_is_object_safe() {
        let _sink: Box<dyn CaptionSink> = Box::new(CollectorSink::new());
    }

    #[test]
    fn handle_sends_top_caption() {
        let collector = CollectorSink::new();
        let mut sink = collector.clone();
        sink.handle(&set(&[("HELLO", 0.9), ("BYE", 0.1)])).unwrap();
        assert_eq!(collector.captions(), vec!["HELLO (0.900)"]);
    }

    #[test]
    fn handle_ignores_empty_set() {
        let collector = CollectorSink::new();
        let mut sink = collector.clone();
        sink.handle(&PredictionSet::default()).unwrap();
        assert!(collector.captions().is_empty());
    }

    #[test]
    fn channel_sink_delivers() {
        let (mut sink, rx) = ChannelSink::bounded(4);
        sink.send("A (5.000)").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "A (5.000)");
    }

    #[test]
    fn channel_sink_drops_when_full() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        sink.send("first").unwrap();
        sink.send("second").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_errors_when_disconnected() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        drop(rx);
        assert!(sink.send("lost").is_err());
    }

    #[test]
    fn sink_names() {
        assert_eq!(CollectorSink::new().name(), "collector");
        assert_eq!(ChannelSink::bounded(1).0.name(), "channel");
    }
}
