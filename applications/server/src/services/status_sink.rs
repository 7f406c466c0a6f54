/// Status sink that logs updates and keeps the latest ones per channel
use chorus_core::{ReplyContext, StatusSink, StatusUpdate};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct RecentStatusSink {
    keep: usize,
    channels: Mutex<HashMap<String, VecDeque<String>>>,
}

impl RecentStatusSink {
    pub fn new(keep: usize) -> Self {
        Self {
            keep: keep.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Messages sent to a channel, oldest first
    pub fn recent(&self, channel: &str) -> Vec<String> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl StatusSink for RecentStatusSink {
    fn notify(&self, context: &ReplyContext, update: StatusUpdate) {
        let message = update.to_string();
        let requested_by = context.requested_by.as_deref().unwrap_or("-");

        match update {
            StatusUpdate::RequestFailed { .. } | StatusUpdate::PlaybackFailed { .. } => {
                tracing::warn!(channel = %context.channel, requested_by, "{}", message);
            }
            _ => tracing::info!(channel = %context.channel, requested_by, "{}", message),
        }

        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let messages = channels.entry(context.channel.clone()).or_default();
        if messages.len() == self.keep {
            messages.pop_front();
        }
        messages.push_back(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_messages_per_channel() {
        let sink = RecentStatusSink::new(2);
        let music = ReplyContext::new("music");
        let other = ReplyContext::new("other");

        sink.notify(&music, StatusUpdate::Received { reference: "a".to_string() });
        sink.notify(&music, StatusUpdate::Received { reference: "b".to_string() });
        sink.notify(&music, StatusUpdate::QueueFinished);
        sink.notify(&other, StatusUpdate::QueueFinished);

        assert_eq!(
            sink.recent("music"),
            vec![
                "Request received, processing b".to_string(),
                "Queue is empty, playback stopped".to_string(),
            ]
        );
        assert_eq!(sink.recent("other").len(), 1);
        assert!(sink.recent("nobody").is_empty());
    }
}
