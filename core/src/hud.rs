//! HUD collaborator seam.
//!
//! Script actions never draw anything. They hand messages to a
//! `HudSink`; the battle screen implements it for real, and
//! `MessageQueue` is the headless implementation used by the runner
//! and the tests.

use crate::{config::HudConfig, types::{Millis, SpacecraftId}};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudMessage {
    pub text:             String,
    /// Display time; `None` lets the HUD derive it from the text length.
    pub duration:         Option<Millis>,
    /// Typewriter-style reveal.
    pub appear_animation: bool,
    pub permanent:        bool,
    pub color:            Option<[f32; 4]>,
    pub silent:           bool,
    pub no_background:    bool,
    pub source:           Option<SpacecraftId>,
}

/// The contract the presentation layer fulfils for script actions.
pub trait HudSink: Send {
    /// Urgent messages go to the front of the queue, others to the back.
    fn queue_message(&mut self, message: HudMessage, urgent: bool);

    fn clear_messages(&mut self);

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}

/// Headless message queue.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    config: HudConfig,
    queue:  VecDeque<HudMessage>,
}

impl MessageQueue {
    pub fn new(config: HudConfig) -> Self {
        Self { config, queue: VecDeque::new() }
    }

    pub fn duration_for(&self, text: &str) -> Millis {
        let chars = text.chars().count() as Millis;
        (self.config.message_base_ms + chars * self.config.message_per_char_ms)
            .min(self.config.message_max_ms)
    }

    pub fn messages(&self) -> impl Iterator<Item = &HudMessage> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Takes the message currently on screen.
    pub fn pop(&mut self) -> Option<HudMessage> {
        self.queue.pop_front()
    }
}

impl HudSink for MessageQueue {
    fn queue_message(&mut self, mut message: HudMessage, urgent: bool) {
        if message.duration.is_none() {
            message.duration = Some(self.duration_for(&message.text));
        }
        if urgent {
            self.queue.push_front(message);
        } else {
            self.queue.push_back(message);
        }
    }

    fn clear_messages(&mut self) {
        self.queue.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
