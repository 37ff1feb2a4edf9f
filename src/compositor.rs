//! Draw command sink.
//!
//! The presenter never talks to a graphics API directly: it fills a
//! [`Compositor`] with [`DrawCommand`]s and the compositor flushes them once
//! per frame. [`RecordingCompositor`] keeps flushed frames in memory for
//! headless runs and tests.

use crate::resources::nametable::NameId;

/// One sprite quad, already resolved to its keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub atlas: NameId,
    pub sprite: u32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// Cosine and sine of the rotation, from the trig table.
    pub cos: f32,
    pub sin: f32,
    pub alpha: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Sprite(SpriteDraw),
    /// Outline rectangle, used by the hitbox overlay.
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: [u8; 4],
    },
}

pub trait Compositor {
    /// Queue a command for the current frame.
    fn submit(&mut self, command: DrawCommand);

    /// Flush every queued command.
    fn draw(&mut self);

    fn push(&mut self, sprite: SpriteDraw) {
        self.submit(DrawCommand::Sprite(sprite));
    }
}

/// In-memory compositor.
#[derive(Debug, Default)]
pub struct RecordingCompositor {
    pending: Vec<DrawCommand>,
    last_frame: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the most recently flushed frame.
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn pending(&self) -> &[DrawCommand] {
        &self.pending
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sprites of the last frame, in draw order.
    pub fn sprites(&self) -> impl Iterator<Item = &SpriteDraw> {
        self.last_frame.iter().filter_map(|c| match c {
            DrawCommand::Sprite(s) => Some(s),
            DrawCommand::Rect { .. } => None,
        })
    }
}

impl Compositor for RecordingCompositor {
    fn submit(&mut self, command: DrawCommand) {
        self.pending.push(command);
    }

    fn draw(&mut self) {
        self.last_frame = std::mem::take(&mut self.pending);
        self.frames += 1;
    }
}
