//! Sound effect handles.
//!
//! Decoding and mixing live in the platform audio backend. This registry only
//! tracks, per sound, whether it is playing and whether a start or end
//! transition is waiting to be forwarded to scripts by
//! [`dispatch_sounds`](crate::systems::sound::dispatch_sounds).
//!
//! This is a non-send store: handles are shared between stages through `Rc`.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};
use rustc_hash::FxHashMap;

#[derive(Debug)]
pub struct SoundFx {
    name: String,
    path: PathBuf,
    playing: Cell<bool>,
    looping: Cell<bool>,
    volume: Cell<f32>,
    started: Cell<bool>,
    ended: Cell<bool>,
}

impl SoundFx {
    fn new(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_owned(),
            path,
            playing: Cell::new(false),
            looping: Cell::new(false),
            volume: Cell::new(1.0),
            started: Cell::new(false),
            ended: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn play(&self) {
        debug!("sound '{}' play", self.name);
        self.playing.set(true);
        self.started.set(true);
    }

    pub fn stop(&self) {
        if self.playing.replace(false) {
            debug!("sound '{}' stop", self.name);
            self.ended.set(true);
        }
    }

    /// Called by the audio backend when playback reaches the end of the clip.
    /// Looping sounds never finish on their own.
    pub fn finish(&self) {
        if !self.looping.get() && self.playing.replace(false) {
            self.ended.set(true);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    pub fn set_looping(&self, looping: bool) {
        self.looping.set(looping);
    }

    pub fn is_looping(&self) -> bool {
        self.looping.get()
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.set(volume.clamp(0.0, 1.0));
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Returns and clears the pending start transition.
    pub fn take_started(&self) -> bool {
        self.started.replace(false)
    }

    /// Returns and clears the pending end transition.
    pub fn take_ended(&self) -> bool {
        self.ended.replace(false)
    }
}

#[derive(Debug)]
pub struct SoundRegistry {
    root: PathBuf,
    sounds: RefCell<FxHashMap<String, Rc<SoundFx>>>,
}

impl SoundRegistry {
    /// `root` is the directory holding `<name>.ogg` files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sounds: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn get_or_load(&self, name: &str) -> Rc<SoundFx> {
        if let Some(fx) = self.sounds.borrow().get(name) {
            return fx.clone();
        }
        let path = self.root.join(format!("{name}.ogg"));
        if !path.is_file() {
            warn!("sound '{}' has no file at {}", name, path.display());
        }
        let fx = Rc::new(SoundFx::new(name, path));
        self.sounds.borrow_mut().insert(name.to_owned(), fx.clone());
        fx
    }

    pub fn len(&self) -> usize {
        self.sounds.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_shared_by_name() {
        let registry = SoundRegistry::new("/nonexistent");
        let a = registry.get_or_load("jump");
        let b = registry.get_or_load("jump");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert_eq!(a.path(), Path::new("/nonexistent/jump.ogg"));
    }

    #[test]
    fn transitions_are_consumed_once() {
        let registry = SoundRegistry::new("/nonexistent");
        let fx = registry.get_or_load("coin");
        fx.play();
        assert!(fx.take_started());
        assert!(!fx.take_started());
        fx.stop();
        assert!(fx.take_ended());
        assert!(!fx.take_ended());
    }

    #[test]
    fn stopping_an_idle_sound_is_silent() {
        let registry = SoundRegistry::new("/nonexistent");
        let fx = registry.get_or_load("coin");
        fx.stop();
        assert!(!fx.take_ended());
    }

    #[test]
    fn looping_sound_ignores_finish() {
        let registry = SoundRegistry::new("/nonexistent");
        let fx = registry.get_or_load("music");
        fx.set_looping(true);
        fx.play();
        fx.finish();
        assert!(fx.is_playing());
        assert!(!fx.take_ended());
    }
}
