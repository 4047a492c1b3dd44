//! Built-in renderer backends.

pub mod headless;

pub use headless::{
    AnimationManifest, CallRecord, HeadlessLog, HeadlessRenderer, RecordedCall, SceneManifest, HEADLESS,
};
