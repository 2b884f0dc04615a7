pub mod history;
pub mod registry;
pub mod wire;

pub use history::{HistoryEntry, HistoryStore};
pub use registry::{CategoryConfig, CategoryRegistry, FormatterKind, UnknownCategory};
pub use wire::{decode_frame, encode_frame, Action, Envelope, FrameError};
