//! Paste clipboard images into documents and preview the image references they contain.
//!
//! The decision logic lives in `image_paste_core`; this crate wires it to the clipboard, the
//! filesystem, image codecs, and the host editor through the traits in [`collaborators`].

pub mod capture;
pub mod clipboard;
pub mod codec;
pub mod collaborators;
pub mod command;
pub mod fs_store;
pub mod preview;
pub mod scan;
pub mod settings;

pub use capture::CaptureError;
pub use capture::CaptureOutcome;
pub use capture::CaptureRequest;
pub use capture::ImageCaptureWorkflow;
pub use capture::SavedImage;
pub use clipboard::ArboardClipboard;
pub use codec::ImageCrateCodec;
pub use collaborators::CapturedImage;
pub use collaborators::ClipboardSource;
pub use collaborators::EditorSink;
pub use collaborators::FileStore;
pub use collaborators::ImageCodec;
pub use command::PasteCommand;
pub use command::intercept_paste;
pub use command::run_paste_command;
pub use fs_store::StdFileStore;
pub use preview::Overlay;
pub use preview::PreviewRenderer;
pub use preview::PreviewUpdate;
pub use scan::find_image_references;
pub use settings::Settings;
pub use settings::SettingsStore;
