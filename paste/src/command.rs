//! Glue between host editor commands and the capture workflow.

use crate::capture::CaptureError;
use crate::capture::CaptureOutcome;
use crate::capture::CaptureRequest;
use crate::capture::ImageCaptureWorkflow;
use crate::collaborators::ClipboardSource;
use crate::collaborators::EditorSink;
use crate::collaborators::FileStore;
use crate::collaborators::ImageCodec;
use crate::settings::Settings;

pub const HOST_PASTE_COMMAND: &str = "paste";
pub const NO_IMAGE_MESSAGE: &str = "No image in clipboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteCommand {
    /// Fall back to the host's text paste when the clipboard holds no image.
    pub paste_stand_in: bool,
    pub confirm_filename: bool,
}

impl PasteCommand {
    /// The explicitly invoked command: reports a missing image instead of pasting text.
    pub fn explicit(settings: &Settings) -> Self {
        Self {
            paste_stand_in: false,
            confirm_filename: settings.confirm_filename,
        }
    }
}

/// Decide whether the host's `command_name` should be replaced by an image paste.
pub fn intercept_paste(command_name: &str, settings: &Settings) -> Option<PasteCommand> {
    if command_name != HOST_PASTE_COMMAND || settings.leave_my_keys_alone {
        return None;
    }
    Some(PasteCommand {
        paste_stand_in: true,
        confirm_filename: settings.confirm_filename,
    })
}

/// Run an image paste and report problems to the user instead of the caller.
pub fn run_paste_command<C, F, I>(
    workflow: &mut ImageCaptureWorkflow<C, F, I>,
    command: PasteCommand,
    mut request: CaptureRequest,
    sink: &mut impl EditorSink,
) -> Result<CaptureOutcome, CaptureError>
where
    C: ClipboardSource,
    F: FileStore,
    I: ImageCodec,
{
    request.confirm_filename = command.confirm_filename;
    let outcome = workflow.capture(&request, sink);
    match &outcome {
        Ok(CaptureOutcome::NoImage) if command.paste_stand_in => sink.paste_text(),
        Ok(CaptureOutcome::NoImage) => sink.status_message(NO_IMAGE_MESSAGE),
        Ok(CaptureOutcome::Cancelled { cleanup: Err(err) }) => {
            tracing::debug!("cleanup after cancelled paste failed: {err}");
        }
        Ok(CaptureOutcome::Inserted { path, .. }) => {
            tracing::debug!("inserted reference to {}", path.display());
        }
        Ok(CaptureOutcome::Cancelled { cleanup: Ok(()) }) => {}
        Err(err) => {
            tracing::warn!("image paste failed: {err}");
            sink.status_message(&format!("ImagePaste: {err}"));
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn intercepts_plain_paste_only() {
        let settings = Settings::default();
        assert_eq!(
            intercept_paste("paste", &settings),
            Some(PasteCommand {
                paste_stand_in: true,
                confirm_filename: true,
            })
        );
        assert_eq!(intercept_paste("paste_and_indent", &settings), None);
        assert_eq!(intercept_paste("copy", &settings), None);
    }

    #[test]
    fn leave_my_keys_alone_disables_interception() {
        let settings = Settings {
            leave_my_keys_alone: true,
            ..Settings::default()
        };
        assert_eq!(intercept_paste("paste", &settings), None);
    }

    #[test]
    fn explicit_command_honors_confirm_setting() {
        let settings = Settings {
            confirm_filename: false,
            ..Settings::default()
        };
        assert_eq!(
            PasteCommand::explicit(&settings),
            PasteCommand {
                paste_stand_in: false,
                confirm_filename: false,
            }
        );
    }
}
