use serde::Serialize;

/// Button text requesting conversion of the staged photos.
pub const BTN_TO_PDF: &str = "To PDF";
/// Button text removing the most recently staged photo.
pub const BTN_REMOVE_LAST: &str = "Remove last photo";
/// Button text returning from naming to collecting.
pub const BTN_BACK: &str = "Back";
/// Button text abandoning the session.
pub const BTN_CANCEL: &str = "Cancel";
/// Button text starting a session (a plain command, shown as a shortcut).
pub const BTN_PHOTOS: &str = "/photos";

/// A Telegram reply keyboard: rows of buttons shown under the input field.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboard {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
struct KeyboardButton {
    text: String,
}

/// Builds a keyboard from rows of button texts.
pub fn keyboard(rows: &[&[&str]]) -> ReplyKeyboard {
    ReplyKeyboard {
        keyboard: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|text| KeyboardButton {
                        text: (*text).to_string(),
                    })
                    .collect()
            })
            .collect(),
        resize_keyboard: true,
    }
}

/// Keyboard shown while the user is uploading photos.
pub fn collecting() -> ReplyKeyboard {
    keyboard(&[&[BTN_TO_PDF, BTN_CANCEL], &[BTN_REMOVE_LAST]])
}

/// Keyboard shown while the user is choosing the document name.
pub fn naming() -> ReplyKeyboard {
    keyboard(&[&[BTN_BACK, BTN_CANCEL]])
}

/// Keyboard shown when no session is in flight.
pub fn idle() -> ReplyKeyboard {
    keyboard(&[&[BTN_PHOTOS]])
}
