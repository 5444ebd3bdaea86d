pub mod content;
pub mod menu;

use thiserror::Error;

/// Validation failures surfaced to the editor. `Display` is the inline message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("Vänligen fyll i alla obligatoriska fält")]
    MissingFields,
    #[error("Vänligen lägg till en bild genom att ladda upp en fil eller ange en URL.")]
    MissingImage,
    #[error("Okänd kategori: {0}")]
    UnknownCategory(String),
    #[error("Meny-id får inte vara tomt")]
    EmptyMenuId,
    #[error("Ogiltigt meny-id \"{0}\": använd små bokstäver, siffror, - och _")]
    InvalidMenuId(String),
    #[error("Meny-id \"{0}\" används redan")]
    DuplicateMenuId(String),
    #[error("Menyposten \"{0}\" finns inte")]
    UnknownMenuId(String),
    #[error("Inga fler id kan delas ut i listan")]
    IdsExhausted,
    #[error("Kunde inte spara innehållet: {0}")]
    Persist(String),
}

impl ContentError {
    /// The edit reached the cached document even though it was not saved.
    pub fn edit_applied(&self) -> bool {
        matches!(self, ContentError::Persist(_))
    }
}
