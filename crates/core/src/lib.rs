pub mod directory;
pub mod error;
pub mod models;
pub mod suggestions;
pub mod templates;
pub mod triage;

pub use directory::{
    request_appointment, search_directory, Appointment, AppointmentRequest, DirectoryKind,
    DirectoryQuery, DirectoryResults, Doctor, Hospital,
};
pub use error::TriageError;
pub use models::*;
pub use suggestions::{select_suggestions, select_suggestions_by_key};
pub use templates::{build_prompt, template_for, LanguageTemplate};
pub use triage::classify_urgency;
