pub mod ai_client;
pub mod app_state;
pub mod commands;
pub mod error;
pub mod parser;
pub mod pdf_extractor;
pub mod record;
pub mod settings;
pub mod storage;
pub mod transcribe;
pub mod utils;
pub mod view;

pub use app_state::AppState;
pub use error::{StudyError, StudyResult};
pub use parser::parse_response;
pub use record::{Flashcard, SummaryRecord};
