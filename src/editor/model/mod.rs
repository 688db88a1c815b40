mod clock;
mod error;
mod state;

pub use clock::{IdClock, today_label};
pub use error::EditorError;
pub use state::ScenarioEditorState;
