pub mod model;

pub use model::{EditorError, IdClock, ScenarioEditorState, today_label};
