pub mod text_completion;

pub use text_completion::{clean_reply, fill_scene, FilledScene, OpenAiCompletion, TextCompletion};
