//! Source bundle: the four named fragments of one exercise.
use serde::{Deserialize, Serialize};

/// The recognized source fragments supplied by the host for one exercise.
///
/// This is a closed record rather than an open map: the recognized names are
/// fixed, unknown extra blocks are ignored, and a missing block is the empty
/// string. Any fragment may legitimately be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBundle {
    /// Skeleton shown to the learner in the editor.
    #[serde(default)]
    pub initial: String,
    /// Reference solution; also the source of the rendered hint.
    #[serde(default)]
    pub solution: String,
    /// Test contracts exercising the solution through the assertion library.
    #[serde(default)]
    pub validation: String,
    /// Shared declarations prepended to every compiled unit.
    #[serde(default)]
    pub context: String,
}

impl SourceBundle {
    /// Fragment names the pipeline recognizes.
    pub const FRAGMENTS: [&'static str; 4] = ["initial", "solution", "validation", "context"];

    /// Build a bundle from the host's named block list.
    ///
    /// Unknown names are dropped, later duplicates win, bodies are trimmed.
    pub fn from_blocks<I, N, B>(blocks: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: AsRef<str>,
    {
        let mut bundle = Self::default();
        for (name, body) in blocks {
            let body = body.as_ref().trim();
            match name.as_ref() {
                "initial" => bundle.initial = body.to_string(),
                "solution" => bundle.solution = body.to_string(),
                "validation" => bundle.validation = body.to_string(),
                "context" => bundle.context = body.to_string(),
                _ => {}
            }
        }
        bundle
    }
}
