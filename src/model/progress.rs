use serde::{Deserialize, Serialize};

/// Which steps of a post a reader has ticked off. Lives with the reader (browser storage
/// under [`CompletionState::storage_key`]); the server only ever receives a copy to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionState {
    completed: Vec<usize>,
}

impl CompletionState {
    pub fn storage_key(post_uuid: &str) -> String {
        format!("progress-{post_uuid}")
    }

    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let mut state = Self::default();
        for index in indices {
            if !state.is_completed(index) {
                state.completed.push(index);
            }
        }
        state
    }

    /// Parse the `completed=0,2,5` query form. Blank input is an empty state.
    pub fn parse_query(raw: &str) -> Result<Self, String> {
        let indices = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| format!("invalid step index: {part}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_indices(indices))
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(pos) = self.completed.iter().position(|&i| i == index) {
            self.completed.remove(pos);
        } else {
            self.completed.push(index);
        }
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn indices(&self) -> &[usize] {
        &self.completed
    }

    /// Indices at or beyond `total_steps` are ignored.
    pub fn progress_percent(&self, total_steps: usize) -> u32 {
        if total_steps == 0 {
            return 0;
        }
        let done = self.completed.iter().filter(|&&i| i < total_steps).count();
        ((done as f64 / total_steps as f64) * 100.0).round() as u32
    }
}
