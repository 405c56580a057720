use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Numbered image files on disk: `<base_path>/<prefix><index><extension>`
/// with the index zero-padded to `fill_width` digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSequence {
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub start_index: usize,
    /// Inclusive.
    #[serde(default = "default_end_index")]
    pub end_index: usize,
    #[serde(default = "default_fill_width")]
    pub fill_width: usize,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("../images/")
}

fn default_prefix() -> String {
    "KITTI/2011_09_26/image_00/data/000000".to_string()
}

fn default_extension() -> String {
    ".png".to_string()
}

fn default_end_index() -> usize {
    9
}

fn default_fill_width() -> usize {
    4
}

impl Default for ImageSequence {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            prefix: default_prefix(),
            extension: default_extension(),
            start_index: 0,
            end_index: default_end_index(),
            fill_width: default_fill_width(),
        }
    }
}

impl ImageSequence {
    pub fn len(&self) -> usize {
        if self.end_index < self.start_index {
            0
        } else {
            (self.end_index - self.start_index).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self, index: usize) -> PathBuf {
        let name = format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.extension,
            width = self.fill_width
        );
        self.base_path.join(name)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        (self.start_index..=self.end_index)
            .take(self.len())
            .map(|index| self.path(index))
            .collect()
    }
}
