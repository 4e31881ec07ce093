//! Projects: ordered scene lists with render options.
//!
//! Project persistence lives outside this crate. The compositor consumes
//! projects through [`ProjectProvider`]; [`MemoryProjectStore`] serves
//! tests, the CLI and embedders that load projects from JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::BoxFuture;
use crate::color::{ColorCorrectParams, SingleBandOptions};
use crate::store::LayerId;

/// Errors raised by project providers.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to read project file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project definition: {0}")]
    Parse(String),

    #[error("Project backend error: {0}")]
    Backend(String),
}

/// One scene's place in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosaicDefinition {
    pub scene_id: LayerId,
    #[serde(default)]
    pub color_correction: ColorCorrectParams,
}

impl MosaicDefinition {
    pub fn new(scene_id: impl Into<LayerId>) -> Self {
        Self {
            scene_id: scene_id.into(),
            color_correction: ColorCorrectParams::default(),
        }
    }

    pub fn with_color_correction(mut self, params: ColorCorrectParams) -> Self {
        self.color_correction = params;
        self
    }
}

/// A mosaic project. Scene order is significant: later scenes draw over
/// earlier ones when merging without colour correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub scenes: Vec<MosaicDefinition>,
    #[serde(default)]
    pub single_band_options: Option<SingleBandOptions>,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scenes: Vec::new(),
            single_band_options: None,
        }
    }

    pub fn with_scene(mut self, scene: MosaicDefinition) -> Self {
        self.scenes.push(scene);
        self
    }

    pub fn with_single_band_options(mut self, options: SingleBandOptions) -> Self {
        self.single_band_options = Some(options);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|e| ProjectError::Parse(e.to_string()))
    }

    /// Load a project from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Source of project definitions.
pub trait ProjectProvider: Send + Sync {
    /// Look up a project. `Ok(None)` when no project has this id.
    fn project(&self, id: &str) -> BoxFuture<'_, Result<Option<Project>, ProjectError>>;
}

/// In-memory project provider.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: HashMap<String, Project>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, project: Project) {
        self.projects.insert(project.id.clone(), project);
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl FromIterator<Project> for MemoryProjectStore {
    fn from_iter<I: IntoIterator<Item = Project>>(iter: I) -> Self {
        let mut store = Self::new();
        for project in iter {
            store.insert(project);
        }
        store
    }
}

impl ProjectProvider for MemoryProjectStore {
    fn project(&self, id: &str) -> BoxFuture<'_, Result<Option<Project>, ProjectError>> {
        let found = self.projects.get(id).cloned();
        Box::pin(async move { Ok(found) })
    }
}
