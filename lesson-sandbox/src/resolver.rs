//! Lesson identity to script path resolution

use crate::config::LessonsConfig;
use crate::error::ResolveError;
use std::path::{Component, Path, PathBuf};

/// Maps `(category, name)` to a script on disk
pub trait LessonResolver: Send + Sync {
    fn resolve(&self, category: &str, name: &str) -> Result<PathBuf, ResolveError>;
}

impl<F> LessonResolver for F
where
    F: Fn(&str, &str) -> Result<PathBuf, ResolveError> + Send + Sync,
{
    fn resolve(&self, category: &str, name: &str) -> Result<PathBuf, ResolveError> {
        self(category, name)
    }
}

/// Resolves lessons laid out as `root/<category>/<name>`
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
    default_extension: String,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_extension: String::new(),
        }
    }

    pub fn from_config(config: &LessonsConfig) -> Self {
        Self::new(&config.root).with_default_extension(&config.default_extension)
    }

    /// Extension appended to names that have none, e.g. `py`
    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LessonResolver for DirectoryResolver {
    fn resolve(&self, category: &str, name: &str) -> Result<PathBuf, ResolveError> {
        ensure_component(category)?;
        ensure_component(name)?;

        let mut path = self.root.join(category).join(name);
        if path.extension().is_none() && !self.default_extension.is_empty() {
            path.set_extension(&self.default_extension);
        }

        if path.is_file() {
            Ok(path)
        } else {
            Err(ResolveError::LessonNotFound {
                category: category.to_string(),
                name: name.to_string(),
            })
        }
    }
}

/// Lesson ids must stay inside the lesson root
fn ensure_component(part: &str) -> Result<(), ResolveError> {
    let mut components = Path::new(part).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == part => Ok(()),
        _ => Err(ResolveError::InvalidLessonId(part.to_string())),
    }
}
