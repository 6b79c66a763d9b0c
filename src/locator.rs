//! Output locator: maps a task identity to the storage locations it owns.
//!
//! Pure derivation, no I/O ever. The configured key prefix is the only
//! state, passed in at construction; nothing here is cached or persisted.

use crate::errors::TrackerError;
use crate::models::TaskIdentity;
use crate::validation::validate_subdir;

/// Fixed marker object name inside every task's output directory.
pub const SUCCESS_MARKER: &str = "_SUCCESS.json";

/// Derives object keys for task outputs under an optional root prefix.
#[derive(Debug, Clone, Default)]
pub struct OutputLocator {
    prefix: Option<String>,
}

impl OutputLocator {
    /// Creates a locator. `prefix` namespaces every derived key, the way a
    /// bucket sub-path would; `None` roots tasks at the top of the store.
    pub fn new(prefix: Option<String>) -> Self {
        let prefix = prefix.filter(|p| !p.is_empty());
        Self { prefix }
    }

    /// The output directory key owned by `task`.
    ///
    /// Deterministic and side-effect-free; identical identities always map
    /// to identical keys.
    pub fn output_dir(&self, task: &TaskIdentity) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{}", task.dir_name()),
            None => task.dir_name(),
        }
    }

    /// Full key for the task's output, or one of its named sub-outputs.
    pub fn resolve(
        &self,
        task: &TaskIdentity,
        subdir: Option<&str>,
    ) -> Result<String, TrackerError> {
        let dir = self.output_dir(task);
        match subdir {
            None => Ok(dir),
            Some(subdir) => {
                validate_subdir(subdir)?;
                Ok(format!("{dir}/{subdir}"))
            }
        }
    }

    /// Key of the task's success marker.
    pub fn marker_path(&self, task: &TaskIdentity) -> String {
        format!("{}/{SUCCESS_MARKER}", self.output_dir(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> TaskIdentity {
        TaskIdentity::new(name).unwrap()
    }

    #[test]
    fn test_output_dir_with_and_without_prefix() {
        let bare = OutputLocator::new(None);
        assert_eq!(bare.output_dir(&task("ingest_v1")), "ingest_v1");

        let rooted = OutputLocator::new(Some("recsys-1".to_string()));
        assert_eq!(rooted.output_dir(&task("ingest_v1")), "recsys-1/ingest_v1");
    }

    #[test]
    fn test_empty_prefix_behaves_like_none() {
        let locator = OutputLocator::new(Some(String::new()));
        assert_eq!(locator.output_dir(&task("t")), "t");
    }

    #[test]
    fn test_resolve_joins_subdir() {
        let locator = OutputLocator::new(Some("data".to_string()));
        assert_eq!(
            locator.resolve(&task("t"), Some("reviews")).unwrap(),
            "data/t/reviews"
        );
        assert_eq!(locator.resolve(&task("t"), None).unwrap(), "data/t");
    }

    #[test]
    fn test_resolve_rejects_bad_subdir() {
        let locator = OutputLocator::new(None);
        assert!(matches!(
            locator.resolve(&task("t"), Some("../up")),
            Err(TrackerError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_marker_path_is_fixed_filename_under_output_dir() {
        let locator = OutputLocator::new(Some("data".to_string()));
        assert_eq!(
            locator.marker_path(&task("ingest_v1")),
            "data/ingest_v1/_SUCCESS.json"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let locator = OutputLocator::new(Some("data".to_string()));
        let a = task("t").with_param("model", "v2").unwrap();
        let b = task("t").with_param("model", "v2").unwrap();
        assert_eq!(locator.output_dir(&a), locator.output_dir(&b));
    }
}
