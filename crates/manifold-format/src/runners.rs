//! Runner ownership inversion.
//!
//! In a description, `runner` is written on the pipeline that serves as a
//! build environment: it names the runner for whatever is built inside it.
//! In the manifest graph the runner belongs to the pipeline being built,
//! since that is whose stages it runs. [`propagate`] moves runners from the
//! description layout to the graph layout, [`build_runners`] recovers the
//! description layout.

use manifold_core::{Manifest, ObjectId, RunnerResolver};
use std::collections::HashMap;
use tracing::debug;

use crate::FormatResult;

/// Assign every pipeline its runner.
///
/// `declared` maps pipeline id -> the `runner` its description declared.
/// Pipelines with a build pipeline get the runner declared on it (possibly
/// none); root pipelines get the host runner, which is resolved at most once.
pub fn propagate(
    manifest: &mut Manifest,
    declared: &HashMap<ObjectId, Option<String>>,
    host: &dyn RunnerResolver,
) -> FormatResult<()> {
    let mut host_runner = None;

    for pipeline in manifest.pipelines_mut() {
        let runner = match pipeline.build {
            Some(build) => declared.get(&build).cloned().flatten(),
            None => {
                if host_runner.is_none() {
                    host_runner = Some(host.host_runner()?);
                }
                host_runner.clone()
            }
        };

        debug!(pipeline = %pipeline.name, runner = ?runner, "Assigned runner");
        pipeline.runner = runner;
    }

    Ok(())
}

/// Build pipeline id -> runner of the pipelines built inside it.
///
/// If several pipelines share a build pipeline, the last one wins.
pub fn build_runners(manifest: &Manifest) -> HashMap<ObjectId, String> {
    manifest
        .pipelines()
        .iter()
        .filter_map(|p| Some((p.build?, p.runner.clone()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{Error, FixedRunner, Result};

    struct NoHost;

    impl RunnerResolver for NoHost {
        fn host_runner(&self) -> Result<String> {
            Err(Error::NotFound("os-release".into()))
        }
    }

    fn manifest() -> Manifest {
        let mut manifest = Manifest::new();
        let a = manifest.add_pipeline("a", None, None).unwrap().id;
        let b = manifest.add_pipeline("b", None, Some(a)).unwrap().id;
        manifest.add_pipeline("c", None, Some(b)).unwrap();
        manifest
    }

    #[test]
    fn test_propagate_moves_runner_to_consumer() {
        let mut manifest = manifest();
        let declared = HashMap::from([
            (ObjectId::for_pipeline("a"), Some("org.osbuild.fedora38".to_string())),
            (ObjectId::for_pipeline("b"), None),
            (ObjectId::for_pipeline("c"), Some("org.osbuild.unused".to_string())),
        ]);

        propagate(&mut manifest, &declared, &FixedRunner("org.osbuild.host".into())).unwrap();

        let runner = |name: &str| manifest.by_name(name).unwrap().runner.clone();
        assert_eq!(runner("a").as_deref(), Some("org.osbuild.host"));
        assert_eq!(runner("b").as_deref(), Some("org.osbuild.fedora38"));
        assert_eq!(runner("c"), None);
    }

    #[test]
    fn test_propagate_without_root_skips_host() {
        let mut manifest = Manifest::new();
        let declared = HashMap::new();
        propagate(&mut manifest, &declared, &NoHost).unwrap();

        let mut manifest = self::manifest();
        assert!(propagate(&mut manifest, &declared, &NoHost).is_err());
    }

    #[test]
    fn test_build_runners_inverts_propagate() {
        let mut manifest = manifest();
        let declared = HashMap::from([(
            ObjectId::for_pipeline("a"),
            Some("org.osbuild.fedora38".to_string()),
        )]);
        propagate(&mut manifest, &declared, &FixedRunner("org.osbuild.host".into())).unwrap();

        let runners = build_runners(&manifest);
        assert_eq!(runners.len(), 1);
        assert_eq!(
            runners.get(&ObjectId::for_pipeline("a")).map(String::as_str),
            Some("org.osbuild.fedora38")
        );
    }
}
