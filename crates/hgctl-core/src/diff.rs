use std::path::Path;
use tracing::debug;

use crate::revision::{RevisionResolver, FIRST_REVISION};
use crate::runner::HgRunner;
use crate::HgError;

/// Drop one leading informational line when the output is not a bare diff
fn strip_leading_noise(output: String) -> String {
    if output.starts_with("diff") {
        return output;
    }
    match output.split_once('\n') {
        Some((_, rest)) => rest.to_string(),
        None => String::new(),
    }
}

/// Computes file diffs between revisions
#[derive(Clone, Copy)]
pub struct DiffEngine<'a> {
    runner: HgRunner<'a>,
    revisions: RevisionResolver<'a>,
}

impl<'a> DiffEngine<'a> {
    pub fn new(runner: HgRunner<'a>) -> Self {
        Self {
            runner,
            revisions: RevisionResolver::new(runner),
        }
    }

    /// Diff of `file` between two revisions
    pub async fn diff(
        &self,
        from: &str,
        to: &str,
        file: &Path,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let file_arg = file.to_string_lossy();
        let output = self
            .runner
            .hg(&["diff", "-r", from, "-r", to, &file_arg], working_dir)
            .await?;
        Ok(strip_leading_noise(output))
    }

    /// Diff introduced by the latest change to `file` up to `base`.
    ///
    /// `base` defaults to the file's current revision. The narrow diff against
    /// the previous revision is tried first; if that fails, the diff against
    /// the repository's first revision is returned instead.
    pub async fn last_diff(
        &self,
        file: &Path,
        base: Option<&str>,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let base = match base {
            Some(base) => base.to_string(),
            None => self
                .revisions
                .current_revision(file, working_dir)
                .await?
                .into_string(),
        };

        match self.narrow_diff(file, &base, working_dir).await {
            Ok(diff) => Ok(diff),
            Err(e) => {
                debug!(
                    file = %file.display(),
                    base = %base,
                    error = %e,
                    "Narrow diff failed, diffing against first revision"
                );
                self.diff(FIRST_REVISION, &base, file, working_dir).await
            }
        }
    }

    async fn narrow_diff(
        &self,
        file: &Path,
        base: &str,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let previous = self
            .revisions
            .previous_revision(file, base, working_dir)
            .await;
        self.diff(previous.diff_base(), base, file, working_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use crate::testing::{args, ScriptedExecutor};
    use tempfile::TempDir;

    const DIFF: &str = "diff -r 1a2b3c4d5e6f -r 9f3c2a1b7d4e File1.java\n\
                        --- a/File1.java\n\
                        +++ b/File1.java\n\
                        @@ -1,1 +1,2 @@\n\
                        \x20class File1 {}\n\
                        +// Some extra text\n";

    fn setup() -> (TempDir, RepositoryConfig) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("File1.java"), "class File1 {}\n").unwrap();
        let config = RepositoryConfig::builder()
            .basedir(dir.path())
            .repo_name(".")
            .build()
            .unwrap();
        (dir, config)
    }

    #[test]
    fn test_strip_leading_noise() {
        assert_eq!(strip_leading_noise(DIFF.to_string()), DIFF);
        assert_eq!(
            strip_leading_noise(format!("warning: ignoring unknown option\n{DIFF}")),
            DIFF
        );
        assert_eq!(strip_leading_noise("single line".to_string()), "");
        assert_eq!(strip_leading_noise(String::new()), "");
    }

    #[test]
    fn test_strip_only_once() {
        let output = "notice one\nnotice two\ndiff -r a -r b f\n".to_string();
        assert_eq!(strip_leading_noise(output), "notice two\ndiff -r a -r b f\n");
    }

    #[tokio::test]
    async fn test_diff_arguments() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new().ok(DIFF);
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        let diff = engine
            .diff("1:aaa", "2:bbb", Path::new("File1.java"), None)
            .await
            .unwrap();

        assert!(diff.starts_with("diff"));
        assert_eq!(
            executor.calls(),
            vec![args(&["diff", "-r", "1:aaa", "-r", "2:bbb", "File1.java"])]
        );
    }

    #[tokio::test]
    async fn test_last_diff_narrow_path() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new()
            .ok("changeset:   2:9f3c2a1b7d4e\n")
            .ok("changeset:   1:1a2b3c4d5e6f\n")
            .ok(DIFF);
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        let diff = engine
            .last_diff(Path::new("File1.java"), None, None)
            .await
            .unwrap();

        assert_eq!(diff, DIFF);
        assert_eq!(
            executor.calls(),
            vec![
                args(&["parents", "File1.java"]),
                args(&["parents", "-r", "2:9f3c2a1b7d4e", "File1.java"]),
                args(&["diff", "-r", "1:1a2b3c4d5e6f", "-r", "2:9f3c2a1b7d4e", "File1.java"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_last_diff_with_explicit_base() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new()
            .ok("changeset:   4:444444444444\n")
            .ok(DIFF);
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        engine
            .last_diff(Path::new("File1.java"), Some("5:555555555555"), None)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], args(&["parents", "-r", "5:555555555555", "File1.java"]));
    }

    #[tokio::test]
    async fn test_last_diff_without_previous_uses_first_revision() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new()
            .fail("abort: 'File1.java' not found in manifest!", 255)
            .ok(DIFF);
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        engine
            .last_diff(Path::new("File1.java"), Some("0:1a2b3c4d5e6f"), None)
            .await
            .unwrap();

        assert_eq!(
            executor.calls()[1],
            args(&["diff", "-r", "0", "-r", "0:1a2b3c4d5e6f", "File1.java"])
        );
    }

    #[tokio::test]
    async fn test_last_diff_falls_back_after_narrow_failure() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new()
            .ok("changeset:   1:1a2b3c4d5e6f\n")
            .fail("abort: unknown revision", 255)
            .ok(DIFF);
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        let diff = engine
            .last_diff(Path::new("File1.java"), Some("2:9f3c2a1b7d4e"), None)
            .await
            .unwrap();

        assert_eq!(diff, DIFF);
        assert_eq!(
            executor.calls(),
            vec![
                args(&["parents", "-r", "2:9f3c2a1b7d4e", "File1.java"]),
                args(&["diff", "-r", "1:1a2b3c4d5e6f", "-r", "2:9f3c2a1b7d4e", "File1.java"]),
                args(&["diff", "-r", "0", "-r", "2:9f3c2a1b7d4e", "File1.java"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_last_diff_propagates_fallback_failure() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new()
            .ok("changeset:   1:1a2b3c4d5e6f\n")
            .fail("abort: narrow", 255)
            .fail("abort: full history", 255);
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        let err = engine
            .last_diff(Path::new("File1.java"), Some("2:9f3c2a1b7d4e"), None)
            .await
            .unwrap_err();

        assert_eq!(err.captured_output(), Some("abort: full history"));
    }

    #[tokio::test]
    async fn test_last_diff_missing_file() {
        let (_dir, config) = setup();
        let executor = ScriptedExecutor::new();
        let engine = DiffEngine::new(HgRunner::new(&config, &executor));

        let err = engine
            .last_diff(Path::new("Nope.java"), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, HgError::FileNotFound { .. }));
        assert!(executor.calls().is_empty());
    }
}
