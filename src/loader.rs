use std::path::{Path, PathBuf};

use crate::env::TargetEnv;
use crate::error::Error;
use crate::model::{EnvMap, LoadReport};
use crate::parser::parse_into;

const DEFAULT_FILE: &str = ".env";

/// Read files in order into one session map without exporting anything.
///
/// Later files can reference keys defined by earlier ones, and later
/// definitions win. With no paths, `.env` in the working directory is read.
pub fn read<I, P>(paths: I) -> Result<EnvMap, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    EnvLoader::new().paths(paths).read()
}

/// Read files into one session map and export it into the process environment.
///
/// Variables already set in the process are kept unless `override_existing`
/// is true.
///
/// # Safety
///
/// The caller must ensure no other threads concurrently read or write the
/// process environment while this runs.
pub unsafe fn load<I, P>(override_existing: bool, paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    // SAFETY: forwarded to the caller.
    let target = unsafe { TargetEnv::process() };
    let mut loader = EnvLoader::new()
        .paths(paths)
        .override_existing(override_existing)
        .target(target);
    loader.load()
}

/// Load `.env` from the current working directory into the process environment.
///
/// # Safety
///
/// Same contract as [`load`].
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    unsafe { load(false, [DEFAULT_FILE]) }
}

/// Builder-style session loader.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    override_existing: bool,
    target: TargetEnv,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn target(mut self, target: TargetEnv) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &TargetEnv {
        &self.target
    }

    pub fn target_env_mut(&mut self) -> &mut TargetEnv {
        &mut self.target
    }

    pub fn into_target(self) -> TargetEnv {
        self.target
    }

    /// Parse every configured file into one map. The target is not touched.
    pub fn read(&self) -> Result<EnvMap, Error> {
        let (env, _) = self.collect()?;
        Ok(env)
    }

    /// Parse every configured file, then export the result into the target.
    ///
    /// Nothing is exported if any file fails to read or parse.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let (env, files_read) = self.collect()?;
        let mut report = LoadReport {
            files_read,
            ..LoadReport::default()
        };

        for (key, value) in &env {
            if !self.override_existing && self.target.is_set(key) {
                report.skipped_existing += 1;
                tracing::debug!(key = %key, "skipping existing key");
                continue;
            }

            self.target.set_var(key, value);
            report.loaded += 1;
        }

        tracing::debug!(
            loaded = report.loaded,
            skipped = report.skipped_existing,
            "exported dotenv session"
        );
        Ok(report)
    }

    fn collect(&self) -> Result<(EnvMap, usize), Error> {
        let mut env = EnvMap::new();
        let mut files_read = 0usize;

        for path in self.effective_paths() {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(source) => return Err(Error::Read { path, source }),
            };
            files_read += 1;

            if let Err(source) = parse_into(&bytes, &mut env) {
                return Err(Error::Parse { path, source });
            }
            tracing::debug!(
                path = %path.display(),
                bytes = bytes.len(),
                keys = env.len(),
                "parsed dotenv file"
            );
        }

        Ok((env, files_read))
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(DEFAULT_FILE)]
        } else {
            self.paths.clone()
        }
    }
}
