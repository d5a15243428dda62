//! Idempotent instance provisioning.
//!
//! ## `install`: 4 steps
//!
//! 1. Ensure `<home_dir>/<mode>` exists (mode `0750`).
//! 2. Ensure the quickstart jar is present and matches its checksum.
//! 3. Unpack it with `java -jar <jar> -unpack` unless `crx-quickstart/` exists.
//! 4. Ensure `license.properties` is present and matches its checksum.
//!
//! Artifacts are downloaded to `<dest>.cqforge.tmp`, hashed while streaming,
//! verified, then renamed into place.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

use cqforge_core::{Artifact, InstallSpec};

use crate::error::{io_err, InstallError};
use crate::paths::{file_name_from_url, license_path, quickstart_dir, tmp_path};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    InstanceHome,
    Jar,
    Unpack,
    License,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The step changed something on disk.
    Created { step: Step, path: PathBuf },
    /// Already in place; nothing was touched.
    Unchanged { step: Step, path: PathBuf },
}

impl StepResult {
    pub fn step(&self) -> Step {
        match self {
            StepResult::Created { step, .. } | StepResult::Unchanged { step, .. } => *step,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, StepResult::Created { .. })
    }
}

/// Outcome of provisioning one instance.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub instance_home: PathBuf,
    pub steps: Vec<StepResult>,
}

// ---------------------------------------------------------------------------
// install
// ---------------------------------------------------------------------------

/// Provision the instance described by `spec`.
pub fn install(spec: &InstallSpec) -> Result<InstallReport, InstallError> {
    install_with(&ureq::AgentBuilder::new().build(), spec)
}

/// [`install`] with an explicit HTTP agent.
pub fn install_with(agent: &ureq::Agent, spec: &InstallSpec) -> Result<InstallReport, InstallError> {
    let home = spec.instance_home();
    let jar_name = file_name_from_url(&spec.jar.url).ok_or_else(|| InstallError::JarName {
        url: spec.jar.url.clone(),
    })?;
    let jar = home.join(jar_name);

    let steps = vec![
        ensure_dir(&home)?,
        ensure_artifact(agent, &spec.jar, &jar, Step::Jar)?,
        ensure_unpacked(&spec.java, &jar, &home)?,
        ensure_artifact(agent, &spec.license, &license_path(&home), Step::License)?,
    ];

    Ok(InstallReport {
        instance_home: home,
        steps,
    })
}

fn ensure_dir(home: &Path) -> Result<StepResult, InstallError> {
    if home.is_dir() {
        return Ok(StepResult::Unchanged {
            step: Step::InstanceHome,
            path: home.to_path_buf(),
        });
    }
    std::fs::create_dir_all(home).map_err(|e| io_err(home, e))?;
    set_permissions(home, 0o750)?;
    tracing::info!("created instance home: {}", home.display());
    Ok(StepResult::Created {
        step: Step::InstanceHome,
        path: home.to_path_buf(),
    })
}

/// Make sure `dest` holds `artifact`.
///
/// An existing file is kept when it matches the checksum, or when no
/// checksum is configured.
pub fn ensure_artifact(
    agent: &ureq::Agent,
    artifact: &Artifact,
    dest: &Path,
    step: Step,
) -> Result<StepResult, InstallError> {
    let expected = artifact.checksum.as_deref().map(str::to_ascii_lowercase);

    if dest.is_file() {
        let keep = match &expected {
            Some(expected) => &sha256_file(dest)? == expected,
            None => true,
        };
        if keep {
            tracing::debug!("unchanged: {}", dest.display());
            return Ok(StepResult::Unchanged {
                step,
                path: dest.to_path_buf(),
            });
        }
    }

    let tmp = tmp_path(dest);
    let actual = match download(agent, &artifact.url, &tmp) {
        Ok(digest) => digest,
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
    };

    if let Some(expected) = expected {
        if actual != expected {
            let _ = std::fs::remove_file(&tmp);
            return Err(InstallError::ChecksumMismatch {
                url: artifact.url.clone(),
                expected,
                actual,
            });
        }
    }

    if let Err(e) = std::fs::rename(&tmp, dest) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(dest, e));
    }
    set_permissions(dest, 0o644)?;

    tracing::info!("downloaded: {}", dest.display());
    Ok(StepResult::Created {
        step,
        path: dest.to_path_buf(),
    })
}

fn ensure_unpacked(java: &Path, jar: &Path, home: &Path) -> Result<StepResult, InstallError> {
    let quickstart = quickstart_dir(home);
    if quickstart.is_dir() {
        return Ok(StepResult::Unchanged {
            step: Step::Unpack,
            path: quickstart,
        });
    }

    let jar_name = jar.file_name().unwrap_or(jar.as_os_str());
    let status = Command::new(java)
        .arg("-jar")
        .arg(jar_name)
        .arg("-unpack")
        .current_dir(home)
        .status()
        .map_err(|e| io_err(java, e))?;
    if !status.success() {
        return Err(InstallError::Unpack {
            jar: jar.to_path_buf(),
            status: status.to_string(),
        });
    }

    tracing::info!("unpacked: {}", jar.display());
    Ok(StepResult::Created {
        step: Step::Unpack,
        path: quickstart,
    })
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String, InstallError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Writer that hashes everything passing through it.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Stream `url` into `dest`, returning the hex SHA-256 of what was written.
fn download(agent: &ureq::Agent, url: &str, dest: &Path) -> Result<String, InstallError> {
    let resp = match agent.get(url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(status, _)) => {
            return Err(InstallError::DownloadStatus {
                url: url.to_owned(),
                status,
            })
        }
        Err(ureq::Error::Transport(t)) => {
            return Err(InstallError::Download {
                url: url.to_owned(),
                source: Box::new(t),
            })
        }
    };

    let file = File::create(dest).map_err(|e| io_err(dest, e))?;
    let mut writer = HashingWriter {
        inner: file,
        hasher: Sha256::new(),
    };
    let mut reader: Box<dyn Read + Send + Sync> = resp.into_reader();
    io::copy(&mut reader, &mut writer).map_err(|e| io_err(dest, e))?;
    writer.flush().map_err(|e| io_err(dest, e))?;
    Ok(hex::encode(writer.hasher.finalize()))
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<(), InstallError> {
    Ok(())
}
