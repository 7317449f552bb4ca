//! Flat-file directory: one JSON document per line in `users.jsonl`.
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, error, info, warn};

use super::{DirectoryError, InMemoryDirectory, User, UserDirectory};

const USERS_FILE: &str = "users.jsonl";

/// Append-only file of users with an in-memory index
///
/// The whole file is read once at open. Writes are serialized through a
/// mutex so the uniqueness check and the append happen as one step.
#[derive(Debug)]
pub struct FlatFileDirectory {
    path: PathBuf,
    index: InMemoryDirectory,
    write_lock: Mutex<()>,
}

impl FlatFileDirectory {
    /// Open (or create) the directory rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, DirectoryError> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let path = root.join(USERS_FILE);

        let index = InMemoryDirectory::new();
        if path.exists() {
            load(&path, &index)?;
        }

        info!(path = %path.display(), users = index.len(), "user directory loaded");
        Ok(Self {
            path,
            index,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. A failed write is cut back off the file so the
    /// next append starts on a clean line.
    async fn append(&self, line: &[u8]) -> Result<(), DirectoryError> {
        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let len = file.metadata().await?.len();

        let written = async {
            file.write_all(line).await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "append failed, truncating");
            if let Err(truncate) = file.set_len(len).await {
                error!(path = %self.path.display(), error = %truncate, "could not truncate after failed append");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Read every record of `path` into `index`.
///
/// A corrupt line in the middle of the file is an error. A final line
/// without a newline is the remains of an interrupted append: it is kept if
/// it parses and cut off otherwise.
fn load(path: &Path, index: &InMemoryDirectory) -> Result<(), DirectoryError> {
    let content = fs::read_to_string(path)?;
    let mut offset = 0;

    for (lineno, chunk) in content.split_inclusive('\n').enumerate() {
        let terminated = chunk.ends_with('\n');
        let line = chunk.trim_end();
        if !line.is_empty() {
            match serde_json::from_str::<User>(line) {
                Ok(user) => {
                    index.insert(user)?;
                    if !terminated {
                        fs::OpenOptions::new().append(true).open(path)?.write_all(b"\n")?;
                    }
                }
                Err(e) if !terminated => {
                    warn!(
                        path = %path.display(),
                        line = lineno + 1,
                        error = %e,
                        "dropping torn record at end of file"
                    );
                    fs::OpenOptions::new().write(true).open(path)?.set_len(offset as u64)?;
                }
                Err(e) => {
                    return Err(DirectoryError::Storage(format!(
                        "{}:{}: {e}",
                        path.display(),
                        lineno + 1
                    )));
                }
            }
        }
        offset += chunk.len();
    }
    Ok(())
}

#[async_trait]
impl UserDirectory for FlatFileDirectory {
    async fn create(&self, user: User) -> Result<(), DirectoryError> {
        let _guard = self.write_lock.lock().await;

        if self.index.contains_email(&user.email) {
            return Err(DirectoryError::Conflict);
        }

        let mut line = serde_json::to_string(&user)?;
        line.push('\n');

        self.append(line.as_bytes()).await?;

        debug!(user_id = %user.id, "user appended");
        self.index.insert(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, DirectoryError> {
        self.index.get_by_email(email).await
    }

    async fn get_by_id(&self, id: &str) -> Result<User, DirectoryError> {
        self.index.get_by_id(id).await
    }
}
