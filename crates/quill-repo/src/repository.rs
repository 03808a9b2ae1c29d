use std::fs;
use std::path::{Path, PathBuf};

use quill_store::{write_object, LooseObjectStore, Object, ObjectStore, StoreError};
use quill_types::{ObjectId, ObjectKind};
use tracing::{debug, info};

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};

/// Name of the repository directory inside a worktree.
pub const GIT_DIR: &str = ".git";

const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";
const HEAD: &str = "ref: refs/heads/master\n";

/// A repository on disk: a worktree and its `.git` directory.
#[derive(Debug)]
pub struct Repository {
    worktree: PathBuf,
    gitdir: PathBuf,
    config: RepoConfig,
}

impl Repository {
    /// Create a new repository at `path`.
    ///
    /// The worktree is created if missing. An existing `.git` must be an
    /// empty directory.
    pub fn init(path: impl AsRef<Path>) -> RepoResult<Self> {
        let worktree = path.as_ref().to_path_buf();
        let gitdir = worktree.join(GIT_DIR);

        if worktree.exists() {
            if !worktree.is_dir() {
                return Err(RepoError::NotADirectory(worktree));
            }
            if gitdir.exists() {
                if !gitdir.is_dir() {
                    return Err(RepoError::NotADirectory(gitdir));
                }
                if fs::read_dir(&gitdir)?.next().is_some() {
                    return Err(RepoError::NotEmpty(gitdir));
                }
            }
        } else {
            fs::create_dir_all(&worktree)?;
        }

        let repo = Self {
            worktree,
            gitdir,
            config: RepoConfig::default(),
        };

        for parts in [&["branches"][..], &["objects"], &["refs", "tags"], &["refs", "heads"]] {
            repo.repo_dir(parts, true)?;
        }
        fs::write(repo.repo_file(&["description"], true)?, DESCRIPTION)?;
        fs::write(repo.repo_file(&["HEAD"], true)?, HEAD)?;
        repo.config.save(&repo.repo_file(&["config"], true)?)?;

        info!(path = %repo.gitdir.display(), "initialized empty repository");
        Ok(repo)
    }

    /// Open the repository whose worktree is `path`.
    ///
    /// With `force`, a missing `.git` or config is tolerated and the format
    /// version is not checked.
    pub fn open(path: impl AsRef<Path>, force: bool) -> RepoResult<Self> {
        let worktree = path.as_ref().to_path_buf();
        let gitdir = worktree.join(GIT_DIR);

        if !force && !gitdir.is_dir() {
            return Err(RepoError::NotARepository(worktree));
        }

        let config_path = gitdir.join("config");
        let config = if config_path.is_file() {
            RepoConfig::load(&config_path)?
        } else if force {
            RepoConfig::default()
        } else {
            return Err(RepoError::MissingConfig(config_path));
        };

        if !force && config.core.repositoryformatversion != 0 {
            return Err(RepoError::UnsupportedFormatVersion(
                config.core.repositoryformatversion,
            ));
        }

        debug!(path = %gitdir.display(), "opened repository");
        Ok(Self {
            worktree,
            gitdir,
            config,
        })
    }

    /// Find the repository containing `path`, walking up to the filesystem
    /// root.
    pub fn find(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::find_optional(&path)?
            .ok_or_else(|| RepoError::NotARepository(path.as_ref().to_path_buf()))
    }

    /// Like [`Repository::find`], but a missing repository is `Ok(None)`.
    pub fn find_optional(path: impl AsRef<Path>) -> RepoResult<Option<Self>> {
        let start = fs::canonicalize(path.as_ref())?;
        let mut current = start.as_path();
        loop {
            if current.join(GIT_DIR).is_dir() {
                return Self::open(current, false).map(Some);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    // ---- Layout ----

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Join `parts` under the repository directory.
    pub fn repo_path(&self, parts: &[&str]) -> PathBuf {
        parts.iter().fold(self.gitdir.clone(), |path, part| path.join(part))
    }

    /// Path of a directory under the repository directory.
    ///
    /// Returns `Ok(None)` when the directory is absent and `mkdir` is false.
    /// A file in the way is [`RepoError::NotADirectory`].
    pub fn repo_dir(&self, parts: &[&str], mkdir: bool) -> RepoResult<Option<PathBuf>> {
        let path = self.repo_path(parts);
        if path.exists() {
            if path.is_dir() {
                return Ok(Some(path));
            }
            return Err(RepoError::NotADirectory(path));
        }
        if mkdir {
            fs::create_dir_all(&path)?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Path of a file under the repository directory, creating its parent
    /// directories when `mkdir` is set.
    pub fn repo_file(&self, parts: &[&str], mkdir: bool) -> RepoResult<PathBuf> {
        if let Some((_, parents)) = parts.split_last() {
            self.repo_dir(parents, mkdir)?;
        }
        Ok(self.repo_path(parts))
    }

    // ---- Objects ----

    /// The loose object database of this repository.
    pub fn objects(&self) -> LooseObjectStore {
        LooseObjectStore::new(&self.gitdir)
    }

    /// Build an object of `kind` from `data` and return its id, storing it
    /// only when `write` is set.
    pub fn hash_object(&self, data: &[u8], kind: ObjectKind, write: bool) -> RepoResult<ObjectId> {
        let object = Object::from_payload(kind, data)?;
        let store = self.objects();
        let target: Option<&dyn ObjectStore> = if write { Some(&store) } else { None };
        Ok(write_object(&object, target)?)
    }

    /// Read an object, treating absence as an error.
    pub fn read_object(&self, id: &ObjectId) -> RepoResult<Object> {
        self.objects()
            .read(id)?
            .ok_or(RepoError::ObjectNotFound(*id))
    }

    /// Payload bytes of the object named `name`, which must be of `kind`.
    pub fn cat_file(&self, name: &str, kind: ObjectKind) -> RepoResult<Vec<u8>> {
        let id = self.resolve(name)?;
        let object = self.read_object(&id)?;
        if object.kind() != kind {
            return Err(StoreError::KindMismatch {
                id,
                expected: kind,
                found: object.kind(),
            }
            .into());
        }
        Ok(object.serialize().into_owned())
    }

    /// Resolve a name to an object id. Only full hex ids are understood.
    pub fn resolve(&self, name: &str) -> RepoResult<ObjectId> {
        name.parse::<ObjectId>()
            .map_err(|_| RepoError::InvalidObjectId(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_store::{Blob, Commit};

    fn init_temp() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    #[test]
    fn init_creates_layout() {
        let (dir, repo) = init_temp();
        let git = dir.path().join(GIT_DIR);
        assert_eq!(repo.gitdir(), git);
        for sub in ["branches", "objects", "refs/tags", "refs/heads"] {
            assert!(git.join(sub).is_dir(), "missing {sub}");
        }
        assert_eq!(fs::read_to_string(git.join("HEAD")).unwrap(), HEAD);
        assert!(fs::read_to_string(git.join("description"))
            .unwrap()
            .starts_with("Unnamed repository"));
        let config = RepoConfig::load(&git.join("config")).unwrap();
        assert_eq!(config, RepoConfig::default());
    }

    #[test]
    fn init_creates_missing_worktree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b");
        Repository::init(&path).unwrap();
        assert!(path.join(GIT_DIR).join("objects").is_dir());
    }

    #[test]
    fn init_accepts_empty_gitdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(GIT_DIR)).unwrap();
        Repository::init(dir.path()).unwrap();
    }

    #[test]
    fn init_rejects_populated_gitdir() {
        let (dir, _repo) = init_temp();
        let err = Repository::init(dir.path()).unwrap_err();
        assert!(matches!(err, RepoError::NotEmpty(_)));
    }

    #[test]
    fn init_rejects_file_as_worktree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        let err = Repository::init(&file).unwrap_err();
        assert!(matches!(err, RepoError::NotADirectory(_)));
    }

    // -----------------------------------------------------------------------
    // open / find
    // -----------------------------------------------------------------------

    #[test]
    fn open_existing() {
        let (dir, _repo) = init_temp();
        let repo = Repository::open(dir.path(), false).unwrap();
        assert_eq!(repo.worktree(), dir.path());
        assert_eq!(repo.config().core.repositoryformatversion, 0);
    }

    #[test]
    fn open_plain_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::open(dir.path(), false).unwrap_err();
        assert!(matches!(err, RepoError::NotARepository(_)));
        assert!(Repository::open(dir.path(), true).is_ok());
    }

    #[test]
    fn open_without_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(GIT_DIR)).unwrap();
        let err = Repository::open(dir.path(), false).unwrap_err();
        assert!(matches!(err, RepoError::MissingConfig(_)));
    }

    #[test]
    fn open_rejects_unknown_format_version() {
        let (dir, _repo) = init_temp();
        let config = dir.path().join(GIT_DIR).join("config");
        fs::write(&config, "[core]\nrepositoryformatversion = 1\n").unwrap();
        let err = Repository::open(dir.path(), false).unwrap_err();
        assert!(matches!(err, RepoError::UnsupportedFormatVersion(1)));
    }

    #[test]
    fn find_walks_up_from_subdirectory() {
        let (dir, _repo) = init_temp();
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        let found = Repository::find(&nested).unwrap();
        assert_eq!(found.worktree(), fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn find_optional_outside_repository_is_none() {
        let dir = tempfile::tempdir().unwrap();
        // A repository above the temp dir would make this test meaningless.
        if Repository::find_optional(dir.path()).unwrap().is_none() {
            let err = Repository::find(dir.path()).unwrap_err();
            assert!(matches!(err, RepoError::NotARepository(_)));
        }
    }

    // -----------------------------------------------------------------------
    // Path helpers
    // -----------------------------------------------------------------------

    #[test]
    fn repo_path_joins_under_gitdir() {
        let (dir, repo) = init_temp();
        assert_eq!(
            repo.repo_path(&["refs", "heads", "master"]),
            dir.path().join(".git/refs/heads/master")
        );
    }

    #[test]
    fn repo_dir_without_mkdir_is_none_when_absent() {
        let (_dir, repo) = init_temp();
        assert!(repo.repo_dir(&["refs", "remotes"], false).unwrap().is_none());
        let made = repo.repo_dir(&["refs", "remotes"], true).unwrap().unwrap();
        assert!(made.is_dir());
    }

    #[test]
    fn repo_dir_on_file_fails() {
        let (_dir, repo) = init_temp();
        let err = repo.repo_dir(&["HEAD"], false).unwrap_err();
        assert!(matches!(err, RepoError::NotADirectory(_)));
    }

    #[test]
    fn repo_file_creates_parents() {
        let (dir, repo) = init_temp();
        let path = repo.repo_file(&["refs", "remotes", "origin", "master"], true).unwrap();
        assert_eq!(path, dir.path().join(".git/refs/remotes/origin/master"));
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    #[test]
    fn hash_object_without_write_stores_nothing() {
        let (_dir, repo) = init_temp();
        let id = repo.hash_object(b"test", ObjectKind::Blob, false).unwrap();
        assert_eq!(id.to_hex(), "30d74d258442c7c65512eafab474568dd706c430");
        assert!(!repo.objects().exists(&id).unwrap());
    }

    #[test]
    fn hash_object_with_write_then_cat_file() {
        let (dir, repo) = init_temp();
        let id = repo.hash_object(b"test", ObjectKind::Blob, true).unwrap();
        assert!(dir
            .path()
            .join(".git/objects/30/d74d258442c7c65512eafab474568dd706c430")
            .is_file());
        let payload = repo.cat_file(&id.to_hex(), ObjectKind::Blob).unwrap();
        assert_eq!(payload, b"test");
    }

    #[test]
    fn hash_object_commit_parses_payload() {
        let (_dir, repo) = init_temp();
        let tree = repo.hash_object(b"", ObjectKind::Blob, true).unwrap();
        let commit = Commit::from_parts(tree, &[], "a <a@x> 0 +0000", "a <a@x> 0 +0000", "msg\n");
        let payload = Object::from(commit.clone()).serialize().into_owned();
        let id = repo.hash_object(&payload, ObjectKind::Commit, true).unwrap();
        let read = repo.read_object(&id).unwrap();
        assert_eq!(read.as_commit(), Some(&commit));
    }

    #[test]
    fn commit_with_interleaved_keys_keeps_its_bytes() {
        let (_dir, repo) = init_temp();
        let data = b"parent a\nauthor me\nparent b\n\nmsg";
        let id = repo.hash_object(data, ObjectKind::Commit, true).unwrap();
        assert_eq!(id.to_hex(), "9e46b867756cca8d615ac19f9a6cf4714d3beb19");
        assert_eq!(repo.cat_file(&id.to_hex(), ObjectKind::Commit).unwrap(), data);
        assert_eq!(
            repo.hash_object(data, ObjectKind::Commit, false).unwrap(),
            id
        );
    }

    #[test]
    fn hash_object_rejects_unsupported_kind() {
        let (_dir, repo) = init_temp();
        let err = repo.hash_object(b"x", ObjectKind::Tree, false).unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Unsupported(ObjectKind::Tree))));
    }

    #[test]
    fn cat_file_kind_mismatch() {
        let (_dir, repo) = init_temp();
        let id = repo.objects().write(&Object::from(Blob::new("x"))).unwrap();
        let err = repo.cat_file(&id.to_hex(), ObjectKind::Commit).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Store(StoreError::KindMismatch {
                expected: ObjectKind::Commit,
                found: ObjectKind::Blob,
                ..
            })
        ));
    }

    #[test]
    fn cat_file_missing_object() {
        let (_dir, repo) = init_temp();
        let err = repo
            .cat_file("0123456789abcdef0123456789abcdef01234567", ObjectKind::Blob)
            .unwrap_err();
        assert!(matches!(err, RepoError::ObjectNotFound(_)));
    }

    #[test]
    fn resolve_rejects_non_hex_names() {
        let (_dir, repo) = init_temp();
        for name in ["HEAD", "master", "30d74d2", ""] {
            let err = repo.resolve(name).unwrap_err();
            assert!(matches!(err, RepoError::InvalidObjectId(_)));
        }
    }
}
