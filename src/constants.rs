pub(crate) const GIT_DIR_NAME: &str = ".git";
pub(crate) const GITDIR_PREFIX: &str = "gitdir:";
pub(crate) const COMMONDIR_FILE: &str = "commondir";
pub(crate) const HEAD_FILE: &str = "HEAD";
pub(crate) const CONFIG_FILE: &str = "config";
pub(crate) const WORKTREES_SUBDIR: &str = "worktrees";
pub(crate) const BRANCH_REF_PREFIX: &str = "ref: refs/heads/";
pub(crate) const DETACHED_BRANCH: &str = "HEAD";
pub(crate) const UNKNOWN_BRANCH: &str = "unknown";
pub(crate) const COMMIT_HASH_LEN: usize = 40;
pub(crate) const SHORT_HASH_LEN: usize = 8;
pub(crate) const DEFAULT_REMOTE: &str = "origin";

pub(crate) const DEFAULT_BASE_DIR: &str = "~/worktrees";
pub(crate) const DEFAULT_INDEX_WORKTREES_DIR: &str = ".worktrees";

pub(crate) const MAX_DEFAULT_WORKERS: usize = 4;
pub(crate) const WORKERS_ENV: &str = "WTSCOUT_DISCOVERY_WORKERS";
pub(crate) const PIPELINE_QUEUE_FACTOR: usize = 2;

pub(crate) const INDEX_BIN: &str = "ghq";
pub(crate) const GIT_BIN: &str = "git";
