//! Configuration system.
//!
//! Configuration is assembled from tiers with field-by-field YAML merging:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/love-quests/config.yaml`
//! 3. **User** - `~/.love-quests/config.yaml`
//! 4. **Explicit** - the file named by `LOVE_QUESTS_CONFIG_PATH` (or `--config`)
//! 5. **Environment** - individual overrides, see below
//!
//! ## Environment Variables
//! - `LOVE_QUESTS_CONFIG_PATH` - Explicit config file
//! - `LOVE_QUESTS_DB_PATH` - Database path used by `serve` and embedded mode
//! - `LOVE_QUESTS_HOST` / `LOVE_QUESTS_PORT` - API bind address
//! - `LOVE_QUESTS_REMOTE_URL` - Base URL of the progress API
//! - `LOVE_QUESTS_CACHE_DIR` - Local cache directory
//! - `LOVE_QUESTS_ADMIN_PASSWORD` - Shared admin password
//! - `GEMINI_API_KEY` (or `API_KEY`) - Story generation key
//! - `LOVE_QUESTS_YOUR_NAME` - Second name used in generated stories
//! - `LOVE_QUESTS_USER_DIR` / `LOVE_QUESTS_PROJECT_DIR` - Tier directories

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
