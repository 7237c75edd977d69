//! Shared embedded PostgreSQL cluster and per-test databases.
//!
//! Each test binary boots one cluster under `target/pg-embed`. Every test then
//! clones a fresh database from a template that already carries the Diesel
//! migrations, so suites never see each other's rows.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::format_postgres_error;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const TEMPLATE_NAME_PREFIX: &str = "forum_template";
const PROVISION_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static CLUSTER_DIRS: OnceLock<(PathBuf, PathBuf)> = OnceLock::new();
static POSTMASTER_PID: AtomicI32 = AtomicI32::new(0);

fn pg_embed_root() -> PathBuf {
    std::env::var_os("CARGO_TARGET_DIR").map_or_else(
        || {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("..")
                .join("target")
                .join("pg-embed")
        },
        |target| PathBuf::from(target).join("pg-embed"),
    )
}

/// Install directory shared across binaries, data directory per process.
fn cluster_dirs() -> Result<&'static (PathBuf, PathBuf), String> {
    if let Some(dirs) = CLUSTER_DIRS.get() {
        return Ok(dirs);
    }
    let root = pg_embed_root();
    let runtime_dir = root.join("install");
    let data_dir = root.join(format!("data-{}-{}", std::process::id(), Uuid::new_v4()));
    std::fs::create_dir_all(&runtime_dir).map_err(|err| err.to_string())?;
    std::fs::create_dir_all(&data_dir).map_err(|err| err.to_string())?;
    Ok(CLUSTER_DIRS.get_or_init(|| (runtime_dir, data_dir)))
}

/// Boot, or reuse, the cluster shared by every test in this binary.
///
/// `PG_RUNTIME_DIR` and `PG_DATA_DIR` are honoured when both are set;
/// otherwise they point under the target directory for the bootstrap call.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let needs_override =
        std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none();
    let _env_guard = if needs_override {
        let (runtime_dir, data_dir) = cluster_dirs()?;
        Some(env_lock::lock_env([
            ("PG_RUNTIME_DIR", Some(runtime_dir.to_string_lossy().into_owned())),
            ("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())),
        ]))
    } else {
        None
    };

    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => {
                register_exit_shutdown(handle);
                return Ok(handle);
            }
            Err(error) if attempt < PROVISION_RETRIES => {
                eprintln!("pg-embed: cluster attempt {attempt}/{PROVISION_RETRIES} failed: {error:?}");
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("shared cluster: {error:?}")),
        }
    }
}

fn template_database_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Create the migrated template once per cluster and return its name.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        migrate_schema(&url)?;
    }
    Ok(template_name)
}

/// Clone a fresh database from the migrated template.
///
/// Retried because concurrent clones of one template can briefly collide.
pub fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("create database from template: no attempts made");
    for attempt in 1..=PROVISION_RETRIES {
        let outcome = ensure_template_database(cluster).and_then(|template| {
            let db_name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(db_name.as_str(), template.as_str())
                .map_err(|err| format!("create database from template: {err:?}"))
        });
        match outcome {
            Ok(database) => return Ok(database),
            Err(error) => last_error = format!("attempt {attempt}/{PROVISION_RETRIES}: {error}"),
        }
        if attempt < PROVISION_RETRIES {
            std::thread::sleep(RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// Run every pending Diesel migration against `url`.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err}"))?;
    Ok(())
}

/// Open a plain `postgres` client for seeding and inspection.
pub fn connect(url: &str) -> Result<Client, String> {
    Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))
}

/// Drop `users` and everything that references it.
pub fn drop_users_table(url: &str) -> Result<(), String> {
    let mut client = connect(url)?;
    client
        .batch_execute("DROP TABLE IF EXISTS users CASCADE;")
        .map_err(|err| format_postgres_error(&err))
}

fn read_postmaster_pid(data_dir: &Path) -> Option<i32> {
    let dir = cap_std::fs::Dir::open_ambient_dir(data_dir, cap_std::ambient_authority()).ok()?;
    let content = dir.read_to_string("postmaster.pid").ok()?;
    content.lines().next()?.trim().parse().ok()
}

/// Stop the leaked shared cluster when the test binary exits.
#[cfg(unix)]
fn register_exit_shutdown(handle: &ClusterHandle) {
    let Some(pid) = read_postmaster_pid(&handle.settings().data_dir) else {
        return;
    };
    if POSTMASTER_PID
        .compare_exchange(0, pid, Ordering::Relaxed, Ordering::Relaxed)
        .is_err()
    {
        return;
    }
    // SAFETY: `stop_postmaster` is a plain `extern "C"` function that only
    // reads an atomic and sends signals.
    let rc = unsafe { libc::atexit(stop_postmaster) };
    if rc != 0 {
        eprintln!("pg-embed: atexit registration failed (rc={rc}); PID {pid} may outlive the tests");
    }
}

#[cfg(not(unix))]
fn register_exit_shutdown(_handle: &ClusterHandle) {}

#[cfg(unix)]
extern "C" fn stop_postmaster() {
    let pid = POSTMASTER_PID.load(Ordering::Relaxed);
    if pid <= 0 {
        return;
    }
    // SAFETY: `pid` was read from this process's own cluster data directory.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        return;
    }
    for _ in 0..50 {
        std::thread::sleep(Duration::from_millis(100));
        // SAFETY: signal 0 only checks that the process still exists.
        if unsafe { libc::kill(pid, 0) } != 0 {
            return;
        }
    }
    // SAFETY: as above; graceful shutdown did not finish in time.
    unsafe {
        libc::kill(pid, libc::SIGKILL);
    }
}

#[cfg(test)]
mod tests {
    //! Data directory helpers.
    use super::*;

    #[test]
    fn postmaster_pid_is_the_first_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("postmaster.pid"), "4242\n/data\n5432\n").expect("write");
        assert_eq!(read_postmaster_pid(dir.path()), Some(4242));
    }

    #[test]
    fn missing_or_garbled_pid_files_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(read_postmaster_pid(dir.path()), None);
        std::fs::write(dir.path().join("postmaster.pid"), "not-a-pid\n").expect("write");
        assert_eq!(read_postmaster_pid(dir.path()), None);
    }
}
