//! test-support: helpers for robust, nextest-friendly genx tests.
//!
//! Add as a dev-dependency in the top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support" }
//! ```
//!
//! Then in tests:
//! ```rust,no_run
//! use test_support::{cmd_bin, tempdir, write_cmap_package};
//!
//! let td = tempdir();
//! let pkg = write_cmap_package(td.path());
//! cmd_bin("genx").arg("--package").arg(&pkg).assert().success();
//! ```

use once_cell::sync::Lazy;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,test=info"))
            .unwrap();
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Run a binary target with `assert_cmd`, returning the ready-to-run `Command`.
///
/// `RUST_LOG` is cleared so log output in assertions only depends on flags.
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    let mut cmd = assert_cmd::Command::cargo_bin(bin).expect("binary target not found");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write an executable `/bin/sh` script named `go-stub` into `dir` and return its path.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("go-stub");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod stub");
    debug!(path = %path.display(), "wrote fake toolchain");
    path
}

/// File the stubs below append their argument lists to, one call per line.
pub fn calls_log(dir: &Path) -> PathBuf {
    dir.join("calls.log")
}

/// Recorded stub invocations (empty when the stub never ran).
pub fn recorded_calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(calls_log(dir))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// A toolchain whose `list` prints `listed` and whose `get` succeeds.
#[cfg(unix)]
pub fn listing_tool(dir: &Path, listed: &Path) -> PathBuf {
    let body = format!(
        "echo \"$@\" >> '{log}'\ncase \"$1\" in\n  list) echo '{listed}' ;;\n  get) exit 0 ;;\nesac",
        log = calls_log(dir).display(),
        listed = listed.display(),
    );
    fake_tool(dir, &body)
}

/// A toolchain that reports every package as missing until `get` has run once.
#[cfg(unix)]
pub fn fetching_tool(dir: &Path, listed: &Path) -> PathBuf {
    let marker = dir.join("fetched");
    let body = format!(
        "echo \"$@\" >> '{log}'\ncase \"$1\" in\n  get) touch '{marker}' ;;\n  list)\n    if [ -f '{marker}' ]; then echo '{listed}'; \
         else echo 'cannot find package' >&2; exit 1; fi ;;\nesac",
        log = calls_log(dir).display(),
        marker = marker.display(),
        listed = listed.display(),
    );
    fake_tool(dir, &body)
}

/// A toolchain that fails every call with `message` on stderr.
#[cfg(unix)]
pub fn failing_tool(dir: &Path, message: &str) -> PathBuf {
    let body = format!("echo \"$@\" >> '{}'\necho '{}' >&2\nexit 1", calls_log(dir).display(), message);
    fake_tool(dir, &body)
}

/// Write `files` (name, content) into `dir`, creating it as needed.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(dir).expect("create fixture dir");
    for (name, content) in files {
        std::fs::write(dir.join(name), content).expect("write fixture file");
    }
}

pub const CMAP_A: &str = r#"// Package cmap is a tiny concurrent map seed.
package cmap

import "sync"

// KT is the key type.
type KT interface{}

// VT is the value type.
type VT interface{}

// CMap guards a map with a lock.
type CMap struct {
	mux sync.RWMutex
	m   map[KT]VT
}

// New returns an empty CMap.
func New() *CMap {
	return &CMap{m: map[KT]VT{}}
}
"#;

pub const CMAP_B: &str = r#"package cmap

import (
	"fmt"
	"sync"
)

var _ sync.Locker = &sync.Mutex{}

// Get returns the value stored under k.
func (c *CMap) Get(k KT) VT {
	c.mux.RLock()
	defer c.mux.RUnlock()
	return c.m[k]
}

// Dump prints the map.
func (c *CMap) Dump() {
	fmt.Println(c.m)
}
"#;

/// Lay out the `cmap` fixture package under `root/cmap` and return its directory.
///
/// Besides the two real files it carries a `_test.go` file and an
/// `//go:build ignore` file, both of which package parsing must skip.
pub fn write_cmap_package(root: &Path) -> PathBuf {
    let dir = root.join("cmap");
    write_files(
        &dir,
        &[
            ("a.go", CMAP_A),
            ("b.go", CMAP_B),
            ("b_test.go", "package cmap\n\nfunc broken( {\n"),
            ("gen.go", "//go:build ignore\n\npackage main\n\nfunc main() {}\n"),
        ],
    );
    dir
}
