//! Test helpers for black-box behavioral specifications: drive the built
//! `admin`/`lrsd` binaries exactly as an operator would, over a real Unix
//! socket, against a throwaway config and DSS file per test.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output};
use std::time::{Duration, Instant};

pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 2_000;

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn lrsd_binary() -> PathBuf {
    binary_path("lrsd")
}

fn admin_binary() -> PathBuf {
    binary_path("admin")
}

/// Poll `condition` until it returns true or `timeout_ms` elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// A fluent builder for one `admin` invocation against a [`Daemon`]'s config.
pub struct CliBuilder {
    args: Vec<String>,
    config: PathBuf,
}

impl CliBuilder {
    fn new(config: PathBuf) -> Self {
        Self { args: Vec::new(), config }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(admin_binary());
        cmd.arg("--config").arg(&self.config);
        cmd.args(&self.args);
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("admin should run");
        assert!(
            output.status.success(),
            "expected admin to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("admin should run");
        assert!(
            !output.status.success(),
            "expected admin to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }
}

/// A running `lrsd` process over a private Unix socket, config, DSS file,
/// and drive directory. Killed on drop so a failing assertion never leaks
/// a daemon holding the next test's lockfile.
pub struct Daemon {
    dir: tempfile::TempDir,
    config_path: PathBuf,
    socket_path: PathBuf,
    child: Option<Child>,
}

impl Daemon {
    /// Lays out a fresh project directory with one `dir`-family drive
    /// already on disk (so `DaemonState::startup` has a device to spawn a
    /// worker for) and starts `lrsd -i` against it.
    pub fn start_with_dir_drive() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let drive_path = root.join("drives/drive0");
        std::fs::create_dir_all(&drive_path).unwrap();
        let mount_prefix = root.join("mnt");
        std::fs::create_dir_all(mount_prefix.join("drive0")).unwrap();

        let socket_path = root.join("lrs.sock");
        let dss_path = root.join("dss.json");
        let lock_file = root.join("lrs.lock");

        let config_path = root.join("lrs.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
[lrs]
lock_file = "{lock}"
mount_prefix = "{mount_prefix}/"
families = ["dir"]
dss_path = "{dss}"
listen_socket_path = "{socket}"

[io_sched.dir]
dispatch_algo = "fifo"

[drive_type.dirdrive_drive]
models = ["dirmodel"]
"#,
                lock = lock_file.display(),
                mount_prefix = mount_prefix.display(),
                dss = dss_path.display(),
                socket = socket_path.display(),
            ),
        )
        .unwrap();

        // Seed the first `dir` device directly, since `DaemonState::startup`
        // refuses to start with zero devices (`spec.md` §6 ENXIO).
        seed_dss(&dss_path, &drive_path);

        let child = Command::new(lrsd_binary())
            .arg("-i")
            .env("LRS_CONFIG", &config_path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("lrsd should spawn");

        let daemon = Self {
            dir,
            config_path,
            socket_path,
            child: Some(child),
        };
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || daemon.socket_path.exists()),
            "lrsd never created its listen socket"
        );
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || daemon.admin().args(&["ping"]).command().output().map(|o| o.status.success()).unwrap_or(false)),
            "lrsd never answered ping"
        );
        daemon
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn admin(&self) -> CliBuilder {
        CliBuilder::new(self.config_path.clone())
    }

    pub fn pid(&self) -> u32 {
        self.child.as_ref().expect("daemon not running").id()
    }

    /// Runs a second `lrsd` against this daemon's own config and lockfile.
    /// Used for the duplicate-start spec: the second process should fail
    /// fast with `EEXIST` rather than ever reaching the accept loop.
    pub fn second_instance_fails_to_start(&self) -> Output {
        Command::new(lrsd_binary())
            .arg("-i")
            .env("LRS_CONFIG", &self.config_path)
            .output()
            .expect("second lrsd should run")
    }
}

/// Lays out a project directory with zero devices seeded, then runs `lrsd`
/// synchronously. Startup checks `devices.is_empty()` before spawning any
/// async work, so the process exits on its own rather than needing a kill.
pub fn lrsd_fails_to_start_without_devices() -> Output {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let socket_path = root.join("lrs.sock");
    let dss_path = root.join("dss.json");
    let lock_file = root.join("lrs.lock");
    let mount_prefix = root.join("mnt");
    std::fs::create_dir_all(&mount_prefix).unwrap();
    std::fs::write(&dss_path, br#"{"devices":{},"media":{},"locks":[]}"#).unwrap();

    let config_path = root.join("lrs.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[lrs]
lock_file = "{lock}"
mount_prefix = "{mount_prefix}/"
families = ["dir"]
dss_path = "{dss}"
listen_socket_path = "{socket}"

[io_sched.dir]
dispatch_algo = "fifo"
"#,
            lock = lock_file.display(),
            mount_prefix = mount_prefix.display(),
            dss = dss_path.display(),
            socket = socket_path.display(),
        ),
    )
    .unwrap();

    Command::new(lrsd_binary())
        .arg("-i")
        .env("LRS_CONFIG", &config_path)
        .output()
        .expect("lrsd should run")
}

impl Drop for Daemon {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.socket_path;
    }
}

/// Writes a minimal `DssFile`-shaped JSON seed with one unlocked `dir`
/// device, matching `lrs-dss::file_dss::DssFile`'s field names exactly.
fn seed_dss(dss_path: &Path, drive_path: &Path) {
    let json = serde_json::json!({
        "devices": {
            "drive0": {
                "id": "drive0",
                "family": "dir",
                "model": "dirmodel",
                "path": drive_path.to_string_lossy(),
                "host": "testhost",
                "admin_status": "unlocked",
                "op_status": "empty",
                "loaded_medium": null,
                "mount_path": null,
                "technology": null
            }
        },
        "media": {},
        "locks": []
    });
    std::fs::write(dss_path, serde_json::to_vec_pretty(&json).unwrap()).unwrap();
}
