//! Test harness for isolated test execution.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use sendseries::{
    Database, GitRepository, SeriesController, SeriesDefaults, SeriesStore, Settings,
    ViewBroadcaster, WorkspaceState,
};

/// A git repository in a temporary directory, on branch `main` with one
/// initial commit.
pub struct TestRepo {
    temp_dir: TempDir,
    pub repo: GitRepository,
}

impl TestRepo {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let repo = GitRepository::new(temp_dir.path(), "git");
        let test_repo = Self { temp_dir, repo };

        test_repo.git(&["init", "-q", "--initial-branch=main"]);
        test_repo.commit("README", "initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Runs git in the repository and returns its trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .current_dir(self.path())
            .args(args)
            .env("GIT_AUTHOR_NAME", "Ada Lovelace")
            .env("GIT_AUTHOR_EMAIL", "ada@example.org")
            .env("GIT_COMMITTER_NAME", "Ada Lovelace")
            .env("GIT_COMMITTER_EMAIL", "ada@example.org")
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Writes `file` and commits it with `message`.
    pub fn commit(&self, file: &str, message: &str) {
        self.write_file(file, message);
        self.git(&["add", file]);
        self.git(&["commit", "-q", "-m", message]);
    }

    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Writes an executable shell script.
    #[cfg(unix)]
    pub fn write_script(&self, relative: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write_file(relative, &format!("#!/bin/sh\n{}\n", body));
        let mut permissions = std::fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).unwrap();
        path
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }
}

/// A controller over a fresh in-memory database, not yet attached.
pub fn controller(settings: Settings) -> SeriesController<WorkspaceState> {
    controller_with_db(Database::open_in_memory().unwrap(), settings)
}

/// A controller over `db`, scoped to a fixed workspace name.
pub fn controller_with_db(db: Database, settings: Settings) -> SeriesController<WorkspaceState> {
    let store = SeriesStore::new(
        WorkspaceState::new(db, "/workspace"),
        SeriesDefaults::from(&settings),
    );
    SeriesController::new(store, settings, ViewBroadcaster::default())
}

/// A controller attached to `repo`.
pub fn attached(repo: &TestRepo, settings: Settings) -> SeriesController<WorkspaceState> {
    let mut controller = controller(settings);
    controller.attach(repo.repo.clone()).unwrap();
    controller
}

/// Shell lines printing one `git send-email` delivery report.
pub fn send_report(subject: &str, message_id: &str) -> String {
    format!(
        "printf 'OK. Log says:\\nServer: smtp.example.org\\nMAIL FROM:<ada@example.org>\\nFrom: Ada <ada@example.org>\\nSubject: {}\\nDate: Mon, 1 Jan 2024 10:00:00 +0000\\nMessage-ID: <{}>\\nX-Mailer: git-send-email 2.43.0\\n\\nResult: 250\\n\\n'",
        subject, message_id
    )
}

/// A git wrapper answering `send-email` with `report` and forwarding
/// everything else to git.
#[cfg(unix)]
pub fn fake_git(repo: &TestRepo, report: &str) -> PathBuf {
    repo.write_script(
        "tools/fake-git",
        &format!(
            "if [ \"$1\" = send-email ]; then\n{}\nexit 0\nfi\nexec git \"$@\"",
            report
        ),
    )
}
