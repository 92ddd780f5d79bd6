//! Shared fixtures: XML property lists and in-memory capability fakes.
#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use alfred_services::config::Settings;
use alfred_services::infrastructure::releases::Release;
use alfred_services::infrastructure::traits::{
    ClipboardReader, CommandRunner, PasteboardInspector, RealFileSystem, ReleaseSource,
};
use alfred_services::infrastructure::AppContext;
use alfred_services::util::testing;

// ============================================================
// Property list fixtures
// ============================================================

const PLIST_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
"#;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn bool_tag(b: bool) -> &'static str {
    if b {
        "<true/>"
    } else {
        "<false/>"
    }
}

/// One application entry of the services cache.
pub struct AppFixture<'a> {
    pub path: &'a str,
    pub name: &'a str,
    pub services: &'a [(&'a str, &'a [&'a str])],
}

/// `com.apple.nsservicescache.plist` content.
pub fn services_plist(apps: &[AppFixture<'_>]) -> String {
    let mut xml = String::from(PLIST_HEADER);
    xml.push_str("<dict>\n<key>ServicesCache</key>\n<dict>\n");
    for app in apps {
        xml.push_str(&format!("<key>{}</key>\n<dict>\n", escape(app.path)));
        xml.push_str("<key>bundle_id</key><string>com.example.app</string>\n");
        xml.push_str(&format!("<key>name</key><string>{}</string>\n", escape(app.name)));
        xml.push_str("<key>service_dicts</key>\n<array>\n");
        for (name, types) in app.services {
            xml.push_str("<dict>\n<key>NSMenuItem</key>\n<dict>\n");
            xml.push_str(&format!("<key>default</key><string>{}</string>\n", escape(name)));
            xml.push_str("</dict>\n<key>NSSendTypes</key>\n<array>\n");
            for t in *types {
                xml.push_str(&format!("<string>{}</string>\n", escape(t)));
            }
            xml.push_str("</array>\n</dict>\n");
        }
        xml.push_str("</array>\n</dict>\n");
    }
    xml.push_str("</dict>\n</dict>\n</plist>\n");
    xml
}

/// `pbs.plist` content: (key, context menu, services menu, touch bar).
pub fn status_plist(entries: &[(&str, bool, bool, bool)]) -> String {
    let mut xml = String::from(PLIST_HEADER);
    xml.push_str("<dict>\n<key>NSServicesStatus</key>\n<dict>\n");
    for (key, context_menu, services_menu, touch_bar) in entries {
        xml.push_str(&format!("<key>{}</key>\n<dict>\n", escape(key)));
        xml.push_str("<key>presentation_modes</key>\n<dict>\n");
        xml.push_str(&format!("<key>ContextMenu</key>{}\n", bool_tag(*context_menu)));
        xml.push_str(&format!("<key>ServicesMenu</key>{}\n", bool_tag(*services_menu)));
        xml.push_str(&format!("<key>TouchBar</key>{}\n", bool_tag(*touch_bar)));
        xml.push_str("</dict>\n</dict>\n");
    }
    xml.push_str("</dict>\n</dict>\n</plist>\n");
    xml
}

/// Reminders accepts text, Preview accepts images.
pub fn reminders_and_preview() -> String {
    services_plist(&[
        AppFixture {
            path: "/Applications/Reminders.app",
            name: "Reminders",
            services: &[("Add to Reminders", &["public.plain-text"])],
        },
        AppFixture {
            path: "/Applications/Preview.app",
            name: "Preview",
            services: &[("Open in Preview", &["public.tiff"])],
        },
    ])
}

/// Workspace with both caches on disk and settings pointing at them.
pub struct Fixture {
    pub dir: TempDir,
    pub settings: Settings,
}

impl Fixture {
    pub fn new(services_xml: &str, status_xml: &str) -> Self {
        testing::init_test_setup();
        let dir = TempDir::new().expect("create temp dir");
        let services_cache = dir.path().join("com.apple.nsservicescache.plist");
        let status_cache = dir.path().join("pbs.plist");
        std::fs::write(&services_cache, services_xml).expect("write services cache");
        std::fs::write(&status_cache, status_xml).expect("write status cache");

        let settings = Settings {
            services_cache,
            status_cache,
            cache_dir: dir.path().join("cache"),
            version: "1.0.0".into(),
            ..Default::default()
        };
        Self { dir, settings }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

// ============================================================
// Capability fakes
// ============================================================

pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

pub fn output(code: i32, stdout: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub struct FakePasteboard {
    result: Result<Vec<String>, String>,
}

impl FakePasteboard {
    pub fn with_types(types: &[&str]) -> Self {
        Self {
            result: Ok(types.iter().map(|t| t.to_string()).collect()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

impl PasteboardInspector for FakePasteboard {
    fn types(&self) -> io::Result<Vec<String>> {
        self.result
            .clone()
            .map_err(|m| io::Error::new(io::ErrorKind::Other, m))
    }
}

#[derive(Default)]
pub struct FakeClipboard {
    text: String,
    pub reads: AtomicUsize,
}

impl FakeClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ClipboardReader for FakeClipboard {
    fn text(&self) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Records invocations; spawned pids stay alive until `kill` is called.
#[derive(Default)]
pub struct FakeCommandRunner {
    pub runs: Mutex<Vec<(String, Vec<String>)>>,
    pub spawned: Mutex<Vec<(String, Vec<String>)>>,
    alive: Mutex<HashSet<u32>>,
    stdout: Mutex<Option<Output>>,
}

impl FakeCommandRunner {
    /// Every `run`/`run_with_timeout` returns `out`.
    pub fn replying(out: Output) -> Self {
        Self {
            stdout: Mutex::new(Some(out)),
            ..Default::default()
        }
    }

    pub fn kill(&self, pid: u32) {
        self.alive.lock().unwrap().remove(&pid);
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    fn record(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        self.runs.lock().unwrap().push((
            cmd.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        Ok(self
            .stdout
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| output(0, "")))
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        self.record(cmd, args)
    }

    fn run_with_timeout(&self, cmd: &str, args: &[&str], _timeout: Duration) -> io::Result<Output> {
        self.record(cmd, args)
    }

    fn spawn_detached(&self, cmd: &str, args: &[&str]) -> io::Result<u32> {
        let mut spawned = self.spawned.lock().unwrap();
        spawned.push((
            cmd.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        let pid = 40_000 + spawned.len() as u32;
        self.alive.lock().unwrap().insert(pid);
        Ok(pid)
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }
}

#[derive(Default)]
pub struct FakeReleases {
    pub releases: Vec<Release>,
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
    pub fail: bool,
}

impl FakeReleases {
    pub fn with(releases: Vec<Release>) -> Self {
        Self {
            releases,
            ..Default::default()
        }
    }
}

impl ReleaseSource for FakeReleases {
    fn releases(&self) -> io::Result<Vec<Release>> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, "feed unreachable"));
        }
        Ok(self.releases.clone())
    }

    fn download(&self, url: &str, dest: &Path) -> io::Result<()> {
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));
        std::fs::write(dest, b"workflow archive")
    }
}

/// Context over real files in the fixture and fakes for everything else.
pub fn context(
    settings: Settings,
    pasteboard: FakePasteboard,
    clipboard: Arc<FakeClipboard>,
    cmd: Arc<FakeCommandRunner>,
    releases: FakeReleases,
) -> AppContext {
    AppContext::with_deps(
        settings,
        Arc::new(RealFileSystem),
        cmd,
        Arc::new(pasteboard),
        clipboard,
        Arc::new(releases),
    )
}
