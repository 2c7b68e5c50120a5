//! `iconshelf bridge`: line-delimited JSON between a host UI and the shelf.
//!
//! # Protocol
//!
//! One request per line on stdin, tagged by `cmd`:
//!
//! ```text
//! {"cmd":"startup"}
//! {"cmd":"import","source":"/home/me/MyIcons"}     // null source = dialog dismissed
//! {"cmd":"export","path":"<icon path>","target":"/tmp/a.svg"}
//! {"cmd":"drag","path":"<icon path>"}
//! {"cmd":"error","message":"renderer failed"}
//! ```
//!
//! One event per line on stdout, tagged by `event` with the payload in
//! `data`: `get-icon-svg`, `loading-status`, `error`, `cancelled`,
//! `exported`, `start-drag`.
//!
//! Requests are handled one at a time in arrival order. End of input (or
//! Ctrl+C) trips the cancel token, which also stops a request in flight,
//! and ends the loop.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::library::{
    self, CatalogReport, Chosen, DragSource, Failure, IconRecord, Outcome, Shelf, ShelfError,
    SkippedFile,
};
use crate::{debug, log};

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
enum Request {
    Startup,
    Import {
        #[serde(default)]
        source: Option<PathBuf>,
    },
    Export {
        path: PathBuf,
        #[serde(default)]
        target: Option<PathBuf>,
    },
    Drag {
        path: PathBuf,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum Event<'a> {
    GetIconSvg {
        icons: &'a [IconRecord],
        skipped: &'a [SkippedFile],
    },
    LoadingStatus(bool),
    Error(ErrorPayload),
    Cancelled,
    Exported {
        path: &'a Path,
    },
    StartDrag {
        file: &'a Path,
        icon: Option<&'a Path>,
    },
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    title: String,
    kind: String,
    message: String,
}

impl From<Failure> for ErrorPayload {
    fn from(failure: Failure) -> Self {
        Self {
            title: failure.title,
            kind: failure.kind.to_string(),
            message: failure.message,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Serializes events onto one writer, a line each.
struct Emitter<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> Emitter<W> {
    fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    fn emit(&self, event: &Event<'_>) -> io::Result<()> {
        let line = serde_json::to_string(event)?;
        let mut out = self.out.lock();
        writeln!(out, "{line}")?;
        out.flush()
    }

    /// Emit, logging instead of failing: a closed stdout ends the loop via EOF anyway.
    fn send(&self, event: &Event<'_>) {
        if let Err(err) = self.emit(event) {
            log!("bridge"; "failed to write event: {}", err);
        }
    }

    fn failure(&self, title: &str, err: &ShelfError) {
        log!("error"; "{}: {}", title, err);
        self.send(&Event::Error(Failure::new(title, err).into()));
    }
}

/// Drag requests become `start-drag` events for the host to act on.
struct EventDrag<'a, W: Write> {
    emitter: &'a Emitter<W>,
}

impl<W: Write> DragSource for EventDrag<'_, W> {
    fn start_drag(&self, file: &Path, icon: Option<&Path>) -> library::Result<()> {
        self.emitter
            .emit(&Event::StartDrag { file, icon })
            .map_err(|e| ShelfError::Io(file.to_path_buf(), e))
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Serve requests from stdin until end of input or cancellation.
pub async fn run_bridge(shelf: &Shelf) -> Result<()> {
    log!("bridge"; "ready, storage at {}", shelf.storage_root().display());
    let emitter = Emitter::new(io::stdout());
    serve(shelf, BufReader::new(tokio::io::stdin()), &emitter).await
}

/// Handle requests from `input` one at a time.
///
/// Input keeps being read while a request runs: lines that arrive meanwhile
/// are queued, and end of input trips the cancel token so the running
/// request winds down instead of finishing for a host that has gone.
async fn serve<R, W>(shelf: &Shelf, input: R, emitter: &Emitter<W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let cancel = shelf.cancel_token();
    let mut lines = input.lines();
    let mut queued = VecDeque::new();
    let mut open = true;

    while open && !cancel.is_cancelled() {
        let line = match queued.pop_front() {
            Some(line) => line,
            None => {
                let next = tokio::select! {
                    line = lines.next_line() => line.context("failed to read bridge input")?,
                    () = cancel.cancelled() => None,
                };
                let Some(line) = next else { break };
                line
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let handled = handle_line(shelf, emitter, &line);
        tokio::pin!(handled);
        loop {
            tokio::select! {
                biased;
                () = &mut handled => break,
                next = lines.next_line(), if open => {
                    match next.context("failed to read bridge input")? {
                        Some(line) => queued.push_back(line),
                        None => {
                            debug!("bridge"; "input closed while a request was running");
                            open = false;
                            cancel.cancel();
                        }
                    }
                }
            }
        }
    }

    // Host went away: stop anything still running.
    cancel.cancel();
    debug!("bridge"; "input closed");
    Ok(())
}

async fn handle_line<W: Write>(shelf: &Shelf, emitter: &Emitter<W>, line: &str) {
    let request = match serde_json::from_str::<Request>(line) {
        Ok(request) => request,
        Err(err) => {
            log!("bridge"; "bad request: {}", err);
            emitter.send(&Event::Error(ErrorPayload {
                title: "Invalid request".into(),
                kind: "BadRequest".into(),
                message: err.to_string(),
            }));
            return;
        }
    };
    debug!("bridge"; "{:?}", request);

    match request {
        Request::Startup => {
            emitter.send(&Event::LoadingStatus(true));
            let result = shelf.request_catalog().await;
            send_report(emitter, result, "An error occurred while loading icons");
            emitter.send(&Event::LoadingStatus(false));
        }
        Request::Import { source: None } => emitter.send(&Event::Cancelled),
        Request::Import { source } => {
            emitter.send(&Event::LoadingStatus(true));
            let result = shelf.request_import(&Chosen(source)).await;
            send_report(emitter, result, "An error occurred during import");
            emitter.send(&Event::LoadingStatus(false));
        }
        Request::Export { path, target } => export(shelf, emitter, &path, target).await,
        Request::Drag { path } => {
            if let Err(err) = shelf.request_drag_start(&path, &EventDrag { emitter }) {
                emitter.failure("An error occurred while dragging", &err);
            }
        }
        Request::Error { message } => {
            log!("error"; "{}", message);
            emitter.send(&Event::Error(ErrorPayload {
                title: "An error occurred".into(),
                kind: "Renderer".into(),
                message,
            }));
        }
    }
}

fn send_report<W: Write>(
    emitter: &Emitter<W>,
    result: library::Result<Outcome<CatalogReport>>,
    title: &str,
) {
    match result {
        Ok(Outcome::Done(report)) => emitter.send(&Event::GetIconSvg {
            icons: &report.icons,
            skipped: &report.skipped,
        }),
        Ok(Outcome::Cancelled) => emitter.send(&Event::Cancelled),
        Err(err) => emitter.failure(title, &err),
    }
}

async fn export<W: Write>(shelf: &Shelf, emitter: &Emitter<W>, path: &Path, target: Option<PathBuf>) {
    const TITLE: &str = "An error occurred during export";

    let record = match shelf.find_record(&path.to_string_lossy()).await {
        Ok(Outcome::Done(record)) => record,
        Ok(Outcome::Cancelled) => return emitter.send(&Event::Cancelled),
        Err(err) => return emitter.failure(TITLE, &err),
    };

    match shelf.request_export(&record, &Chosen(target)).await {
        Ok(Outcome::Done(written)) => emitter.send(&Event::Exported { path: &written }),
        Ok(Outcome::Cancelled) => emitter.send(&Event::Cancelled),
        Err(err) => emitter.failure(TITLE, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShelfConfig;
    use crate::core::CancelToken;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    const ICON: &str = r#"<svg width="4" height="4" class="c"><path d="M0 0"/></svg>"#;

    struct Harness {
        dir: TempDir,
        shelf: Shelf,
        emitter: Emitter<Vec<u8>>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = ShelfConfig::default();
            config.storage.root = dir.path().join("Icons");
            let shelf = Shelf::new(&config, CancelToken::new());
            Self {
                dir,
                shelf,
                emitter: Emitter::new(Vec::new()),
            }
        }

        async fn send(&self, line: &str) -> Vec<Value> {
            self.emitter.out.lock().clear();
            handle_line(&self.shelf, &self.emitter, line).await;
            self.events()
        }

        fn events(&self) -> Vec<Value> {
            let out = self.emitter.out.lock();
            String::from_utf8_lossy(&out)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }

        fn seed_icons(&self, count: usize) {
            let author = self.dir.path().join("Icons/Alice");
            fs::create_dir_all(&author).unwrap();
            for i in 0..count {
                fs::write(author.join(format!("icon{i}.svg")), ICON).unwrap();
            }
        }
    }

    fn names(events: &[Value]) -> Vec<&str> {
        events.iter().map(|e| e["event"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_parse_requests() {
        let req: Request = serde_json::from_str(r#"{"cmd":"import","source":null}"#).unwrap();
        assert_eq!(req, Request::Import { source: None });

        let req: Request = serde_json::from_str(r#"{"cmd":"export","path":"/a.svg"}"#).unwrap();
        assert_eq!(
            req,
            Request::Export {
                path: PathBuf::from("/a.svg"),
                target: None
            }
        );

        assert!(serde_json::from_str::<Request>(r#"{"cmd":"explode"}"#).is_err());
    }

    #[test]
    fn test_event_shape() {
        let line = serde_json::to_string(&Event::LoadingStatus(true)).unwrap();
        assert_eq!(line, r#"{"event":"loading-status","data":true}"#);
        let line = serde_json::to_string(&Event::Cancelled).unwrap();
        assert_eq!(line, r#"{"event":"cancelled"}"#);
    }

    #[tokio::test]
    async fn test_startup_sends_catalog() {
        let h = Harness::new();
        let icon = h.dir.path().join("Icons/Alice/logo.svg");
        fs::create_dir_all(icon.parent().unwrap()).unwrap();
        fs::write(&icon, ICON).unwrap();

        let events = h.send(r#"{"cmd":"startup"}"#).await;

        assert_eq!(names(&events), ["loading-status", "get-icon-svg", "loading-status"]);
        assert_eq!(events[0]["data"], true);
        assert_eq!(events[2]["data"], false);
        let icons = events[1]["data"]["icons"].as_array().unwrap();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0]["author"], "Alice");
        assert_eq!(icons[0]["name"], "logo.svg");
    }

    #[tokio::test]
    async fn test_import_dismissed() {
        let h = Harness::new();
        let events = h.send(r#"{"cmd":"import","source":null}"#).await;
        assert_eq!(names(&events), ["cancelled"]);
    }

    #[tokio::test]
    async fn test_import_collision_reports_error() {
        let h = Harness::new();
        let source = h.dir.path().join("MyIcons");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.svg"), ICON).unwrap();
        fs::create_dir_all(h.dir.path().join("Icons/MyIcons")).unwrap();

        let request = serde_json::json!({"cmd": "import", "source": source}).to_string();
        let events = h.send(&request).await;

        assert_eq!(names(&events), ["loading-status", "error", "loading-status"]);
        assert_eq!(events[1]["data"]["kind"], "DestinationExists");
        assert_eq!(events[1]["data"]["title"], "An error occurred during import");
    }

    #[tokio::test]
    async fn test_export_and_drag() {
        let h = Harness::new();
        let icon = h.dir.path().join("Icons/Alice/logo.svg");
        fs::create_dir_all(icon.parent().unwrap()).unwrap();
        fs::write(&icon, ICON).unwrap();
        let target = h.dir.path().join("out.svg");

        let request = serde_json::json!({"cmd": "export", "path": icon, "target": target}).to_string();
        let events = h.send(&request).await;
        assert_eq!(names(&events), ["exported"]);
        assert!(!fs::read_to_string(&target).unwrap().contains("class"));

        let request = serde_json::json!({"cmd": "drag", "path": icon}).to_string();
        let events = h.send(&request).await;
        assert_eq!(names(&events), ["start-drag"]);
        assert!(events[0]["data"]["file"].as_str().unwrap().ends_with("logo.svg"));
    }

    #[tokio::test]
    async fn test_bad_request() {
        let h = Harness::new();
        let events = h.send("not json").await;
        assert_eq!(names(&events), ["error"]);
        assert_eq!(events[0]["data"]["kind"], "BadRequest");
    }

    #[tokio::test]
    async fn test_renderer_error_is_echoed() {
        let h = Harness::new();
        let events = h.send(r#"{"cmd":"error","message":"boom"}"#).await;
        assert_eq!(events[0]["data"]["message"], "boom");
    }

    #[tokio::test]
    async fn test_end_of_input_cancels_running_scan() {
        let h = Harness::new();
        h.seed_icons(64);

        let input: &[u8] = b"{\"cmd\":\"startup\"}\n";
        serve(&h.shelf, BufReader::new(input), &h.emitter).await.unwrap();

        let events = h.events();
        assert_eq!(names(&events), ["loading-status", "cancelled", "loading-status"]);
        assert!(h.shelf.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_serve_handles_requests_in_order() {
        let h = Harness::new();
        let input: &[u8] = b"{\"cmd\":\"error\",\"message\":\"one\"}\n\n{\"cmd\":\"import\",\"source\":null}\n";

        serve(&h.shelf, BufReader::new(input), &h.emitter).await.unwrap();

        let events = h.events();
        assert_eq!(names(&events), ["error", "cancelled"]);
        assert_eq!(events[0]["data"]["message"], "one");
    }
}
