//! Structured logging for the dashboard client.
//!
//! Records are single-line JSON objects written to stderr so that stdout stays
//! reserved for rendered views. When `LOG_DIR` is set, records are also kept
//! under `LOG_DIR/<run_id>/` for later inspection.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Warn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Fetch,   // Backend requests and responses
    Shape,   // Payload normalization
    Rank,    // Feature ordering
    Upload,  // Dataset upload
    Predict, // Prediction requests
    Model,   // Model listing, switching, reports
    Dataset, // Dataset listing, switching, summaries
    System,  // Startup, configuration
    Profile, // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Fetch => "fetch",
            Domain::Shape => "shape",
            Domain::Rank => "rank",
            Domain::Upload => "upload",
            Domain::Predict => "predict",
            Domain::Model => "model",
            Domain::Dataset => "dataset",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let Ok(base) = std::env::var("LOG_DIR") else {
            return RunContext { run_id, events: None, trace: None };
        };
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
            return RunContext { run_id, events: None, trace: None };
        }
        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["authorization", "Authorization", "cookie", "Cookie", "api_key"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["endpoint", "slot", "ticket", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(writer) = writer {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn build_record(
    run_id: &str,
    level: Level,
    component: &str,
    event: &str,
    fields: Map<String, Value>,
) -> Value {
    let fields = sanitize_fields(fields);
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, level, component, event, fields).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    eprintln!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_fetch(method: &str, endpoint: &str, status: u16, elapsed_ms: f64) {
    log(
        Level::Debug,
        Domain::Fetch,
        "response",
        obj(&[
            ("method", v_str(method)),
            ("endpoint", v_str(endpoint)),
            ("status", json!(status)),
            ("elapsed_ms", v_num(elapsed_ms)),
        ]),
    );
}

pub fn log_fetch_error(endpoint: &str, kind: &str, message: &str) {
    log(
        Level::Warn,
        Domain::Fetch,
        "request_failed",
        obj(&[
            ("endpoint", v_str(endpoint)),
            ("kind", v_str(kind)),
            ("msg", v_str(message)),
        ]),
    );
}

pub fn log_layout(
    layout: &str,
    matrix_key: Option<&str>,
    vector_key: Option<&str>,
    features: usize,
) {
    log(
        Level::Debug,
        Domain::Shape,
        "layout",
        obj(&[
            ("layout", v_str(layout)),
            ("matrix_key", matrix_key.map(v_str).unwrap_or(Value::Null)),
            ("vector_key", vector_key.map(v_str).unwrap_or(Value::Null)),
            ("features", json!(features)),
        ]),
    );
}

pub fn log_ambiguous_keys(role: &str, chosen: &str, candidates: &[String]) {
    log(
        Level::Warn,
        Domain::Shape,
        "ambiguous_payload",
        obj(&[
            ("role", v_str(role)),
            ("chosen", v_str(chosen)),
            ("candidates", json!(candidates)),
        ]),
    );
}

pub fn log_shape_error(reason: &str, top_level_keys: usize) {
    log(
        Level::Warn,
        Domain::Shape,
        "unrecognized_payload",
        obj(&[("msg", v_str(reason)), ("top_level_keys", json!(top_level_keys))]),
    );
}

pub fn log_ranking(kind: &str, ranked: &[String]) {
    log(
        Level::Trace,
        Domain::Rank,
        kind,
        obj(&[("order", json!(ranked))]),
    );
}

pub fn log_stale_response(slot: &str, ticket: u64, latest: u64) {
    log(
        Level::Info,
        Domain::Fetch,
        "stale_response_dropped",
        obj(&[
            ("slot", v_str(slot)),
            ("ticket", json!(ticket)),
            ("latest", json!(latest)),
        ]),
    );
}

pub fn log_upload(file_name: &str, bytes: u64, sha256: &str) {
    log(
        Level::Info,
        Domain::Upload,
        "upload",
        obj(&[
            ("file", v_str(file_name)),
            ("bytes", json!(bytes)),
            ("sha256", v_str(sha256)),
        ]),
    );
}

pub fn log_validation(domain: Domain, what: &str, reason: &str) {
    log(
        Level::Warn,
        domain,
        "validation_failed",
        obj(&[("field", v_str(what)), ("msg", v_str(reason))]),
    );
}

pub fn log_prediction(prediction: &str, top_probability: f64) {
    log(
        Level::Info,
        Domain::Predict,
        "prediction",
        obj(&[
            ("prediction", v_str(prediction)),
            ("top_probability", v_num(top_probability)),
        ]),
    );
}

pub fn log_switch(domain: Domain, target: &str) {
    log(
        Level::Info,
        domain,
        "switched",
        obj(&[("target", v_str(target))]),
    );
}

// =============================================================================
// Field helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            context: None,
            started: Instant::now(),
        }
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: Some(obj(fields)),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(self.elapsed_ms()));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }

    #[test]
    fn test_sensitive_fields_redacted() {
        let m = sanitize_fields(obj(&[("Authorization", v_str("Bearer x")), ("a", v_num(1.0))]));
        assert_eq!(m.get("Authorization").unwrap(), "[REDACTED]");
        assert_eq!(m.get("a").unwrap(), 1.0);
    }

    #[test]
    fn test_record_lifts_routing_fields() {
        let record = build_record(
            "r-test",
            Level::Warn,
            "fetch",
            "request_failed",
            obj(&[
                ("endpoint", v_str("/api/models")),
                ("msg", v_str("boom")),
                ("kind", v_str("transport")),
            ]),
        );
        assert_eq!(record["endpoint"], "/api/models");
        assert_eq!(record["msg"], "boom");
        assert_eq!(record["lvl"], "WARN");
        assert_eq!(record["data"]["kind"], "transport");
        assert!(record["data"].get("endpoint").is_none());
    }
}
