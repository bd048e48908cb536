use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::OnceCell;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BallotAction {
    Save,
    Publish,
}

impl BallotAction {
    fn label(&self) -> &'static str {
        match self {
            BallotAction::Save => "save",
            BallotAction::Publish => "publish",
        }
    }
}

#[derive(Default)]
pub struct Metrics {
    /// Keyed by action and outcome label ("success" or an error kind)
    ballot_total: HashMap<(BallotAction, &'static str), u64>,
    results_reads_total: u64,
    sessions_total: u64,
}

static METRICS: OnceCell<Mutex<Metrics>> = OnceCell::new();

fn get() -> &'static Mutex<Metrics> {
    METRICS.get_or_init(|| Mutex::new(Metrics::default()))
}

pub fn record_ballot_outcome(action: BallotAction, outcome: &'static str) {
    let mut m = get().lock().expect("metrics mutex poisoned");
    *m.ballot_total.entry((action, outcome)).or_insert(0) += 1;
}

pub fn record_results_read() {
    get().lock().expect("metrics mutex poisoned").results_reads_total += 1;
}

pub fn record_session_created() {
    get().lock().expect("metrics mutex poisoned").sessions_total += 1;
}

pub fn snapshot_as_json(db_path: &str) -> serde_json::Value {
    use serde_json::json;
    let m = get().lock().expect("metrics mutex poisoned");

    let mut ballots: Vec<serde_json::Value> = m
        .ballot_total
        .iter()
        .map(|((action, outcome), count)| {
            json!({
                "action": action.label(),
                "outcome": outcome,
                "count": count
            })
        })
        .collect();
    ballots.sort_by_key(|entry| entry.to_string());

    let db_bytes = std::fs::metadata(db_path)
        .ok()
        .and_then(|m| if m.is_file() { Some(m.len()) } else { None });
    let db_mb = db_bytes.map(|b| round2(bytes_to_mb(b)));
    let fs_free_mb = filesystem_free_mb_from_db_path(db_path);

    json!({
        "ballot_total": ballots,
        "results_reads_total": m.results_reads_total,
        "sessions_total": m.sessions_total,
        "storage": {
            "db_path": db_path,
            "db_size_mb": db_mb,
            "free_storage_mb": fs_free_mb,
        }
    })
}

fn bytes_to_mb(bytes: u64) -> f64 {
    let mb = 1024.0 * 1024.0;
    (bytes as f64) / mb
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn filesystem_free_mb_from_db_path(db_path: &str) -> Option<f64> {
    use sysinfo::Disks;
    let disks = Disks::new_with_refreshed_list();
    let path = std::path::Path::new(db_path);
    let mount = path.canonicalize().ok().and_then(|p| {
        disks
            .iter()
            .filter(|d| p.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
    });

    mount.map(|d| round2(bytes_to_mb(d.available_space())))
}
