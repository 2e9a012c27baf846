use std::path::PathBuf;

use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::store_err;
use crate::ipc::types::{AppState, Request};
use crate::snapshot;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let out_dir = match req.params.get("outDir").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => return err(&req.id, "bad_params", "missing outDir", None),
    };
    let doc = store.snapshot();
    match snapshot::write_snapshot(&out_dir, &doc) {
        Ok(path) => ok(
            &req.id,
            json!({
                "path": path.to_string_lossy(),
                "counts": doc.counts(),
            }),
        ),
        Err(e) => err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_dir.to_string_lossy() })),
        ),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let in_path = match req.params.get("inPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => return err(&req.id, "bad_params", "missing inPath", None),
    };
    if !in_path.is_file() {
        return err(
            &req.id,
            "not_found",
            "snapshot file not found",
            Some(json!({ "path": in_path.to_string_lossy() })),
        );
    }
    let text = match std::fs::read_to_string(&in_path) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": in_path.to_string_lossy() })),
            )
        }
    };
    // Validate the whole document before touching any state.
    let doc = match snapshot::parse(&text) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "invalid_snapshot", e.to_string(), None),
    };
    let counts = doc.counts();
    match store.import_snapshot(doc) {
        Ok(()) => ok(&req.id, json!({ "counts": counts })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
