use serde_json::json;

use crate::areas::{AREAS, LEVELS};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

/// The development-area catalog is compiled in, so listing it needs no
/// workspace.
fn handle_areas_list(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let areas: Vec<serde_json::Value> = AREAS
        .iter()
        .map(|area| {
            let skills: Vec<serde_json::Value> = area
                .skills
                .iter()
                .map(|(key, label)| json!({ "key": key, "label": label }))
                .collect();
            json!({ "key": area.key, "title": area.title, "skills": skills })
        })
        .collect();
    ok(&req.id, json!({ "areas": areas, "levels": LEVELS }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "areas.list" => Some(handle_areas_list(state, req)),
        _ => None,
    }
}
