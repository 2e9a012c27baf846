use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::AgendaEntry;

fn handle_save_entry(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_i64(&req.params, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let entry: AgendaEntry = match decode_param(&req.id, &req.params, "entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_agenda_entry(student_id, entry) {
        Ok(saved) => ok(&req.id, json!({ "entry": saved })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "agenda.saveEntry" => Some(handle_save_entry(state, req)),
        _ => None,
    }
}
