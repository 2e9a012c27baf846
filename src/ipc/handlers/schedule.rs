use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::ScheduleInput;

fn handle_schedule_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class_id = param_i64(&req.params, "classId");
    ok(
        &req.id,
        json!({ "entries": store.schedule_filtered(class_id) }),
    )
}

fn handle_schedule_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: ScheduleInput = match decode_param(&req.id, &req.params, "entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_schedule(input) {
        Ok(saved) => ok(&req.id, json!({ "entry": saved })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_schedule_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(entry_id) = param_i64(&req.params, "entryId") else {
        return err(&req.id, "bad_params", "missing entryId", None);
    };
    match store.delete_schedule(entry_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.list" => Some(handle_schedule_list(state, req)),
        "schedule.save" => Some(handle_schedule_save(state, req)),
        "schedule.delete" => Some(handle_schedule_delete(state, req)),
        _ => None,
    }
}
