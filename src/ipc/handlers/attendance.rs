use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, param_opt_string, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceMark;

fn handle_attendance_save_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    // classId scopes the sheet on the caller's side only; records stay keyed
    // per student so reassigning a student keeps their history.
    if param_i64(&req.params, "classId").is_none() {
        return err(&req.id, "bad_params", "missing classId", None);
    }
    let Some(date) = param_opt_string(&req.params, "date") else {
        return err(&req.id, "bad_params", "missing date", None);
    };
    let marks: Vec<AttendanceMark> = match decode_param(&req.id, &req.params, "marks") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_attendance_sheet(&date, &marks) {
        Ok((created, updated)) => ok(&req.id, json!({ "created": created, "updated": updated })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class_id = param_i64(&req.params, "classId");
    let student_id = param_i64(&req.params, "studentId");
    let date = param_opt_string(&req.params, "date");
    let records = store.attendance_filtered(class_id, student_id, date.as_deref());
    ok(&req.id, json!({ "records": records }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.saveSheet" => Some(handle_attendance_save_sheet(state, req)),
        "attendance.list" => Some(handle_attendance_list(state, req)),
        _ => None,
    }
}
