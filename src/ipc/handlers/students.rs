use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::{StudentInput, StudentStatus};

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class_id = param_i64(&req.params, "classId");
    let status = match req.params.get("status") {
        None => None,
        Some(raw) if raw.is_null() => None,
        Some(raw) => match serde_json::from_value::<StudentStatus>(raw.clone()) {
            Ok(s) => Some(s),
            Err(e) => return err(&req.id, "bad_params", format!("invalid status: {}", e), None),
        },
    };
    ok(
        &req.id,
        json!({ "students": store.students_filtered(class_id, status) }),
    )
}

fn handle_students_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: StudentInput = match decode_param(&req.id, &req.params, "student") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_student(input) {
        Ok(saved) => ok(&req.id, json!({ "student": saved })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_i64(&req.params, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    match store.delete_student(student_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.save" => Some(handle_students_save(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
