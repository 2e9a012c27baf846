use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::ClassInput;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    // The active-student count feeds the caller's delete policy; the store
    // itself never refuses a class deletion.
    let classes: Vec<_> = store
        .class_rows()
        .into_iter()
        .map(|(class, active)| {
            json!({
                "id": class.id,
                "name": class.name,
                "teacherId": class.teacher_id,
                "activeStudentCount": active,
            })
        })
        .collect();
    ok(&req.id, json!({ "classes": classes }))
}

fn handle_classes_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: ClassInput = match decode_param(&req.id, &req.params, "class") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_class(input) {
        Ok(saved) => ok(&req.id, json!({ "class": saved })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = param_i64(&req.params, "classId") else {
        return err(&req.id, "bad_params", "missing classId", None);
    };
    match store.delete_class(class_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.save" => Some(handle_classes_save(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
