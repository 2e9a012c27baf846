use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::UserInput;

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let users: Vec<_> = store.users().iter().map(|u| u.profile()).collect();
    ok(&req.id, json!({ "users": users }))
}

fn handle_users_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: UserInput = match decode_param(&req.id, &req.params, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_user(input) {
        Ok(saved) => ok(&req.id, json!({ "user": saved.map(|u| u.profile()) })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(user_id) = param_i64(&req.params, "userId") else {
        return err(&req.id, "bad_params", "missing userId", None);
    };
    match store.delete_user(user_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.list" => Some(handle_users_list(state, req)),
        "users.save" => Some(handle_users_save(state, req)),
        "users.delete" => Some(handle_users_delete(state, req)),
        _ => None,
    }
}
