use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};
use crate::session;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(login) = param_str(&req.params, "login") else {
        return err(&req.id, "bad_params", "missing login", None);
    };
    let Some(password) = param_str(&req.params, "password") else {
        return err(&req.id, "bad_params", "missing password", None);
    };

    match session::resolve(store.users(), store.students(), login, password) {
        Some(resolved) => {
            let payload = resolved.payload();
            state.session = Some(resolved);
            ok(&req.id, json!({ "session": payload }))
        }
        // One generic message; never reveal which of the two fields was wrong.
        None => err(
            &req.id,
            "invalid_credentials",
            "invalid login or password",
            None,
        ),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = None;
    ok(&req.id, json!({ "ok": true }))
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "session": state.session.as_ref().map(|s| s.payload()) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.current" => Some(handle_current(state, req)),
        _ => None,
    }
}
