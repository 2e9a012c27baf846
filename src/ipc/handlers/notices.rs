use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::NoticeDraft;

fn handle_notices_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "notices": store.notices() }))
}

fn handle_notices_send(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: NoticeDraft = match decode_param(&req.id, &req.params, "notice") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.send_notice(draft) {
        Ok(sent) => ok(&req.id, json!({ "notice": sent })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_notices_mark_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(notice_id) = param_i64(&req.params, "noticeId") else {
        return err(&req.id, "bad_params", "missing noticeId", None);
    };
    let Some(user_id) = param_i64(&req.params, "userId") else {
        return err(&req.id, "bad_params", "missing userId", None);
    };
    match store.mark_notice_read(notice_id, user_id) {
        Ok(marked) => ok(&req.id, json!({ "notice": marked })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_notices_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(notice_id) = param_i64(&req.params, "noticeId") else {
        return err(&req.id, "bad_params", "missing noticeId", None);
    };
    match store.delete_notice(notice_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notices.list" => Some(handle_notices_list(state, req)),
        "notices.send" => Some(handle_notices_send(state, req)),
        "notices.markRead" => Some(handle_notices_mark_read(state, req)),
        "notices.delete" => Some(handle_notices_delete(state, req)),
        _ => None,
    }
}
