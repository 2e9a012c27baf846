use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{decode_param, param_i64, param_opt_string, param_str, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::EvaluationPeriod;

fn handle_create_period(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_i64(&req.params, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(period) = param_str(&req.params, "period") else {
        return err(&req.id, "bad_params", "missing period", None);
    };
    let start_date = param_opt_string(&req.params, "startDate");
    let end_date = param_opt_string(&req.params, "endDate");
    match store.create_period(student_id, period, start_date, end_date) {
        Ok(created) => ok(&req.id, json!({ "period": created })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_update_period(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_i64(&req.params, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(original) = param_str(&req.params, "originalPeriod") else {
        return err(&req.id, "bad_params", "missing originalPeriod", None);
    };
    let Some(period) = param_str(&req.params, "period") else {
        return err(&req.id, "bad_params", "missing period", None);
    };
    let start_date = param_opt_string(&req.params, "startDate");
    let end_date = param_opt_string(&req.params, "endDate");
    match store.update_period(student_id, original, period, start_date, end_date) {
        Ok(updated) => ok(&req.id, json!({ "period": updated })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_save_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_i64(&req.params, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let sheet: EvaluationPeriod = match decode_param(&req.id, &req.params, "sheet") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.save_sheet(student_id, sheet) {
        Ok(saved) => ok(&req.id, json!({ "sheet": saved })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_next_period_name(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_i64(&req.params, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    match store.next_period_name(student_id) {
        Ok(name) => ok(&req.id, json!({ "name": name })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "evaluations.createPeriod" => Some(handle_create_period(state, req)),
        "evaluations.updatePeriod" => Some(handle_update_period(state, req)),
        "evaluations.saveSheet" => Some(handle_save_sheet(state, req)),
        "evaluations.nextPeriodName" => Some(handle_next_period_name(state, req)),
        _ => None,
    }
}
