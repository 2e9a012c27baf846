mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn export_writes_a_dated_document_with_counts() {
    let workspace = temp_dir("sapid-export");
    let out_dir = workspace.join("exports");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.save",
        json!({ "class": { "name": "Maternal I", "teacherId": 1 } }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.save",
        json!({ "student": {
            "name": "Ana", "dob": "2021-01-01", "classId": 1, "shift": "Manhã",
            "status": "active", "guardians": [{ "name": "G", "phone": "1" }]
        } }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.export",
        json!({ "outDir": out_dir.to_string_lossy() }),
    );
    assert_eq!(exported["counts"]["users"], 1);
    assert_eq!(exported["counts"]["classes"], 1);
    assert_eq!(exported["counts"]["students"], 1);
    assert_eq!(exported["counts"]["attendance"], 0);

    let path = std::path::PathBuf::from(exported["path"].as_str().expect("path"));
    let file_name = path.file_name().and_then(|n| n.to_str()).expect("name");
    assert!(file_name.starts_with("sapi_backup_"), "got {}", file_name);
    assert!(file_name.ends_with(".json"));

    // the document itself is a full replica, passwords included
    let text = std::fs::read_to_string(&path).expect("read export");
    let doc: serde_json::Value = serde_json::from_str(&text).expect("parse export");
    assert_eq!(doc["users"][0]["login"], "admin");
    assert_eq!(doc["users"][0]["password"], "senha123");
    assert_eq!(doc["students"].as_array().map(Vec::len), Some(1));

    let missing_dir = request(
        &mut stdin,
        &mut reader,
        "5",
        "backup.export",
        json!({ "outDir": "  " }),
    );
    assert_eq!(error_code(&missing_dir), "bad_params");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn import_transplants_the_whole_dataset() {
    let source = temp_dir("sapid-import-source");
    let target = temp_dir("sapid-import-target");
    let out_dir = source.join("exports");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    // populate the source workspace and export it
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": source.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "users.save",
        json!({ "user": {
            "name": "Beatriz", "login": "bia", "role": "Professor", "password": "x"
        } }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.save",
        json!({ "student": {
            "name": "Ana", "cpf": "111.111.111-11", "dob": "2021-01-01",
            "classId": 1, "shift": "Manhã", "status": "active",
            "guardians": [{ "name": "G", "phone": "1" }]
        } }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "notices.send",
        json!({ "notice": { "content": "Oi", "senderId": 1, "recipientId": "all" } }),
    );
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "backup.export",
        json!({ "outDir": out_dir.to_string_lossy() }),
    );
    let backup_path = exported["path"].as_str().expect("path").to_string();

    // a fresh workspace starts from the bootstrap admin only
    request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "workspace.select",
        json!({ "path": target.to_string_lossy() }),
    );
    let before = request_ok(&mut stdin, &mut reader, "7", "users.list", json!({}));
    assert_eq!(before["users"].as_array().map(Vec::len), Some(1));

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "backup.import",
        json!({ "inPath": backup_path }),
    );
    assert_eq!(imported["counts"]["users"], 2);
    assert_eq!(imported["counts"]["students"], 1);
    assert_eq!(imported["counts"]["notices"], 1);

    let users = request_ok(&mut stdin, &mut reader, "9", "users.list", json!({}));
    assert_eq!(users["users"].as_array().map(Vec::len), Some(2));
    let students = request_ok(&mut stdin, &mut reader, "10", "students.list", json!({}));
    assert_eq!(students["students"][0]["name"], "Ana");
    let notices = request_ok(&mut stdin, &mut reader, "11", "notices.list", json!({}));
    assert_eq!(notices["notices"].as_array().map(Vec::len), Some(1));

    // the transplanted accounts are live: bia can log in
    request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "auth.login",
        json!({ "login": "bia", "password": "x" }),
    );

    let _ = std::fs::remove_dir_all(source);
    let _ = std::fs::remove_dir_all(target);
}

#[test]
fn malformed_documents_are_rejected_without_state_change() {
    let workspace = temp_dir("sapid-import-invalid");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.save",
        json!({ "student": {
            "name": "Ana", "dob": "2021-01-01", "classId": 1, "shift": "Manhã",
            "status": "active", "guardians": [{ "name": "G", "phone": "1" }]
        } }),
    );

    // mandatory students array missing
    let missing_key = workspace.join("missing-key.json");
    std::fs::write(&missing_key, r#"{ "users": [], "classes": [] }"#).expect("write doc");
    let refused = request(
        &mut stdin,
        &mut reader,
        "3",
        "backup.import",
        json!({ "inPath": missing_key.to_string_lossy() }),
    );
    assert_eq!(error_code(&refused), "invalid_snapshot");

    // one malformed entity poisons the whole document
    let bad_entity = workspace.join("bad-entity.json");
    std::fs::write(
        &bad_entity,
        r#"{ "users": [], "classes": [], "students": [{ "id": 1, "name": "Sem Dob" }] }"#,
    )
    .expect("write doc");
    let refused = request(
        &mut stdin,
        &mut reader,
        "4",
        "backup.import",
        json!({ "inPath": bad_entity.to_string_lossy() }),
    );
    assert_eq!(error_code(&refused), "invalid_snapshot");

    let nowhere = request(
        &mut stdin,
        &mut reader,
        "5",
        "backup.import",
        json!({ "inPath": workspace.join("nao-existe.json").to_string_lossy() }),
    );
    assert_eq!(error_code(&nowhere), "not_found");

    // prior state is intact after every refusal
    let students = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));
    assert_eq!(students["students"].as_array().map(Vec::len), Some(1));
    let users = request_ok(&mut stdin, &mut reader, "7", "users.list", json!({}));
    assert_eq!(users["users"].as_array().map(Vec::len), Some(1));

    let _ = std::fs::remove_dir_all(workspace);
}
