mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar};

#[test]
fn catalog_lists_all_areas_and_levels() {
    // the catalog is compiled in: no workspace needed
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let listed = request_ok(&mut stdin, &mut reader, "1", "areas.list", json!({}));

    let areas = listed["areas"].as_array().expect("areas");
    assert_eq!(areas.len(), 5);
    let keys: Vec<&str> = areas
        .iter()
        .map(|a| a["key"].as_str().expect("key"))
        .collect();
    assert_eq!(
        keys,
        vec!["motor", "cognitive", "language", "social", "autonomy"]
    );

    let motor = &areas[0];
    assert_eq!(motor["title"], "Desenvolvimento Motor");
    assert_eq!(motor["skills"].as_array().map(Vec::len), Some(4));
    assert_eq!(motor["skills"][0]["key"], "corre");
    assert_eq!(motor["skills"][0]["label"], "Corre com segurança");

    let cognitive = &areas[1];
    assert_eq!(cognitive["skills"].as_array().map(Vec::len), Some(5));

    assert_eq!(
        listed["levels"],
        json!([
            "Não observado",
            "Em desenvolvimento",
            "Atingido",
            "Atingido com autonomia"
        ])
    );
}
