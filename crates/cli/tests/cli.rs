use assert_cmd::Command;

fn biblioteca() -> Command {
    let mut cmd = Command::cargo_bin("biblioteca").unwrap();
    cmd.env("BIBLIOTECA_ENV", "local")
        .env("BIBLIOTECA_DATABASE__BACKEND", "memory")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn openapi_prints_the_catalogue_routes() {
    let output = biblioteca().arg("openapi").output().unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let paths = document["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/autores"));
    assert!(paths.contains_key("/api/v1/autores/{id}/libros"));
    assert!(paths.contains_key("/api/v1/libros/{id}"));
}

#[test]
fn migrate_on_memory_backend_is_a_no_op() {
    biblioteca().arg("migrate").assert().success();
}

#[test]
fn unknown_subcommand_fails() {
    biblioteca().arg("reindex").assert().failure();
}
