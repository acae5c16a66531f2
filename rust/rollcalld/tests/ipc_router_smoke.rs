use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollcalld");
    let mut child = Command::new(exe)
        .env_remove("ROLLCALLD_CONFIG")
        .env_remove("ROLLCALLD_TODAY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollcalld");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send_line(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    line: &str,
) -> serde_json::Value {
    writeln!(stdin, "{}", line).expect("write request");
    stdin.flush().expect("flush request");

    let mut out = String::new();
    reader.read_line(&mut out).expect("read response line");
    assert!(!out.trim().is_empty(), "empty response for {}", line);
    serde_json::from_str(out.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    let value = send_line(stdin, reader, &payload.to_string());
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["result"]["signedIn"], json!(false));
    assert_eq!(health["result"]["subscriptionCount"], json!(0));
    assert_eq!(health["result"]["connected"], json!(true));

    let state = request(&mut stdin, &mut reader, "2", "auth.state", json!({}));
    assert_eq!(state["result"]["signedIn"], json!(false));

    let view = request(&mut stdin, &mut reader, "3", "dashboard.get", json!({}));
    assert_eq!(view["result"]["view"], json!("login"));

    let html = request(&mut stdin, &mut reader, "4", "dashboard.html", json!({}));
    assert!(html["result"]["tbody"]
        .as_str()
        .unwrap_or("")
        .contains("No students found."));

    let select = request(
        &mut stdin,
        &mut reader,
        "5",
        "subjects.select",
        json!({ "subject": "Math" }),
    );
    assert_eq!(error_code(&select), "not_signed_in");

    let set = request(
        &mut stdin,
        &mut reader,
        "6",
        "store.set",
        json!({ "path": "subjects", "value": ["Math"] }),
    );
    assert_eq!(set["ok"], json!(true));

    let get = request(
        &mut stdin,
        &mut reader,
        "7",
        "store.get",
        json!({ "path": "subjects" }),
    );
    assert_eq!(get["result"]["value"], json!(["Math"]));

    let bad_path = request(
        &mut stdin,
        &mut reader,
        "8",
        "store.get",
        json!({ "path": "attendance/Math.1" }),
    );
    assert_eq!(error_code(&bad_path), "bad_params");

    let no_accounts = request(
        &mut stdin,
        &mut reader,
        "9",
        "auth.signIn",
        json!({ "email": "t@school.test", "password": "pw" }),
    );
    assert_eq!(error_code(&no_accounts), "auth_failed");
    assert_eq!(
        no_accounts["error"]["details"]["kind"],
        json!("invalidCredentials")
    );

    let unknown = request(&mut stdin, &mut reader, "10", "grades.open", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_lines_do_not_stop_the_sidecar() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let bad = send_line(&mut stdin, &mut reader, "{not json");
    assert_eq!(bad["ok"], json!(false));
    assert_eq!(error_code(&bad), "bad_json");

    let missing_params = request(&mut stdin, &mut reader, "1", "store.set", json!({}));
    assert_eq!(error_code(&missing_params), "bad_params");

    let health = request(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["ok"], json!(true));

    drop(stdin);
    let status = child.wait().expect("wait");
    assert!(status.success());
}
