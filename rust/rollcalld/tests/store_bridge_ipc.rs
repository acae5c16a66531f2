use serde_json::json;
use sha2::{Digest, Sha256};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

const EMAIL: &str = "teacher@school.test";
const PASSWORD: &str = "pw-1234";

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(dir: &PathBuf) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let mut hasher = Sha256::new();
    hasher.update(PASSWORD.as_bytes());
    let config = json!({
        "accounts": [{ "email": EMAIL, "passwordSha256": format!("{:x}", hasher.finalize()) }]
    });
    let config_path = dir.join("config.json");
    std::fs::write(&config_path, config.to_string()).expect("write config");

    let exe = env!("CARGO_BIN_EXE_rollcalld");
    let mut child = Command::new(exe)
        .env("ROLLCALLD_CONFIG", &config_path)
        .env("ROLLCALLD_TODAY", "2026-10-18")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollcalld");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

#[test]
fn live_backend_changes_flow_into_the_dashboard() {
    let dir = temp_dir("rollcalld-bridge");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&dir);

    let signed_in = request(
        &mut stdin,
        &mut reader,
        "1",
        "auth.signIn",
        json!({ "email": EMAIL, "password": PASSWORD }),
    );
    assert_eq!(signed_in["ok"], json!(true));

    let view = request(&mut stdin, &mut reader, "2", "dashboard.get", json!({}));
    assert_eq!(view["result"]["subjects"]["disabled"], json!(true));

    // Subjects arrive as a keyed object; roster arrives later.
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "store.load",
        json!({ "data": {
            "subjects": { "a": "Math", "b": "Art" },
            "activeSession": { "subject": "Art" }
        }}),
    );
    let view = request(&mut stdin, &mut reader, "4", "dashboard.get", json!({}));
    assert_eq!(view["result"]["subjects"]["selected"], json!("Art"));
    assert_eq!(view["result"]["activeDate"], json!("2026-10-18"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "store.set",
        json!({ "path": "students/s1", "value": { "name": "Ana <3" } }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "store.set",
        json!({ "path": "attendance/Art/2026-10-18/s1", "value": { "time": "08:01" } }),
    );
    let html = request(&mut stdin, &mut reader, "7", "dashboard.html", json!({}));
    let tbody = html["result"]["tbody"].as_str().expect("tbody");
    assert!(tbody.contains("Ana &lt;3"));
    assert!(tbody.contains("class=\"status-present\">Present"));
    assert!(tbody.contains("<td>1/1</td><td>100.0%</td>"));

    // Attendance removed upstream.
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "store.remove",
        json!({ "path": "attendance/Art" }),
    );
    let view = request(&mut stdin, &mut reader, "9", "dashboard.get", json!({}));
    let row = &view["result"]["rows"][0];
    assert_eq!(row["status"], json!("Absent"));
    assert_eq!(row["fraction"], json!("0/0"));
    assert_eq!(row["percentage"], json!("0.0%"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn disconnect_fails_sign_in_and_reconnect_catches_up() {
    let dir = temp_dir("rollcalld-offline");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&dir);

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "store.setConnected",
        json!({ "connected": false }),
    );
    let offline = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.signIn",
        json!({ "email": EMAIL, "password": PASSWORD }),
    );
    assert_eq!(offline["ok"], json!(false));
    assert_eq!(offline["error"]["details"]["kind"], json!("network"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "store.setConnected",
        json!({ "connected": true }),
    );
    let online = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.signIn",
        json!({ "email": EMAIL, "password": PASSWORD }),
    );
    assert_eq!(online["ok"], json!(true));

    // Writes made while offline show up once connectivity returns.
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "store.setConnected",
        json!({ "connected": false }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "store.set",
        json!({ "path": "students", "value": { "s9": { "name": "Cy" } } }),
    );
    let view = request(&mut stdin, &mut reader, "7", "dashboard.get", json!({}));
    assert_eq!(view["result"]["rows"][0]["kind"], json!("placeholder"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "store.setConnected",
        json!({ "connected": true }),
    );
    let view = request(&mut stdin, &mut reader, "9", "dashboard.get", json!({}));
    assert_eq!(view["result"]["rows"][0]["name"], json!("Cy"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}
