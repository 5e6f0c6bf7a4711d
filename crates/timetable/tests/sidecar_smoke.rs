use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_timetable");
    let mut child = Command::new(exe)
        .env("TIMETABLE_DB", ":memory:")
        .env_remove("TIMETABLE_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn timetable");
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
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

#[test]
fn sidecar_schedule_lifecycle() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], true);

    for (i, (method, params)) in [
        ("teachers.upsert", json!({ "id": "T", "name": "Tess", "email": "tess@school.test" })),
        ("courses.upsert", json!({ "id": "A", "name": "Algebra" })),
        ("students.upsert", json!({ "id": "s1", "name": "Sam", "className": "9", "section": "a" })),
    ]
    .into_iter()
    .enumerate()
    {
        let resp = request(&mut stdin, &mut reader, &format!("seed-{i}"), method, params);
        assert_eq!(resp["ok"], true, "{method}: {resp}");
    }

    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "schedule.create",
        json!({
            "teacherId": "T",
            "courseId": "A",
            "className": "9",
            "section": "A",
            "dayOfWeek": [{ "date": "Monday", "startTime": "9:00 AM", "endTime": "10:30 AM" }]
        }),
    );
    assert_eq!(created["ok"], true);
    assert_eq!(created["result"]["success"], true);
    let schedule_id = created["result"]["schedule"]["id"]
        .as_str()
        .expect("schedule id")
        .to_string();

    let clash = request(
        &mut stdin,
        &mut reader,
        "3",
        "schedule.create",
        json!({
            "teacherId": "T",
            "courseId": "B",
            "className": "9",
            "section": "B",
            "days": [{ "date": "Monday", "startTime": "10:00", "endTime": "11:00" }]
        }),
    );
    assert_eq!(clash["ok"], true);
    assert_eq!(clash["result"]["success"], false);
    assert_eq!(clash["result"]["conflict"]["kind"], "teacher");

    let bad = request(
        &mut stdin,
        &mut reader,
        "4",
        "schedule.create",
        json!({
            "teacherId": "T",
            "courseId": "B",
            "className": "9",
            "section": "B",
            "days": [{ "date": "Monday", "startTime": "late", "endTime": "11:00" }]
        }),
    );
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_params");

    let listing = request(
        &mut stdin,
        &mut reader,
        "5",
        "schedule.list",
        json!({ "className": "9", "section": "A" }),
    );
    assert_eq!(listing["result"]["total"], 1);
    assert_eq!(listing["result"]["data"][0]["teacher"]["name"], "Tess");

    let student = request(
        &mut stdin,
        &mut reader,
        "6",
        "schedule.forStudent",
        json!({ "studentId": "s1", "date": "Monday" }),
    );
    assert_eq!(student["result"].as_array().map(|a| a.len()), Some(1));

    let load = request(
        &mut stdin,
        &mut reader,
        "7",
        "schedule.teacherLoad",
        json!({ "teacherId": "T" }),
    );
    assert_eq!(load["result"]["success"], true);
    assert_eq!(load["result"]["totalStudents"], 1);

    let removed = request(
        &mut stdin,
        &mut reader,
        "8",
        "schedule.remove",
        json!({ "id": schedule_id }),
    );
    assert_eq!(removed["ok"], true);

    let gone = request(
        &mut stdin,
        &mut reader,
        "9",
        "schedule.get",
        json!({ "id": schedule_id }),
    );
    assert_eq!(gone["ok"], false);
    assert_eq!(gone["error"]["code"], "not_found");

    let unknown = request(&mut stdin, &mut reader, "10", "schedule.explode", json!({}));
    assert_eq!(unknown["error"]["code"], "not_implemented");

    drop(stdin);
    let _ = child.wait();
}
