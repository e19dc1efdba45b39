use crate::args::OutputFormat;
use crate::output::{render_dry_run, render_result};
use pretty_assertions::assert_eq;
use sqlauto_core::{ConnectionDescriptor, Row, Value};
use sqlauto_procedures::{ProcedureKind, RawProcedureArgs, ProcedureResult, build_procedure_request};

fn backup_result() -> ProcedureResult {
    let columns = vec!["message".to_string(), "file".to_string()];
    ProcedureResult::new(
        "dbo.usp_THKBackupDb",
        0,
        vec![
            Row::new(
                columns.clone(),
                vec![Value::from("Processed 512 pages"), Value::Null],
            ),
            Row::new(
                columns,
                vec![
                    Value::from("BACKUP DATABASE successfully processed"),
                    Value::from("mydb_full.bak"),
                ],
            ),
        ],
    )
}

#[test]
fn test_table_lists_rows_and_summary() {
    let text = render_result(&backup_result(), OutputFormat::Table).unwrap();

    assert!(text.contains("message"));
    assert!(text.contains("BACKUP DATABASE successfully processed"));
    assert!(text.contains("mydb_full.bak"));
    assert!(text.contains("NULL"));
    assert!(text.ends_with("dbo.usp_THKBackupDb returned 0 (2 rows)"));
}

#[test]
fn test_table_without_rows_is_summary_only() {
    let result = ProcedureResult::new("dbo.usp_THKRestoreDb", 0, Vec::new());
    let text = render_result(&result, OutputFormat::Table).unwrap();
    assert_eq!(text, "dbo.usp_THKRestoreDb returned 0 (0 rows)");
}

#[test]
fn test_json_result() {
    let text = render_result(&backup_result(), OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["return_code"], 0);
    assert_eq!(json["rows"][1]["file"], "mydb_full.bak");
    assert_eq!(json["rows"][0]["file"], serde_json::Value::Null);
}

#[test]
fn test_dry_run_shows_arguments_and_redacted_connection() {
    let raw = RawProcedureArgs {
        database: Some("mydb".into()),
        retention: Some(14),
        ..Default::default()
    };
    let request = build_procedure_request(ProcedureKind::Backup, &raw).unwrap();
    let descriptor =
        ConnectionDescriptor::host("sql01", 1433, "mydb").with_credentials("svc", "hunter2");

    let text = render_dry_run(&request, &descriptor, OutputFormat::Table).unwrap();

    assert!(text.starts_with("dbo.usp_THKBackupDb @database=mydb,@client=mydb,"));
    assert!(text.contains("@retention=14"));
    assert!(text.contains("Server=sql01,1433"));
    assert!(!text.contains("hunter2"));
}

#[test]
fn test_dry_run_json() {
    let request = build_procedure_request(
        ProcedureKind::Restore,
        &RawProcedureArgs {
            filename: Some("a.bak".into()),
            ..Default::default()
        },
    )
    .unwrap();
    let descriptor = ConnectionDescriptor::dsn("reporting");

    let text = render_dry_run(&request, &descriptor, OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["procedure"], "dbo.usp_THKRestoreDb");
    assert_eq!(json["connection"], "DSN=reporting;Trusted_Connection=True");
}
