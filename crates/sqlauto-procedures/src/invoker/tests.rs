use super::result::split_return_code;
use super::*;
use crate::request::ProcedureParam;
use indoc::indoc;
use pretty_assertions::assert_eq;
use sqlauto_core::{QueryResult, Row, Value};

fn status(code: Value) -> QueryResult {
    QueryResult::from_rows(&[RETURN_VALUE_COLUMN], vec![vec![code]])
}

#[test]
fn test_call_batch_binds_every_value() {
    let request = ProcedureRequest::new(
        "dbo.usp_THKBackupDb",
        vec![
            ProcedureParam::new("database", "x'; DROP DATABASE mydb; --"),
            ProcedureParam::new("retention", 14),
            ProcedureParam::new("media_set", Value::Null),
        ],
    )
    .unwrap();

    let batch = CallBatch::for_request(&request);

    assert_eq!(
        batch.sql(),
        indoc! {"
            SET NOCOUNT ON;
            DECLARE @return_value int;
            EXEC @return_value = [dbo].[usp_THKBackupDb] @database = @P1, @retention = @P2, @media_set = @P3;
            SELECT 'Return Value' = @return_value;"}
    );
    assert!(!batch.sql().contains("DROP"));
    assert_eq!(
        batch.params(),
        &[
            Value::from("x'; DROP DATABASE mydb; --"),
            Value::Int32(14),
            Value::Null,
        ]
    );
}

#[test]
fn test_call_batch_without_parameters() {
    let request = ProcedureRequest::new("usp_Ping", Vec::new()).unwrap();
    let batch = CallBatch::for_request(&request);
    assert!(batch.sql().contains("EXEC @return_value = [usp_Ping];"));
    assert!(batch.params().is_empty());
}

#[test]
fn test_quote_object_name_escapes_brackets() {
    assert_eq!(quote_object_name("dbo.usp_THKRestoreDb"), "[dbo].[usp_THKRestoreDb]");
    assert_eq!(quote_object_name("odd]name"), "[odd]]name]");
}

#[test]
fn test_split_return_code_keeps_earlier_rows() {
    let messages = QueryResult::from_rows(
        &["message"],
        vec![
            vec![Value::from("Processed 512 pages")],
            vec![Value::from("BACKUP DATABASE successfully processed")],
        ],
    );
    let files = QueryResult::from_rows(&["file"], vec![vec![Value::from("mydb_full.bak")]]);

    let (code, rows) = split_return_code(vec![messages, files, status(Value::Int32(0))]).unwrap();

    assert_eq!(code, 0);
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[2].get_by_name("file"),
        Some(&Value::from("mydb_full.bak"))
    );
}

#[test]
fn test_split_return_code_non_zero() {
    let (code, rows) = split_return_code(vec![status(Value::Int32(7))]).unwrap();
    assert_eq!(code, 7);
    assert!(rows.is_empty());
}

#[test]
fn test_split_return_code_requires_status_set() {
    assert!(split_return_code(Vec::new()).is_err());
    assert!(split_return_code(vec![QueryResult::empty()]).is_err());
    assert!(split_return_code(vec![status(Value::Null)]).is_err());
    assert!(split_return_code(vec![status(Value::from("zero"))]).is_err());
    assert!(split_return_code(vec![status(Value::Int64(i64::MAX))]).is_err());
}

#[test]
fn test_procedure_result_columns_in_first_seen_order() {
    let rows = vec![
        Row::new(vec!["message".into()], vec![Value::from("a")]),
        Row::new(
            vec!["file".into(), "message".into()],
            vec![Value::from("b.bak"), Value::from("c")],
        ),
    ];
    let result = ProcedureResult::new("dbo.usp_THKBackupDb", 0, rows);

    assert_eq!(result.columns(), vec!["message", "file"]);
    assert_eq!(result.row_count(), 2);
}

#[test]
fn test_procedure_result_serializes_rows_as_maps() {
    let rows = vec![Row::new(vec!["message".into()], vec![Value::from("done")])];
    let result = ProcedureResult::new("dbo.usp_THKBackupDb", 0, rows);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "procedure": "dbo.usp_THKBackupDb",
            "return_code": 0,
            "rows": [{ "message": "done" }],
        })
    );
}
