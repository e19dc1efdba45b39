//! T-SQL batch for a parameterized procedure call

use sqlauto_core::Value;

use crate::request::ProcedureRequest;

/// Column the batch reports the procedure's return code in
pub const RETURN_VALUE_COLUMN: &str = "Return Value";

/// A statement batch plus the values bound to its `@P` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct CallBatch {
    sql: String,
    params: Vec<Value>,
}

impl CallBatch {
    /// Render the batch for `request`
    ///
    /// Values never appear in the SQL text. Each one is bound to the next
    /// `@Pn` placeholder and the procedure name is bracket-quoted.
    pub fn for_request(request: &ProcedureRequest) -> Self {
        let arguments = request
            .params()
            .iter()
            .enumerate()
            .map(|(idx, param)| format!("@{} = @P{}", param.name, idx + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let exec = if arguments.is_empty() {
            format!(
                "EXEC @return_value = {}",
                quote_object_name(request.procedure_name())
            )
        } else {
            format!(
                "EXEC @return_value = {} {}",
                quote_object_name(request.procedure_name()),
                arguments
            )
        };

        let sql = format!(
            "SET NOCOUNT ON;\nDECLARE @return_value int;\n{exec};\nSELECT '{RETURN_VALUE_COLUMN}' = @return_value;"
        );

        Self {
            sql,
            params: request.params().iter().map(|p| p.value.clone()).collect(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Quote a possibly schema-qualified name, `dbo.proc` -> `[dbo].[proc]`
pub fn quote_object_name(name: &str) -> String {
    name.split('.')
        .map(|part| format!("[{}]", part.replace(']', "]]")))
        .collect::<Vec<_>>()
        .join(".")
}
