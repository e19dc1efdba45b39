//! Executing procedure requests
//!
//! `ProcedureInvoker` owns one call from start to finish: it opens a
//! connection through its `Connector`, runs the parameterized batch,
//! commits or rolls back on the procedure's return code and closes the
//! connection on every exit path.

mod call;
mod result;

#[cfg(test)]
mod tests;

pub use call::{CallBatch, RETURN_VALUE_COLUMN, quote_object_name};
pub use result::ProcedureResult;

use std::future::Future;
use std::time::Instant;

use sqlauto_core::{
    Connection, ConnectionDescriptor, Connector, RawConnectionArgs, Result, SqlautoError,
    build_connection_descriptor,
};

use crate::request::{ProcedureKind, ProcedureRequest, RawProcedureArgs, build_procedure_request};
use result::split_return_code;

/// Runs stored procedure calls over connections from `C`
#[derive(Debug, Clone)]
pub struct ProcedureInvoker<C> {
    connector: C,
}

impl<C: Connector> ProcedureInvoker<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Validate raw input, then execute
    ///
    /// Both the procedure arguments and the connection arguments are
    /// checked before any connection is attempted.
    pub async fn invoke(
        &self,
        connection: RawConnectionArgs,
        kind: ProcedureKind,
        args: &RawProcedureArgs,
    ) -> Result<ProcedureResult> {
        let request = build_procedure_request(kind, args)?;
        let descriptor = build_connection_descriptor(connection)?;
        self.execute(&descriptor, request).await
    }

    /// Execute `request` and wait for it to finish
    pub async fn execute(
        &self,
        descriptor: &ConnectionDescriptor,
        request: ProcedureRequest,
    ) -> Result<ProcedureResult> {
        self.execute_until(descriptor, request, std::future::pending::<()>())
            .await
    }

    /// Execute `request`, giving up when `cancel` completes
    ///
    /// On cancellation the in-flight call is dropped, the connection is
    /// closed and `SqlautoError::Cancelled` is returned.
    #[tracing::instrument(
        skip_all,
        fields(procedure = %request.procedure_name(), conn = %descriptor)
    )]
    pub async fn execute_until<F>(
        &self,
        descriptor: &ConnectionDescriptor,
        request: ProcedureRequest,
        cancel: F,
    ) -> Result<ProcedureResult>
    where
        F: Future<Output = ()> + Send,
    {
        let started = Instant::now();
        tokio::pin!(cancel);

        let connection = tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::info!("cancelled before the connection was opened");
                return Err(SqlautoError::Cancelled);
            }
            connection = self.connector.connect(descriptor) => connection?,
        };

        let outcome = tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::warn!("cancelled while the call was running");
                Err(SqlautoError::Cancelled)
            }
            outcome = run_call(connection.as_ref(), &request) => outcome,
        };

        if let Err(err) = connection.close().await {
            tracing::warn!(error = %err, "failed to close connection");
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(result) => tracing::info!(
                return_code = result.return_code(),
                rows = result.row_count(),
                elapsed_ms,
                "procedure completed"
            ),
            Err(err) => tracing::error!(error = %err, elapsed_ms, "procedure failed"),
        }
        outcome
    }
}

async fn run_call(connection: &dyn Connection, request: &ProcedureRequest) -> Result<ProcedureResult> {
    let procedure = request.procedure_name();
    let batch = CallBatch::for_request(request);
    tracing::debug!(arguments = %request.argument_list(), "dispatching call");

    let result_sets = connection
        .query_all(batch.sql(), batch.params())
        .await
        .map_err(|err| after_dispatch(procedure, err))?;

    let (return_code, rows) = match split_return_code(result_sets) {
        Ok(parts) => parts,
        Err(message) => {
            rollback(connection).await;
            return Err(SqlautoError::procedure_failed(procedure, message));
        }
    };

    if return_code != 0 {
        tracing::debug!(return_code, rows = rows.len(), "rolling back");
        rollback(connection).await;
        return Err(SqlautoError::return_code(procedure, return_code));
    }

    connection.commit().await.map_err(|err| {
        SqlautoError::procedure_failed(procedure, format!("commit failed: {err}"))
    })?;

    Ok(ProcedureResult::new(procedure, return_code, rows))
}

/// Errors raised once the batch was sent belong to the procedure
fn after_dispatch(procedure: &str, err: SqlautoError) -> SqlautoError {
    match err {
        SqlautoError::Cancelled | SqlautoError::Procedure { .. } => err,
        other => SqlautoError::procedure_failed(procedure, other.to_string()),
    }
}

async fn rollback(connection: &dyn Connection) {
    if let Err(err) = connection.rollback().await {
        tracing::warn!(error = %err, "rollback failed");
    }
}
