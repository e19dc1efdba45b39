//! A single SQL Server session over tiberius

use async_trait::async_trait;
use sqlauto_core::{ColumnMeta, Connection, QueryResult, Result, Row, SqlautoError, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, Row as TiberiusRow, time};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::connector::Endpoint;

/// Failures inside the tiberius driver
#[derive(Debug, thiserror::Error)]
pub enum MssqlConnectionError {
    #[error("cannot connect: {0}")]
    ConnectionFailed(String),

    #[error("login rejected: {0}")]
    AuthenticationFailed(String),

    #[error("batch failed: {0}")]
    QueryFailed(String),

    #[error("unsupported column value: {0}")]
    TypeConversion(String),

    #[error("connection already closed")]
    ConnectionClosed,

    #[error("TDS error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MssqlConnectionError> for SqlautoError {
    fn from(err: MssqlConnectionError) -> Self {
        match err {
            MssqlConnectionError::ConnectionFailed(_)
            | MssqlConnectionError::AuthenticationFailed(_)
            | MssqlConnectionError::ConnectionClosed
            | MssqlConnectionError::Io(_) => SqlautoError::Connection(err.to_string()),
            MssqlConnectionError::QueryFailed(_)
            | MssqlConnectionError::TypeConversion(_)
            | MssqlConnectionError::Tiberius(_) => SqlautoError::Driver(err.to_string()),
        }
    }
}

type TdsClient = Client<Compat<TcpStream>>;

/// MS SQL Server connection using tiberius
pub struct MssqlConnection {
    client: Mutex<Option<TdsClient>>,
    closed: AtomicBool,
    database: String,
}

impl MssqlConnection {
    /// Open a connection to a resolved endpoint
    ///
    /// Hosts of the form `host\instance` are located through the SQL Server
    /// Browser service; the endpoint port is ignored in that case. An empty
    /// username selects integrated authentication, which is only available
    /// on Windows.
    #[tracing::instrument(skip(endpoint), fields(host = %endpoint.host, database = %endpoint.database))]
    pub async fn connect(endpoint: &Endpoint) -> std::result::Result<Self, MssqlConnectionError> {
        tracing::debug!("connecting to MS SQL Server at {}", endpoint.address());

        let mut config = Config::new();
        config.host(&endpoint.host);
        match &endpoint.instance {
            Some(instance) => config.instance_name(instance),
            None => config.port(endpoint.port),
        }
        config.database(&endpoint.database);
        config.application_name("sqlauto");

        if endpoint.trust_cert {
            config.trust_cert();
        }

        config.encryption(EncryptionLevel::Required);

        if endpoint.username.is_empty() {
            #[cfg(windows)]
            {
                config.authentication(AuthMethod::Integrated);
            }
            #[cfg(not(windows))]
            {
                return Err(MssqlConnectionError::AuthenticationFailed(
                    "a username is required; Windows authentication is only supported on Windows"
                        .to_string(),
                ));
            }
        } else {
            config.authentication(AuthMethod::sql_server(
                &endpoint.username,
                &endpoint.password,
            ));
        }

        let tcp = if endpoint.instance.is_some() {
            use tiberius::SqlBrowser;
            TcpStream::connect_named(&config)
                .await
                .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?
        } else {
            TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?
        };

        tcp.set_nodelay(true)?;
        let compat_stream = tcp.compat_write();

        let client = Client::connect(config, compat_stream)
            .await
            .map_err(|e| match e {
                tiberius::error::Error::Server(token) if token.code() == 18456 => {
                    MssqlConnectionError::AuthenticationFailed(token.message().to_string())
                }
                other => MssqlConnectionError::ConnectionFailed(other.to_string()),
            })?;

        tracing::debug!("successfully connected to MS SQL Server");

        Ok(Self {
            client: Mutex::new(Some(client)),
            closed: AtomicBool::new(false),
            database: endpoint.database.clone(),
        })
    }

    /// Database the session was opened against
    pub fn database(&self) -> &str {
        &self.database
    }

    async fn run_control(&self, sql: &str) -> std::result::Result<(), MssqlConnectionError> {
        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(MssqlConnectionError::ConnectionClosed)?;
        client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    fn driver_name(&self) -> &str {
        "mssql"
    }

    async fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<QueryResult>> {
        let start = std::time::Instant::now();

        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(MssqlConnectionError::ConnectionClosed)?;

        let tiberius_params = values_to_tiberius_params(params);
        let param_refs: Vec<&dyn tiberius::ToSql> = tiberius_params
            .iter()
            .map(|p| p as &dyn tiberius::ToSql)
            .collect();

        let stream = client.query(sql, &param_refs[..]).await.map_err(|e| {
            tracing::error!(error = %e, "query failed");
            MssqlConnectionError::QueryFailed(e.to_string())
        })?;

        let result_sets = stream
            .into_results()
            .await
            .map_err(|e| MssqlConnectionError::QueryFailed(e.to_string()))?;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        let mut results = Vec::with_capacity(result_sets.len());

        for tib_rows in result_sets {
            let columns: Vec<ColumnMeta> = tib_rows
                .first()
                .map(|first_row| {
                    first_row
                        .columns()
                        .iter()
                        .enumerate()
                        .map(|(idx, col)| tiberius_column_to_meta(col, idx))
                        .collect()
                })
                .unwrap_or_default();
            let column_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

            let mut rows = Vec::with_capacity(tib_rows.len());
            for tib_row in tib_rows {
                let values = tiberius_row_to_values(tib_row)?;
                rows.push(Row::new(column_names.clone(), values));
            }

            results.push(QueryResult {
                columns,
                rows,
                execution_time_ms,
            });
        }

        tracing::debug!(
            result_sets = results.len(),
            duration_ms = execution_time_ms,
            "batch completed"
        );

        Ok(results)
    }

    async fn commit(&self) -> Result<()> {
        self.run_control("IF @@TRANCOUNT > 0 COMMIT TRANSACTION").await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.run_control("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION").await?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let client = self.client.lock().await.take();
        if let Some(client) = client {
            client.close().await.map_err(MssqlConnectionError::from)?;
        }
        tracing::debug!("MS SQL Server connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn tiberius_column_to_meta(col: &tiberius::Column, ordinal: usize) -> ColumnMeta {
    ColumnMeta {
        name: col.name().to_string(),
        data_type: format!("{:?}", col.column_type()),
        ordinal,
    }
}

fn tiberius_row_to_values(row: TiberiusRow) -> Result<Vec<Value>> {
    row.into_iter().map(column_data_to_value).collect()
}

fn days_from(year: i32, days: i64) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days)))
        .ok_or_else(|| {
            MssqlConnectionError::TypeConversion(format!("date out of range: {days} days")).into()
        })
}

fn time_of_day(seconds: u64, nanos: u64) -> Result<NaiveTime> {
    u32::try_from(seconds)
        .ok()
        .zip(u32::try_from(nanos).ok())
        .and_then(|(secs, nano)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nano))
        .ok_or_else(|| {
            MssqlConnectionError::TypeConversion(format!(
                "time out of range: {seconds}s {nanos}ns after midnight"
            ))
            .into()
        })
}

fn time_from_increments(increments: u64, scale: u8) -> Result<NaiveTime> {
    let nanos = 10u64
        .checked_pow(9u32.saturating_sub(u32::from(scale)))
        .and_then(|unit| increments.checked_mul(unit))
        .ok_or_else(|| {
            MssqlConnectionError::TypeConversion(format!(
                "time out of range: {increments} increments at scale {scale}"
            ))
        })?;
    time_of_day(nanos / 1_000_000_000, nanos % 1_000_000_000)
}

fn legacy_datetime(v: time::DateTime) -> Result<Value> {
    // fragments are 1/300 of a second
    let fragments = u64::from(v.seconds_fragments());
    let date = days_from(1900, i64::from(v.days()))?;
    let time = time_of_day(fragments / 300, (fragments % 300) * 1_000_000_000 / 300)?;
    Ok(Value::DateTime(date.and_time(time)))
}

fn small_datetime(v: time::SmallDateTime) -> Result<Value> {
    // fragments are minutes
    let date = days_from(1900, i64::from(v.days()))?;
    let time = time_of_day(u64::from(v.seconds_fragments()) * 60, 0)?;
    Ok(Value::DateTime(date.and_time(time)))
}

fn datetime2(v: time::DateTime2) -> Result<NaiveDateTime> {
    let date = days_from(1, i64::from(v.date().days()))?;
    Ok(date.and_time(time_from_increments(v.time().increments(), v.time().scale())?))
}

/// Convert tiberius ColumnData to a sqlauto Value
///
/// A NULL of any column type becomes `Value::Null`.
pub(crate) fn column_data_to_value(data: ColumnData<'static>) -> Result<Value> {
    let value = match data {
        ColumnData::Bit(v) => v.map(Value::Bool),
        ColumnData::U8(v) => v.map(|b| Value::Int16(i16::from(b))),
        ColumnData::I16(v) => v.map(Value::Int16),
        ColumnData::I32(v) => v.map(Value::Int32),
        ColumnData::I64(v) => v.map(Value::Int64),
        ColumnData::F32(v) => v.map(Value::Float32),
        ColumnData::F64(v) => v.map(Value::Float64),
        ColumnData::Numeric(v) => v.map(|n| Value::Decimal(n.to_string())),
        ColumnData::String(v) => v.map(|text| Value::String(text.into_owned())),
        ColumnData::Xml(v) => v.map(|xml| Value::String(xml.into_owned().into_string())),
        ColumnData::Guid(v) => v.map(Value::Uuid),
        ColumnData::Binary(v) => v.map(|bytes| Value::Bytes(bytes.into_owned())),
        ColumnData::Date(v) => v
            .map(|d| days_from(1, i64::from(d.days())).map(Value::Date))
            .transpose()?,
        ColumnData::Time(v) => v
            .map(|t| time_from_increments(t.increments(), t.scale()).map(Value::Time))
            .transpose()?,
        ColumnData::DateTime(v) => v.map(legacy_datetime).transpose()?,
        ColumnData::SmallDateTime(v) => v.map(small_datetime).transpose()?,
        ColumnData::DateTime2(v) => v.map(|dt| datetime2(dt).map(Value::DateTime)).transpose()?,
        ColumnData::DateTimeOffset(v) => v
            .map(|dto| datetime2(dto.datetime2()).map(|naive| Value::DateTimeUtc(naive.and_utc())))
            .transpose()?,
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Owned parameter value bound to one `@Pn` placeholder
#[derive(Debug, PartialEq)]
pub(crate) enum TiberiusParam {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
}

impl tiberius::ToSql for TiberiusParam {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            // nvarchar NULL converts to any parameter type
            Self::Null => ColumnData::String(None),
            Self::Bool(b) => ColumnData::Bit(Some(*b)),
            Self::I16(n) => ColumnData::I16(Some(*n)),
            Self::I32(n) => ColumnData::I32(Some(*n)),
            Self::I64(n) => ColumnData::I64(Some(*n)),
            Self::F32(n) => ColumnData::F32(Some(*n)),
            Self::F64(n) => ColumnData::F64(Some(*n)),
            Self::String(text) => ColumnData::String(Some(Cow::Borrowed(text))),
            Self::Bytes(bytes) => ColumnData::Binary(Some(Cow::Borrowed(bytes))),
            Self::Uuid(id) => ColumnData::Guid(Some(*id)),
        }
    }
}

impl From<&Value> for TiberiusParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int16(n) => Self::I16(*n),
            Value::Int32(n) => Self::I32(*n),
            Value::Int64(n) => Self::I64(*n),
            Value::Float32(n) => Self::F32(*n),
            Value::Float64(n) => Self::F64(*n),
            Value::String(text) => Self::String(text.clone()),
            Value::Bytes(bytes) => Self::Bytes(bytes.clone()),
            Value::Uuid(id) => Self::Uuid(*id),
            // the server converts these from their text form
            Value::Decimal(_) | Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
                Self::String(value.to_string())
            }
            Value::DateTimeUtc(dt) => Self::String(dt.to_rfc3339()),
        }
    }
}

/// Convert sqlauto Values to tiberius parameters, in placeholder order
pub(crate) fn values_to_tiberius_params(values: &[Value]) -> Vec<TiberiusParam> {
    values.iter().map(TiberiusParam::from).collect()
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("database", &self.database)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
