//! Relational connection settings shared by database-backed records.
//!
//! [`RelationalConnectionSettings`] is embedded (not inherited) by records
//! such as [`JdbcAttributeRepositorySettings`](crate::JdbcAttributeRepositorySettings).
//! Its fields are flattened into the embedding record's document, so `url`
//! and `sql` sit side by side in the same section.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `url` | `jdbc:hsqldb:mem:cas-hsql-database` |
//! | `driverClass` | `org.hsqldb.jdbcDriver` |
//! | `user` | `sa` |
//! | `dialect` | `org.hibernate.dialect.HSQLDialect` |
//! | `idleTimeout` | 10 minutes |
//! | `pool.minSize` / `pool.maxSize` | 6 / 18 |

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    schema::{FieldKind, FieldSpec},
    validation::{ValidationReport, ViolationKind},
};

/// Default JDBC URL (in-memory database).
pub const DEFAULT_URL: &str = "jdbc:hsqldb:mem:cas-hsql-database";

/// Default driver class.
pub const DEFAULT_DRIVER_CLASS: &str = "org.hsqldb.jdbcDriver";

/// Default database user.
pub const DEFAULT_USER: &str = "sa";

/// Default SQL dialect.
pub const DEFAULT_DIALECT: &str = "org.hibernate.dialect.HSQLDialect";

/// Default schema management mode.
pub const DEFAULT_DDL_AUTO: &str = "update";

/// Default idle connection timeout (10 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Default leak detection threshold in milliseconds.
pub const DEFAULT_LEAK_THRESHOLD_MILLIS: u64 = 3_000;

/// Default JDBC batch size.
pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// Default pool fail-fast timeout.
pub const DEFAULT_FAIL_FAST_TIMEOUT: i64 = 1;

/// Default minimum pool size.
pub const DEFAULT_POOL_MIN_SIZE: u32 = 6;

/// Default maximum pool size.
pub const DEFAULT_POOL_MAX_SIZE: u32 = 18;

/// Default maximum wait for a pooled connection (2 seconds).
pub const DEFAULT_POOL_MAX_WAIT: Duration = Duration::from_secs(2);

/// Default pool operation timeout in milliseconds.
pub const DEFAULT_POOL_TIMEOUT_MILLIS: u64 = 1_000;

pub(crate) const POOL_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("minSize", FieldKind::U32, "Minimum number of pooled connections."),
    FieldSpec::new("maxSize", FieldKind::U32, "Maximum number of pooled connections."),
    FieldSpec::new("maxWait", FieldKind::Duration, "Maximum wait for a pooled connection."),
    FieldSpec::new("suspension", FieldKind::Boolean, "Whether the pool may be suspended."),
    FieldSpec::new("timeoutMillis", FieldKind::U64, "Pool operation timeout in milliseconds."),
];

pub(crate) const CONNECTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("url", FieldKind::String, "JDBC URL of the database.").required(),
    FieldSpec::new("driverClass", FieldKind::String, "Driver class name."),
    FieldSpec::new("user", FieldKind::String, "Database user."),
    FieldSpec::new("password", FieldKind::String, "Database password.").sensitive(),
    FieldSpec::new("dialect", FieldKind::String, "SQL dialect."),
    FieldSpec::new("ddlAuto", FieldKind::String, "Schema management mode."),
    FieldSpec::new("defaultCatalog", FieldKind::String, "Default catalog."),
    FieldSpec::new("defaultSchema", FieldKind::String, "Default schema."),
    FieldSpec::new("healthQuery", FieldKind::String, "Query used to check connection health."),
    FieldSpec::new("idleTimeout", FieldKind::Duration, "Idle connection timeout."),
    FieldSpec::new("dataSourceName", FieldKind::String, "Named data source to look up."),
    FieldSpec::new("leakThreshold", FieldKind::U64, "Connection leak threshold in milliseconds."),
    FieldSpec::new("batchSize", FieldKind::U32, "JDBC batch size."),
    FieldSpec::new("failFastTimeout", FieldKind::I64, "Pool fail-fast timeout."),
    FieldSpec::new("isolateInternalQueries", FieldKind::Boolean, "Isolate internal pool queries."),
    FieldSpec::new("autocommit", FieldKind::Boolean, "Auto-commit mode."),
    FieldSpec::new("pool", FieldKind::Object(POOL_FIELDS), "Connection pool bounds."),
];

/// Connection pool bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionPoolSettings {
    #[builder(default = DEFAULT_POOL_MIN_SIZE)]
    pub(crate) min_size: u32,

    #[builder(default = DEFAULT_POOL_MAX_SIZE)]
    pub(crate) max_size: u32,

    #[serde(with = "humantime_serde")]
    #[builder(default = DEFAULT_POOL_MAX_WAIT)]
    pub(crate) max_wait: Duration,

    #[builder(default)]
    pub(crate) suspension: bool,

    #[builder(default = DEFAULT_POOL_TIMEOUT_MILLIS)]
    pub(crate) timeout_millis: u64,
}

impl Default for ConnectionPoolSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConnectionPoolSettings {
    /// Returns the minimum pool size.
    #[must_use]
    pub fn min_size(&self) -> u32 {
        self.min_size
    }

    /// Returns the maximum pool size.
    #[must_use]
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Returns the maximum wait for a pooled connection.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Returns whether the pool may be suspended.
    #[must_use]
    pub fn suspension(&self) -> bool {
        self.suspension
    }

    /// Returns the pool operation timeout in milliseconds.
    #[must_use]
    pub fn timeout_millis(&self) -> u64 {
        self.timeout_millis
    }

    fn validate_into(&self, report: &mut ValidationReport) {
        if self.max_size == 0 {
            report.push("pool.maxSize", ViolationKind::OutOfRange, "must be at least 1");
        } else if self.min_size > self.max_size {
            report.push(
                "pool.minSize",
                ViolationKind::OutOfRange,
                format!("{} exceeds pool.maxSize {}", self.min_size, self.max_size),
            );
        }
    }
}

/// Generic relational connection settings: location, credentials and pool
/// sizing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct RelationalConnectionSettings {
    #[builder(into, default = DEFAULT_URL.to_owned())]
    pub(crate) url: String,

    #[builder(into, default = DEFAULT_DRIVER_CLASS.to_owned())]
    pub(crate) driver_class: String,

    #[builder(into, default = DEFAULT_USER.to_owned())]
    pub(crate) user: String,

    #[builder(into, default)]
    pub(crate) password: String,

    #[builder(into, default = DEFAULT_DIALECT.to_owned())]
    pub(crate) dialect: String,

    #[builder(into, default = DEFAULT_DDL_AUTO.to_owned())]
    pub(crate) ddl_auto: String,

    #[builder(into)]
    pub(crate) default_catalog: Option<String>,

    #[builder(into)]
    pub(crate) default_schema: Option<String>,

    #[builder(into, default)]
    pub(crate) health_query: String,

    #[serde(with = "humantime_serde")]
    #[builder(default = DEFAULT_IDLE_TIMEOUT)]
    pub(crate) idle_timeout: Duration,

    #[builder(into)]
    pub(crate) data_source_name: Option<String>,

    #[builder(default = DEFAULT_LEAK_THRESHOLD_MILLIS)]
    pub(crate) leak_threshold: u64,

    #[builder(default = DEFAULT_BATCH_SIZE)]
    pub(crate) batch_size: u32,

    #[builder(default = DEFAULT_FAIL_FAST_TIMEOUT)]
    pub(crate) fail_fast_timeout: i64,

    #[builder(default)]
    pub(crate) isolate_internal_queries: bool,

    #[builder(default)]
    pub(crate) autocommit: bool,

    #[builder(default)]
    pub(crate) pool: ConnectionPoolSettings,
}

impl Default for RelationalConnectionSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

// Hand-written so the password never reaches logs.
impl fmt::Debug for RelationalConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationalConnectionSettings")
            .field("url", &self.url)
            .field("driver_class", &self.driver_class)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("dialect", &self.dialect)
            .field("ddl_auto", &self.ddl_auto)
            .field("default_catalog", &self.default_catalog)
            .field("default_schema", &self.default_schema)
            .field("health_query", &self.health_query)
            .field("idle_timeout", &self.idle_timeout)
            .field("data_source_name", &self.data_source_name)
            .field("leak_threshold", &self.leak_threshold)
            .field("batch_size", &self.batch_size)
            .field("fail_fast_timeout", &self.fail_fast_timeout)
            .field("isolate_internal_queries", &self.isolate_internal_queries)
            .field("autocommit", &self.autocommit)
            .field("pool", &self.pool)
            .finish()
    }
}

impl RelationalConnectionSettings {
    /// Returns the JDBC URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the driver class name.
    #[must_use]
    pub fn driver_class(&self) -> &str {
        &self.driver_class
    }

    /// Returns the database user.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the database password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the SQL dialect.
    #[must_use]
    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Returns the schema management mode.
    #[must_use]
    pub fn ddl_auto(&self) -> &str {
        &self.ddl_auto
    }

    /// Returns the default catalog, if configured.
    #[must_use]
    pub fn default_catalog(&self) -> Option<&str> {
        self.default_catalog.as_deref()
    }

    /// Returns the default schema, if configured.
    #[must_use]
    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Returns the health check query (empty when unset).
    #[must_use]
    pub fn health_query(&self) -> &str {
        &self.health_query
    }

    /// Returns the idle connection timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Returns the named data source, if configured.
    #[must_use]
    pub fn data_source_name(&self) -> Option<&str> {
        self.data_source_name.as_deref()
    }

    /// Returns the connection leak threshold.
    #[must_use]
    pub fn leak_threshold(&self) -> Duration {
        Duration::from_millis(self.leak_threshold)
    }

    /// Returns the JDBC batch size.
    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Returns the pool fail-fast timeout.
    #[must_use]
    pub fn fail_fast_timeout(&self) -> i64 {
        self.fail_fast_timeout
    }

    /// Returns whether internal pool queries are isolated.
    #[must_use]
    pub fn isolate_internal_queries(&self) -> bool {
        self.isolate_internal_queries
    }

    /// Returns whether auto-commit is enabled.
    #[must_use]
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Returns the pool bounds.
    #[must_use]
    pub fn pool(&self) -> &ConnectionPoolSettings {
        &self.pool
    }

    /// Checks connection invariants, naming fields as they appear in the
    /// embedding record's document.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.url.trim().is_empty() {
            report.push("url", ViolationKind::Required, "must not be blank");
        }
        if self.driver_class.trim().is_empty() {
            report.push("driverClass", ViolationKind::Required, "must not be blank");
        }
        if self.batch_size == 0 {
            report.push("batchSize", ViolationKind::OutOfRange, "must be at least 1");
        }
        self.pool.validate_into(&mut report);

        report
    }
}
