use serde::Deserialize;

use crate::error::OracleSinkError;

pub const DEFAULT_PORT: u16 = 1521;
pub const DEFAULT_POOL_MIN: u32 = 1;
pub const DEFAULT_POOL_MAX: u32 = 10;

/// Oracle connection options.
///
/// Exactly one of `service_name` and `sid` must be set.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct OracleOpts {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
    /// Extra EZConnect parameters, e.g. `connect_timeout=10`.
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default = "default_pool_min")]
    pub pool_min: u32,
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_pool_min() -> u32 {
    DEFAULT_POOL_MIN
}

fn default_pool_max() -> u32 {
    DEFAULT_POOL_MAX
}

/// How the target database is named in the connect string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseName<'a> {
    ServiceName(&'a str),
    Sid(&'a str),
}

impl OracleOpts {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: String::new(),
            service_name: None,
            sid: None,
            param: None,
            pool_min: DEFAULT_POOL_MIN,
            pool_max: DEFAULT_POOL_MAX,
        }
    }

    pub fn validate(&self) -> Result<(), OracleSinkError> {
        self.database_name()?;
        if self.pool_max == 0 || self.pool_min > self.pool_max {
            return Err(OracleSinkError::InvalidPoolSize {
                min: self.pool_min,
                max: self.pool_max,
            });
        }
        Ok(())
    }

    pub fn database_name(&self) -> Result<DatabaseName<'_>, OracleSinkError> {
        let service = self.service_name.as_deref().filter(|s| !s.is_empty());
        let sid = self.sid.as_deref().filter(|s| !s.is_empty());
        match (service, sid) {
            (Some(_), Some(_)) => Err(OracleSinkError::ServiceNameAndSid),
            (Some(service), None) => Ok(DatabaseName::ServiceName(service)),
            (None, Some(sid)) => Ok(DatabaseName::Sid(sid)),
            (None, None) => Err(OracleSinkError::MissingDatabaseName),
        }
    }

    /// Connect string for the driver.
    ///
    /// Service names use EZConnect (`//host:port/service?param`). A SID has
    /// no EZConnect form, so it is written as a connect descriptor and
    /// `param` is not applied.
    pub fn connect_string(&self) -> Result<String, OracleSinkError> {
        let param = self.param.as_deref().filter(|p| !p.is_empty());
        let connect = match self.database_name()? {
            DatabaseName::ServiceName(service) => match param {
                Some(param) => format!("//{}:{}/{service}?{param}", self.host, self.port),
                None => format!("//{}:{}/{service}", self.host, self.port),
            },
            DatabaseName::Sid(sid) => {
                if param.is_some() {
                    tracing::warn!("Connect parameters are ignored when connecting by SID");
                }
                format!(
                    "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={})(PORT={}))(CONNECT_DATA=(SID={sid})))",
                    self.host, self.port
                )
            }
        };
        Ok(connect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> OracleOpts {
        OracleOpts {
            password: "secret".to_string(),
            ..OracleOpts::new("db.local", "gravity")
        }
    }

    #[test]
    fn test_service_name_connect_string() {
        let opts = OracleOpts {
            service_name: Some("ORCLPDB1".to_string()),
            ..opts()
        };
        assert_eq!(opts.connect_string().unwrap(), "//db.local:1521/ORCLPDB1");

        let opts = OracleOpts {
            param: Some("connect_timeout=10".to_string()),
            ..opts
        };
        assert_eq!(
            opts.connect_string().unwrap(),
            "//db.local:1521/ORCLPDB1?connect_timeout=10"
        );
    }

    #[test]
    fn test_sid_connect_string() {
        let opts = OracleOpts {
            sid: Some("ORCL".to_string()),
            port: 1522,
            ..opts()
        };
        assert_eq!(
            opts.connect_string().unwrap(),
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=db.local)(PORT=1522))(CONNECT_DATA=(SID=ORCL)))"
        );
    }

    #[test]
    fn test_service_name_and_sid_are_exclusive() {
        let opts = OracleOpts {
            service_name: Some("ORCLPDB1".to_string()),
            sid: Some("ORCL".to_string()),
            ..opts()
        };
        assert!(matches!(
            opts.validate(),
            Err(OracleSinkError::ServiceNameAndSid)
        ));
    }

    #[test]
    fn test_database_name_required() {
        let opts = OracleOpts {
            service_name: Some(String::new()),
            ..opts()
        };
        assert!(matches!(
            opts.validate(),
            Err(OracleSinkError::MissingDatabaseName)
        ));
    }

    #[test]
    fn test_pool_bounds() {
        let opts = OracleOpts {
            sid: Some("ORCL".to_string()),
            pool_min: 4,
            pool_max: 2,
            ..opts()
        };
        assert!(matches!(
            opts.validate(),
            Err(OracleSinkError::InvalidPoolSize { min: 4, max: 2 })
        ));
    }
}
