use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub swagger: SwaggerConfig,
    pub operator: OperatorConfig,
    pub geocoding: GeocodingConfig,
    pub submission: SubmissionConfig,
    pub storage: StorageConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Credentials for the operator (status moderation) endpoints
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Nominatim geocoding configuration
///
/// Request spacing and timeouts are provider policy and live as constants
/// next to the client, not here.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    /// Interval of the backfill worker; zero disables it
    pub backfill_interval_secs: u64,
    pub backfill_batch_size: i64,
    pub max_attempts: i64,
}

/// Limits applied by the report submission pipeline
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub duplicate_window: Duration,
    pub max_reports_per_day: i64,
    pub max_photo_bytes: usize,
    pub geocode_retry_delay: Duration,
    pub session_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
}

/// Google Sheets mirror configuration
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub enabled: bool,
    pub credentials_path: String,
    pub spreadsheet_id: String,
    pub worksheet_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            operator: OperatorConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
            submission: SubmissionConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            sheets: SheetsConfig::from_env()?,
        })
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool, String> {
    match env::var(name) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(format!("{} must be true or false", name)),
        },
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // A single SQLite file serialises writers anyway, keep the pool small
    const DEFAULT_URL: &'static str = "sqlite://flood_system.db";
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Lapor Banjir API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Citizen flood reporting API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl OperatorConfig {
    pub fn from_env() -> Result<Self, String> {
        let username = env::var("OPERATOR_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("OPERATOR_PASSWORD").ok().filter(|s| !s.is_empty());

        Ok(Self { username, password })
    }

    /// Returns credentials in "username:password" format if operator routes are enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl GeocodingConfig {
    const DEFAULT_BASE_URL: &'static str = "https://nominatim.openstreetmap.org";
    const DEFAULT_USER_AGENT: &'static str =
        "LaporBanjir/1.0 (flood-report-system; contact: admin@laporbanjir.id)";
    const DEFAULT_BACKFILL_INTERVAL_SECS: u64 = 300;
    const DEFAULT_BACKFILL_BATCH_SIZE: i64 = 10;
    const DEFAULT_MAX_ATTEMPTS: i64 = 3;

    pub fn from_env() -> Result<Self, String> {
        let enabled = parse_bool("GEOCODING_ENABLED", true)?;

        let base_url = env::var("NOMINATIM_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let user_agent = env::var("NOMINATIM_USER_AGENT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_USER_AGENT.to_string());

        let backfill_interval_secs = env::var("GEOCODE_BACKFILL_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_BACKFILL_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "GEOCODE_BACKFILL_INTERVAL_SECS must be a valid number".to_string())?;

        let backfill_batch_size = env::var("GEOCODE_BACKFILL_BATCH_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_BACKFILL_BATCH_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "GEOCODE_BACKFILL_BATCH_SIZE must be a valid number".to_string())?;

        let max_attempts = env::var("GEOCODE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_ATTEMPTS.to_string())
            .parse::<i64>()
            .map_err(|_| "GEOCODE_MAX_ATTEMPTS must be a valid number".to_string())?;

        Ok(Self {
            enabled,
            base_url,
            user_agent,
            backfill_interval_secs,
            backfill_batch_size,
            max_attempts,
        })
    }
}

impl SubmissionConfig {
    const DEFAULT_DUPLICATE_WINDOW_SECS: u64 = 120;
    const DEFAULT_MAX_REPORTS_PER_DAY: i64 = 10;
    const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024; // 5MB
    const DEFAULT_GEOCODE_RETRY_DELAY_MS: u64 = 2000;
    const DEFAULT_SESSION_TTL_SECS: u64 = 86_400; // 1 day

    pub fn from_env() -> Result<Self, String> {
        let duplicate_window_secs = env::var("DUPLICATE_WINDOW_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_DUPLICATE_WINDOW_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DUPLICATE_WINDOW_SECS must be a valid number".to_string())?;

        let max_reports_per_day = env::var("MAX_REPORTS_PER_DAY")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REPORTS_PER_DAY.to_string())
            .parse::<i64>()
            .map_err(|_| "MAX_REPORTS_PER_DAY must be a valid number".to_string())?;

        let max_photo_bytes = env::var("MAX_PHOTO_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_PHOTO_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_PHOTO_BYTES must be a valid number".to_string())?;

        let geocode_retry_delay_ms = env::var("GEOCODE_RETRY_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_GEOCODE_RETRY_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "GEOCODE_RETRY_DELAY_MS must be a valid number".to_string())?;

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SESSION_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "SESSION_TTL_SECS must be a valid number".to_string())?;

        Ok(Self {
            duplicate_window: Duration::from_secs(duplicate_window_secs),
            max_reports_per_day,
            max_photo_bytes,
            geocode_retry_delay: Duration::from_millis(geocode_retry_delay_ms),
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            duplicate_window: Duration::from_secs(Self::DEFAULT_DUPLICATE_WINDOW_SECS),
            max_reports_per_day: Self::DEFAULT_MAX_REPORTS_PER_DAY,
            max_photo_bytes: Self::DEFAULT_MAX_PHOTO_BYTES,
            geocode_retry_delay: Duration::from_millis(Self::DEFAULT_GEOCODE_RETRY_DELAY_MS),
            session_ttl: Duration::from_secs(Self::DEFAULT_SESSION_TTL_SECS),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self { upload_dir })
    }
}

impl SheetsConfig {
    pub fn from_env() -> Result<Self, String> {
        let enabled = parse_bool("SHEETS_ENABLED", false)?;

        let credentials_path = env::var("GOOGLE_SHEETS_CREDENTIALS")
            .unwrap_or_else(|_| "credentials.json".to_string());

        let spreadsheet_id = env::var("SPREADSHEET_ID").unwrap_or_default();
        if enabled && spreadsheet_id.trim().is_empty() {
            return Err("SPREADSHEET_ID is required when SHEETS_ENABLED=true".to_string());
        }

        let worksheet_name =
            env::var("WORKSHEET_NAME").unwrap_or_else(|_| "flood_reports".to_string());

        Ok(Self {
            enabled,
            credentials_path,
            spreadsheet_id,
            worksheet_name,
        })
    }
}
