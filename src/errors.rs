use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkforgeError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    StoreUnavailable(String),
    InvalidUrl(String),
    DuplicateCode(String),
    CodeSpaceExhausted(String),
    NotFound(String),
    Expired(String),
    UnknownLink(String),
    Validation(String),
    Serialization(String),
    DateParse(String),
}

impl LinkforgeError {
    pub fn code(&self) -> &'static str {
        match self {
            LinkforgeError::DatabaseConfig(_) => "E001",
            LinkforgeError::DatabaseConnection(_) => "E002",
            LinkforgeError::DatabaseOperation(_) => "E003",
            LinkforgeError::StoreUnavailable(_) => "E004",
            LinkforgeError::InvalidUrl(_) => "E005",
            LinkforgeError::DuplicateCode(_) => "E006",
            LinkforgeError::CodeSpaceExhausted(_) => "E007",
            LinkforgeError::NotFound(_) => "E008",
            LinkforgeError::Expired(_) => "E009",
            LinkforgeError::UnknownLink(_) => "E010",
            LinkforgeError::Validation(_) => "E011",
            LinkforgeError::Serialization(_) => "E012",
            LinkforgeError::DateParse(_) => "E013",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            LinkforgeError::DatabaseConfig(_) => "Database Configuration Error",
            LinkforgeError::DatabaseConnection(_) => "Database Connection Error",
            LinkforgeError::DatabaseOperation(_) => "Database Operation Error",
            LinkforgeError::StoreUnavailable(_) => "Store Unavailable",
            LinkforgeError::InvalidUrl(_) => "Invalid URL",
            LinkforgeError::DuplicateCode(_) => "Duplicate Short Code",
            LinkforgeError::CodeSpaceExhausted(_) => "Code Space Exhausted",
            LinkforgeError::NotFound(_) => "Resource Not Found",
            LinkforgeError::Expired(_) => "Link Expired",
            LinkforgeError::UnknownLink(_) => "Unknown Link",
            LinkforgeError::Validation(_) => "Validation Error",
            LinkforgeError::Serialization(_) => "Serialization Error",
            LinkforgeError::DateParse(_) => "Date Parse Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LinkforgeError::DatabaseConfig(msg) => msg,
            LinkforgeError::DatabaseConnection(msg) => msg,
            LinkforgeError::DatabaseOperation(msg) => msg,
            LinkforgeError::StoreUnavailable(msg) => msg,
            LinkforgeError::InvalidUrl(msg) => msg,
            LinkforgeError::DuplicateCode(msg) => msg,
            LinkforgeError::CodeSpaceExhausted(msg) => msg,
            LinkforgeError::NotFound(msg) => msg,
            LinkforgeError::Expired(msg) => msg,
            LinkforgeError::UnknownLink(msg) => msg,
            LinkforgeError::Validation(msg) => msg,
            LinkforgeError::Serialization(msg) => msg,
            LinkforgeError::DateParse(msg) => msg,
        }
    }

    /// True for the collision outcome the shortener retries on.
    pub fn is_duplicate_code(&self) -> bool {
        matches!(self, LinkforgeError::DuplicateCode(_))
    }

    /// True for resolution misses (absent or logically dead links).
    pub fn is_resolution_miss(&self) -> bool {
        matches!(
            self,
            LinkforgeError::NotFound(_) | LinkforgeError::Expired(_)
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkforgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkforgeError {}

impl LinkforgeError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::DatabaseOperation(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::StoreUnavailable(msg.into())
    }

    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::InvalidUrl(msg.into())
    }

    pub fn duplicate_code<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::DuplicateCode(msg.into())
    }

    pub fn code_space_exhausted<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::CodeSpaceExhausted(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::Expired(msg.into())
    }

    pub fn unknown_link<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::UnknownLink(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::Validation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        LinkforgeError::DateParse(msg.into())
    }
}

impl From<sea_orm::DbErr> for LinkforgeError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkforgeError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkforgeError {
    fn from(err: serde_json::Error) -> Self {
        LinkforgeError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LinkforgeError {
    fn from(err: chrono::ParseError) -> Self {
        LinkforgeError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkforgeError>;
