//! HTTP method names as dispatch keys.

use core::convert::Infallible;
use core::str::FromStr;

/// Method an operation is registered under.
///
/// Parsing is case-insensitive; unknown methods are kept (lower-cased) as
/// [`Method::Extension`] so they can still be allowed or rejected by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Head,
    Options,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Extension(String),
}

impl Method {
    /// Methods every handler has a default operation for.
    pub const STANDARD: [Method; 7] = [
        Method::Head,
        Method::Options,
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        match lower.as_str() {
            "head" => Self::Head,
            "options" => Self::Options,
            "get" => Self::Get,
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            _ => Self::Extension(lower),
        }
    }

    /// Lower-case name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Head => "head",
            Self::Options => "options",
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Extension(name) => name,
        }
    }
}

impl FromStr for Method {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Upper-case wire spelling (`GET`, `POST`, ...).
impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}
