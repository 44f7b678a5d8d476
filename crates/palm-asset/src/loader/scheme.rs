use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use base64::{engine::general_purpose::STANDARD, Engine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeError {
    Unsupported(String),
    BadDataUri,
}

impl Display for SchemeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemeError::Unsupported(uri) => write!(f, "Unsupported scheme in URI {}", uri),
            SchemeError::BadDataUri => write!(f, "Bad data URI"),
        }
    }
}

impl Error for SchemeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme<'a> {
    // Data uri with optional mime type
    Data(Option<&'a str>, Vec<u8>),
    // Path relative to the document
    Relative(&'a str),
    // Path after a file: prefix
    Absolute(&'a str),
}

fn strip_prefix_ignore_case<'a>(uri: &'a str, prefix: &str) -> Option<&'a str> {
    let head = uri.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        uri.get(prefix.len()..)
    } else {
        None
    }
}

impl<'a> TryFrom<&'a str> for Scheme<'a> {
    type Error = SchemeError;

    fn try_from(uri: &'a str) -> Result<Self, Self::Error> {
        if !uri.contains(':') {
            return Ok(Scheme::Relative(uri));
        }
        if let Some(content) = strip_prefix_ignore_case(uri, "data:") {
            // Data URI: rfc2397
            let Some((param, value)) = content.split_once(',') else {
                return Err(SchemeError::BadDataUri);
            };
            return match param.split_once(';') {
                Some((mime, encoding)) if encoding.eq_ignore_ascii_case("base64") => {
                    let data = STANDARD
                        .decode(value)
                        .map_err(|_| SchemeError::BadDataUri)?;
                    Ok(Scheme::Data((!mime.is_empty()).then_some(mime), data))
                }
                Some(_) => Err(SchemeError::BadDataUri),
                None => Ok(Scheme::Data(None, Vec::from(value.as_bytes()))),
            };
        }
        if let Some(path) = strip_prefix_ignore_case(uri, "file://") {
            return Ok(Scheme::Absolute(path));
        }
        if let Some(path) = strip_prefix_ignore_case(uri, "file:") {
            return Ok(Scheme::Absolute(path));
        }
        Err(SchemeError::Unsupported(uri.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(
            Scheme::try_from("palmier.bin"),
            Ok(Scheme::Relative("palmier.bin"))
        );
    }

    #[test]
    fn test_base64_data_uri() {
        assert_eq!(
            Scheme::try_from("data:application/octet-stream;base64,AAEC"),
            Ok(Scheme::Data(
                Some("application/octet-stream"),
                vec![0, 1, 2]
            ))
        );
    }

    #[test]
    fn test_remote_uri_is_unsupported() {
        assert!(matches!(
            Scheme::try_from("https://example.com/palmier.bin"),
            Err(SchemeError::Unsupported(_))
        ));
        assert_eq!(Scheme::try_from("da:"), Err(SchemeError::Unsupported("da:".to_string())));
    }
}
