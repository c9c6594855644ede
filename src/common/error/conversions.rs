//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::ooxml::error::OoxmlError;
use crate::ooxml::opc::error::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::IoError(e) => Error::Io(e),
            OpcError::ZipError(s) => Error::ZipError(s),
            OpcError::PartNotFound(s) => Error::ComponentNotFound(s),
            OpcError::InvalidPackUri(s) => Error::InvalidFormat(s),
            OpcError::XmlError(s) => Error::XmlError(s),
        }
    }
}

impl From<OoxmlError> for Error {
    fn from(err: OoxmlError) -> Self {
        match err {
            OoxmlError::Opc(e) => Error::from(e),
            OoxmlError::Xml(s) => Error::XmlError(s),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opc_part_not_found_maps_to_component() {
        let err: Error = OpcError::PartNotFound("/word/document.xml".to_string()).into();
        assert!(matches!(err, Error::ComponentNotFound(ref s) if s == "/word/document.xml"));
    }

    #[test]
    fn test_ooxml_wraps_opc() {
        let err: Error = OoxmlError::Opc(OpcError::ZipError("bad header".to_string())).into();
        assert!(matches!(err, Error::ZipError(_)));
        assert_eq!(err.to_string(), "ZIP error: bad header");
    }
}
