/// Part names inside an OPC package.
///
/// A part name is an absolute, slash-separated path such as
/// `/word/document.xml`. The matching ZIP member name drops the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackURI {
    uri: String,
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

impl PackURI {
    /// Create a part name. Fails unless `uri` begins with a slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Resolve a relationship `Target` against the directory of its source.
    ///
    /// Absolute targets are taken as-is; `.` and `..` segments are collapsed.
    ///
    /// ```
    /// use texdocx::ooxml::opc::PackURI;
    ///
    /// let uri = PackURI::from_rel_ref("/", "word/document.xml").unwrap();
    /// assert_eq!(uri.as_str(), "/word/document.xml");
    /// let uri = PackURI::from_rel_ref("/word", "../customXml/item1.xml").unwrap();
    /// assert_eq!(uri.as_str(), "/customXml/item1.xml");
    /// ```
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else {
            format!("{}/{}", base_uri.trim_end_matches('/'), relative_ref)
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in joined.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    segments.pop();
                },
                _ => segments.push(segment),
            }
        }
        Self::new(format!("/{}", segments.join("/")))
    }

    /// Directory portion, e.g. `/word` for `/word/document.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Final path segment; empty for the package pseudo-partname.
    pub fn filename(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or("")
    }

    /// Extension without the period.
    pub fn ext(&self) -> &str {
        self.filename()
            .rsplit_once('.')
            .map_or("", |(_, ext)| ext)
    }

    /// ZIP member name of this part.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Part name of the relationships part belonging to this part.
    ///
    /// For example, "/word/_rels/document.xml.rels" for "/word/document.xml".
    pub fn rels_uri(&self) -> Result<PackURI, String> {
        let base = self.base_uri().trim_end_matches('/');
        Self::new(format!("{}/_rels/{}.rels", base, self.filename()))
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_leading_slash() {
        assert!(PackURI::new("/word/document.xml").is_ok());
        assert!(PackURI::new("word/document.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(uri.base_uri(), "/word");
        assert_eq!(uri.filename(), "document.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.membername(), "word/document.xml");

        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
        assert_eq!(root.membername(), "");
    }

    #[test]
    fn test_rels_uri() {
        let doc = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(doc.rels_uri().unwrap().as_str(), "/word/_rels/document.xml.rels");

        let pkg = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(pkg.rels_uri().unwrap().as_str(), "/_rels/.rels");
    }

    #[test]
    fn test_from_rel_ref() {
        assert_eq!(
            PackURI::from_rel_ref("/", "./word/document2.xml").unwrap().as_str(),
            "/word/document2.xml"
        );
        assert_eq!(
            PackURI::from_rel_ref("/word", "/word/document.xml").unwrap().as_str(),
            "/word/document.xml"
        );
        assert_eq!(PackURI::from_rel_ref("/word", "../../x.xml").unwrap().as_str(), "/x.xml");
    }
}
