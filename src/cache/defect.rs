use std::fmt;

/// Reason a cached entry was rejected
///
/// Each class maps to a stable defect code that appears in every log line
/// emitted for the rejection, so operators can grep for a whole class at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectClass {
    /// The file is not valid JSON
    Syntax,
    /// The JSON root is not a mapping or sequence
    RootShape,
    /// The file is unreadable, blank, or shorter than a complete entry
    PartialWrite,
    /// The entry has no `payload`, or it is not a mapping or sequence
    MissingPayload,
    /// A field required by the payload's schema is absent
    MissingField,
    /// All fields are present but a value breaks a business rule
    SemanticViolation,
    /// The payload matches no shape its validator knows
    UnrecognizedShape,
}

impl DefectClass {
    /// Stable code used to tag log events
    pub fn code(self) -> &'static str {
        match self {
            DefectClass::Syntax => "DC-01",
            DefectClass::RootShape => "DC-02",
            DefectClass::PartialWrite | DefectClass::MissingPayload => "DC-03",
            DefectClass::MissingField | DefectClass::UnrecognizedShape => "DC-04",
            DefectClass::SemanticViolation => "DC-05",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DefectClass::Syntax => "syntax corruption",
            DefectClass::RootShape => "root invalid",
            DefectClass::PartialWrite => "partial write",
            DefectClass::MissingPayload => "payload missing or corrupted",
            DefectClass::MissingField => "schema missing field",
            DefectClass::SemanticViolation => "semantic violation",
            DefectClass::UnrecognizedShape => "unrecognized shape",
        }
    }
}

impl fmt::Display for DefectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
