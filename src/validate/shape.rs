use serde_json::{Map, Value};

/// Structural family of a section payload, sniffed from its content
///
/// Sniffing looks only at the root and, for sequences, at the first element.
/// Later elements are left to the per-item checks of each validator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SectionShape<'a> {
    /// Mapping carrying `site_title`
    HeaderSettings(&'a Map<String, Value>),
    /// Mapping carrying `brand_name`
    FooterSettings(&'a Map<String, Value>),
    /// Any other mapping
    Record(&'a Map<String, Value>),
    /// A sequence with no elements
    EmptyList,
    /// Sequence whose first element has a `label`
    LinkList(&'a [Value]),
    /// Sequence whose first element has a `platform`
    SocialList(&'a [Value]),
    /// Any other non-empty sequence
    RecordList(&'a [Value]),
    /// Strings, numbers, booleans and null
    Scalar,
}

impl<'a> SectionShape<'a> {
    pub fn sniff(payload: &'a Value) -> Self {
        match payload {
            Value::Object(map) => sniff_record(map),
            Value::Array(items) => sniff_list(items),
            _ => SectionShape::Scalar,
        }
    }

    /// The mapping behind any record-like shape
    pub fn as_record(&self) -> Option<&'a Map<String, Value>> {
        match *self {
            SectionShape::HeaderSettings(map)
            | SectionShape::FooterSettings(map)
            | SectionShape::Record(map) => Some(map),
            _ => None,
        }
    }

    /// The elements behind any list-like shape; empty for `EmptyList`
    pub fn as_list(&self) -> Option<&'a [Value]> {
        match *self {
            SectionShape::LinkList(items)
            | SectionShape::SocialList(items)
            | SectionShape::RecordList(items) => Some(items),
            SectionShape::EmptyList => Some(&[]),
            _ => None,
        }
    }
}

fn sniff_record(map: &Map<String, Value>) -> SectionShape<'_> {
    if map.contains_key("site_title") {
        SectionShape::HeaderSettings(map)
    } else if map.contains_key("brand_name") {
        SectionShape::FooterSettings(map)
    } else {
        SectionShape::Record(map)
    }
}

fn sniff_list(items: &[Value]) -> SectionShape<'_> {
    let Some(first) = items.first() else {
        return SectionShape::EmptyList;
    };
    if super::has_field(first, "label") {
        SectionShape::LinkList(items)
    } else if super::has_field(first, "platform") {
        SectionShape::SocialList(items)
    } else {
        SectionShape::RecordList(items)
    }
}
