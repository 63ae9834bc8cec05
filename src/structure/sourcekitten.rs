//! Loading structure trees produced by `sourcekitten structure`

use super::{DeclarationKind, ParseError, StructureNode};
use crate::text::ByteRange;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawStructure {
    #[serde(rename = "key.kind")]
    kind: Option<String>,
    #[serde(rename = "key.offset")]
    offset: Option<i64>,
    #[serde(rename = "key.length")]
    length: Option<i64>,
    #[serde(rename = "key.bodylength")]
    body_length: Option<i64>,
    #[serde(rename = "key.setter_accessibility")]
    setter_accessibility: Option<String>,
    #[serde(rename = "key.substructure", default)]
    substructure: Vec<RawStructure>,
}

impl RawStructure {
    fn into_node(self) -> StructureNode {
        let kind = self
            .kind
            .as_deref()
            .and_then(DeclarationKind::from_identifier);

        let byte_range = match (self.offset, self.length) {
            (Some(offset), Some(length)) if offset >= 0 && length >= 0 => {
                Some(ByteRange::new(offset as usize, length as usize))
            }
            _ => None,
        };

        let mut node = StructureNode::new(kind, byte_range);
        if let Some(body_length) = self.body_length.filter(|l| *l >= 0) {
            node = node.with_body_length(body_length as usize);
        }
        if let Some(accessibility) = self.setter_accessibility {
            node = node.with_setter_accessibility(accessibility);
        }

        node.with_children(
            self.substructure
                .into_iter()
                .map(RawStructure::into_node)
                .collect(),
        )
    }
}

/// Parse the JSON dictionary printed by `sourcekitten structure`
pub fn parse_structure(json: &str) -> Result<StructureNode, ParseError> {
    let raw: RawStructure =
        serde_json::from_str(json).map_err(|e| ParseError::InvalidStructure(e.to_string()))?;
    Ok(raw.into_node())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURE: &str = r#"{
  "key.diagnostic_stage" : "source.diagnostic.stage.swift.parse",
  "key.length" : 31,
  "key.offset" : 0,
  "key.substructure" : [
    {
      "key.accessibility" : "source.lang.swift.accessibility.internal",
      "key.bodylength" : 18,
      "key.bodyoffset" : 12,
      "key.kind" : "source.lang.swift.decl.struct",
      "key.length" : 31,
      "key.name" : "Foo",
      "key.offset" : 0,
      "key.substructure" : [
        {
          "key.kind" : "source.lang.swift.decl.var.instance",
          "key.length" : 12,
          "key.name" : "bar",
          "key.offset" : 17,
          "key.typename" : "Int"
        },
        {
          "key.kind" : "source.lang.swift.expr.call",
          "key.offset" : 30
        }
      ]
    }
  ]
}"#;

    #[test]
    fn test_parse_structure() {
        let root = parse_structure(STRUCTURE).unwrap();
        assert_eq!(root.kind(), None);
        assert_eq!(root.byte_range(), Some(ByteRange::new(0, 31)));

        let foo = &root.children()[0];
        assert_eq!(foo.kind(), Some(DeclarationKind::Struct));
        assert_eq!(foo.body_length(), Some(18));

        let bar = &foo.children()[0];
        assert_eq!(bar.kind(), Some(DeclarationKind::VarInstance));
        assert_eq!(bar.byte_range(), Some(ByteRange::new(17, 12)));
        assert_eq!(bar.body_length(), None);
    }

    #[test]
    fn test_unknown_kind_and_missing_range() {
        let root = parse_structure(STRUCTURE).unwrap();
        let call = &root.children()[0].children()[1];
        assert_eq!(call.kind(), None);
        assert_eq!(call.byte_range(), None);
    }

    #[test]
    fn test_setter_accessibility() {
        let json = r#"{"key.substructure": [{"key.kind": "source.lang.swift.decl.var.instance",
            "key.offset": 4, "key.length": 12,
            "key.setter_accessibility": "source.lang.swift.accessibility.private"}]}"#;
        let root = parse_structure(json).unwrap();
        assert_eq!(
            root.children()[0].setter_accessibility(),
            Some("source.lang.swift.accessibility.private")
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_structure("{not json"),
            Err(ParseError::InvalidStructure(_))
        ));
    }
}
