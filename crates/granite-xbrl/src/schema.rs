//! Taxonomy schema loading.
//!
//! Reads XSD element declarations into the [`ConceptRegistry`] and collects
//! `roleType` definitions so the statement resolver can see each role's
//! human-readable description.

use crate::concept::{Balance, Concept, ConceptRegistry, DataType, PeriodType, normalize_concept_id};
use crate::error::{ParseWarning, Result, XbrlError};
use crate::xmlutil::{attr, local_name};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use tracing::warn;

/// Role definitions extracted from the schema, keyed by role URI.
pub type RoleDefinitions = HashMap<String, String>;

/// Parse a taxonomy schema, registering every element declaration.
///
/// Returns the role definitions declared via `link:roleType`. Element
/// declarations without an `id` attribute are skipped with a warning;
/// duplicate declarations are a fatal [`XbrlError::SchemaConflict`].
pub fn parse_schema(
    xml: &str,
    registry: &mut ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Result<RoleDefinitions> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut roles = RoleDefinitions::new();
    let mut buf = Vec::new();

    // roleType state: the definition text arrives as a child element
    let mut current_role: Option<String> = None;
    let mut in_definition = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"element" => {
                        if let Some(concept) = element_to_concept(e, warnings) {
                            registry.insert(concept)?;
                        }
                    }
                    b"roleType" => {
                        current_role = attr(e, "roleURI");
                    }
                    b"definition" => {
                        in_definition = current_role.is_some();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) => {
                if in_definition
                    && let Some(role) = &current_role
                    && let Ok(text) = t.unescape()
                {
                    roles.insert(role.clone(), text.trim().to_string());
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"definition" => in_definition = false,
                b"roleType" => current_role = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::XmlParse {
                    document: "schema",
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(roles)
}

/// Convert an `xs:element` declaration into a concept, or skip it.
fn element_to_concept(
    e: &quick_xml::events::BytesStart<'_>,
    warnings: &mut Vec<ParseWarning>,
) -> Option<Concept> {
    let name = attr(e, "name")?;
    let Some(raw_id) = attr(e, "id") else {
        warn!(element = %name, "schema element has no id attribute");
        warnings.push(ParseWarning::ElementSkipped {
            reason: format!("element {name} has no id attribute"),
        });
        return None;
    };

    let id = normalize_concept_id(&raw_id);
    let prefix = id.split_once(':').map(|(p, _)| p).unwrap_or("").to_string();

    let data_type = attr(e, "type")
        .map(|t| DataType::from_xsd(&t))
        .unwrap_or(DataType::Other(String::new()));
    let period_type = attr(e, "periodType")
        .and_then(|p| PeriodType::from_attr(&p))
        .unwrap_or(PeriodType::Duration);
    let balance = attr(e, "balance").and_then(|b| Balance::from_attr(&b));
    let is_abstract = attr(e, "abstract").is_some_and(|a| a == "true");

    Some(Concept {
        id,
        name,
        prefix,
        data_type,
        period_type,
        balance,
        is_abstract,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:xbrli="http://www.xbrl.org/2003/instance"
           xmlns:link="http://www.xbrl.org/2003/linkbase"
           targetNamespace="http://tesla.com/20241231">
  <xs:element id="tsla_AutomotiveRevenue" name="AutomotiveRevenue"
              type="xbrli:monetaryItemType" substitutionGroup="xbrli:item"
              nillable="true" xbrli:periodType="duration" xbrli:balance="credit"/>
  <xs:element id="us-gaap_Assets" name="Assets"
              type="xbrli:monetaryItemType" substitutionGroup="xbrli:item"
              xbrli:periodType="instant" xbrli:balance="debit"/>
  <xs:element id="us-gaap_AssetsAbstract" name="AssetsAbstract"
              type="xbrli:stringItemType" substitutionGroup="xbrli:item"
              abstract="true" xbrli:periodType="duration"/>
  <link:roleType roleURI="http://tesla.com/role/IncomeStatement" id="IncomeStatement">
    <link:definition>00200 - Statement - Consolidated Statements of Operations</link:definition>
    <link:usedOn>link:presentationLink</link:usedOn>
  </link:roleType>
</xs:schema>"#;

    #[test]
    fn test_parse_schema_registers_concepts() {
        let mut registry = ConceptRegistry::new();
        let mut warnings = Vec::new();
        let roles = parse_schema(SCHEMA, &mut registry, &mut warnings).unwrap();

        assert_eq!(registry.len(), 3);
        let rev = registry.get("tsla:AutomotiveRevenue").unwrap();
        assert_eq!(rev.name, "AutomotiveRevenue");
        assert_eq!(rev.data_type, DataType::Monetary);
        assert_eq!(rev.period_type, PeriodType::Duration);
        assert_eq!(rev.balance, Some(Balance::Credit));
        assert!(!rev.is_abstract);

        let assets = registry.get("us-gaap:Assets").unwrap();
        assert_eq!(assets.period_type, PeriodType::Instant);
        assert_eq!(assets.balance, Some(Balance::Debit));

        assert!(registry.get("us-gaap:AssetsAbstract").unwrap().is_abstract);

        assert_eq!(
            roles.get("http://tesla.com/role/IncomeStatement").unwrap(),
            "00200 - Statement - Consolidated Statements of Operations"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_duplicate_declaration_is_fatal() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element id="us-gaap_Assets" name="Assets" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_Assets" name="Assets" xbrli:periodType="instant"/>
</xs:schema>"#;
        let mut registry = ConceptRegistry::new();
        let mut warnings = Vec::new();
        let err = parse_schema(xml, &mut registry, &mut warnings).unwrap_err();
        assert!(matches!(err, XbrlError::SchemaConflict { .. }));
    }

    #[test]
    fn test_element_without_id_is_skipped_with_warning() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Orphan" xbrli:periodType="duration"/>
</xs:schema>"#;
        let mut registry = ConceptRegistry::new();
        let mut warnings = Vec::new();
        parse_schema(xml, &mut registry, &mut warnings).unwrap();
        assert!(registry.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], ParseWarning::ElementSkipped { .. }));
    }
}
