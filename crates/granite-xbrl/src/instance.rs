//! XBRL instance parsing.
//!
//! Handles both standalone instances and inline-XBRL documents; both produce
//! identical [`Fact`] records. Inline `sign` and `scale` attributes are
//! applied at parse time so stored values are already in base units, while
//! the raw reported string is preserved for audit.

use crate::concept::normalize_concept_id;
use crate::error::{ParseWarning, Result, XbrlError};
use crate::fact::{Context, DimensionMember, Fact, Unit};
use crate::period::ReportingPeriod;
use crate::xmlutil::{attr, local_name, qname};
use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::Event;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

/// Namespace prefixes that never carry facts.
const STRUCTURAL_PREFIXES: [&str; 8] =
    ["xbrli", "link", "xlink", "xbrldi", "xsi", "xs", "ix", "ixt"];

/// Parsed contexts, units, and facts of one instance document.
#[derive(Debug, Clone, Default)]
pub struct XbrlInstance {
    /// Contexts keyed by id
    pub contexts: HashMap<String, Context>,
    /// Units keyed by id
    pub units: HashMap<String, Unit>,
    /// Facts in document order
    pub facts: Vec<Fact>,
}

impl XbrlInstance {
    /// Every distinct reporting period in the instance.
    pub fn periods(&self) -> Vec<ReportingPeriod> {
        let unique: std::collections::HashSet<ReportingPeriod> =
            self.contexts.values().map(|c| c.period).collect();
        let mut periods: Vec<ReportingPeriod> = unique.into_iter().collect();
        periods.sort_by_key(|p| (p.end_date(), p.key()));
        periods
    }
}

/// In-progress context while its child elements stream past.
#[derive(Debug, Default)]
struct ContextBuilder {
    id: String,
    entity: String,
    scheme: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    instant: Option<NaiveDate>,
    segment: Vec<DimensionMember>,
    bad_date: Option<String>,
}

impl ContextBuilder {
    fn finish(self, warnings: &mut Vec<ParseWarning>) -> Option<Context> {
        if let Some(value) = self.bad_date {
            warn!(context = %self.id, value = %value, "dropping context with malformed date");
            warnings.push(ParseWarning::ContextInvalid {
                id: self.id,
                reason: format!("malformed date {value}"),
            });
            return None;
        }
        let period = match (self.instant, self.start, self.end) {
            (Some(date), _, _) => ReportingPeriod::Instant { date },
            (None, Some(start), Some(end)) => ReportingPeriod::Duration { start, end },
            _ => {
                warnings.push(ParseWarning::ContextInvalid {
                    id: self.id,
                    reason: "period has neither instant nor start/end".to_string(),
                });
                return None;
            }
        };
        Some(Context {
            id: self.id,
            entity: self.entity,
            scheme: self.scheme,
            period,
            segment: self.segment,
        })
    }
}

/// In-progress fact while its text content streams past.
#[derive(Debug)]
struct FactBuilder {
    concept: String,
    context_ref: String,
    unit_ref: Option<String>,
    decimals: Option<i32>,
    scale: i32,
    negate: bool,
    nil: bool,
    text: String,
    /// depth of nested markup inside inline facts
    depth: u32,
}

/// Which child of a unit's `divide` element we are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DivideSide {
    Numerator,
    Denominator,
}

/// Parse an instance document (standalone or inline XBRL).
///
/// # Errors
/// Fails with [`XbrlError::XmlParse`] on structurally invalid XML and
/// [`XbrlError::NoContexts`] when no context survives parsing. Per-fact and
/// per-context problems are recorded as warnings instead.
pub fn parse_instance(xml: &str, warnings: &mut Vec<ParseWarning>) -> Result<XbrlInstance> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut instance = XbrlInstance::default();

    let mut context: Option<ContextBuilder> = None;
    let mut fact: Option<FactBuilder> = None;
    let mut unit: Option<(String, Vec<String>, Option<DivideSide>, Vec<String>)> = None;
    let mut text_target: Option<&'static str> = None;
    let mut pending_dimension: Option<String> = None;

    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(XbrlError::XmlParse {
                    document: "instance",
                    message: e.to_string(),
                });
            }
        };
        let empty = matches!(&event, Event::Empty(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if let Some(f) = fact.as_mut() {
                    // markup nested inside an inline fact's text content
                    if !empty {
                        f.depth += 1;
                    }
                    continue;
                }
                match name.as_slice() {
                    b"context" => {
                        context = Some(ContextBuilder {
                            id: attr(e, "id").unwrap_or_default(),
                            ..ContextBuilder::default()
                        });
                    }
                    b"identifier" => {
                        if let Some(ctx) = context.as_mut() {
                            ctx.scheme = attr(e, "scheme").unwrap_or_default();
                            text_target = Some("identifier");
                        }
                    }
                    b"startDate" => text_target = context.as_ref().map(|_| "startDate"),
                    b"endDate" => text_target = context.as_ref().map(|_| "endDate"),
                    b"instant" => text_target = context.as_ref().map(|_| "instant"),
                    b"explicitMember" => {
                        if context.is_some() {
                            pending_dimension = attr(e, "dimension");
                            text_target = Some("explicitMember");
                        }
                    }
                    b"unit" => {
                        unit = Some((
                            attr(e, "id").unwrap_or_default(),
                            Vec::new(),
                            None,
                            Vec::new(),
                        ));
                    }
                    b"unitNumerator" => {
                        if let Some(u) = unit.as_mut() {
                            u.2 = Some(DivideSide::Numerator);
                        }
                    }
                    b"unitDenominator" => {
                        if let Some(u) = unit.as_mut() {
                            u.2 = Some(DivideSide::Denominator);
                        }
                    }
                    b"measure" => text_target = unit.as_ref().map(|_| "measure"),
                    b"nonFraction" | b"nonNumeric" => {
                        if let Some(name_attr) = attr(e, "name") {
                            let builder = FactBuilder {
                                concept: normalize_concept_id(&name_attr),
                                context_ref: attr(e, "contextRef").unwrap_or_default(),
                                unit_ref: attr(e, "unitRef"),
                                decimals: parse_decimals(attr(e, "decimals").as_deref()),
                                scale: attr(e, "scale")
                                    .and_then(|s| s.parse().ok())
                                    .unwrap_or(0),
                                negate: attr(e, "sign").is_some_and(|s| s == "-"),
                                nil: attr(e, "nil").is_some_and(|n| n == "true"),
                                text: String::new(),
                                depth: 0,
                            };
                            if empty {
                                finish_fact(builder, &mut instance, warnings);
                            } else {
                                fact = Some(builder);
                            }
                        }
                    }
                    _ => {
                        // a prefixed element with a contextRef is a
                        // standalone fact
                        let full = qname(e);
                        if let Some(context_ref) = attr(e, "contextRef")
                            && is_fact_element(&full)
                        {
                            let builder = FactBuilder {
                                concept: normalize_concept_id(&full),
                                context_ref,
                                unit_ref: attr(e, "unitRef"),
                                decimals: parse_decimals(attr(e, "decimals").as_deref()),
                                scale: 0,
                                negate: false,
                                nil: attr(e, "nil").is_some_and(|n| n == "true"),
                                text: String::new(),
                                depth: 0,
                            };
                            if empty {
                                finish_fact(builder, &mut instance, warnings);
                            } else {
                                fact = Some(builder);
                            }
                        }
                    }
                }
            }
            Event::Text(ref t) => {
                let Ok(text) = t.unescape() else { continue };
                if let Some(f) = fact.as_mut() {
                    f.text.push_str(&text);
                } else if let Some(target) = text_target {
                    match target {
                        "identifier" => {
                            if let Some(ctx) = context.as_mut() {
                                ctx.entity = text.trim().to_string();
                            }
                        }
                        "startDate" | "endDate" | "instant" => {
                            if let Some(ctx) = context.as_mut() {
                                match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
                                    Ok(date) => match target {
                                        "startDate" => ctx.start = Some(date),
                                        "endDate" => ctx.end = Some(date),
                                        _ => ctx.instant = Some(date),
                                    },
                                    Err(_) => ctx.bad_date = Some(text.trim().to_string()),
                                }
                            }
                        }
                        "explicitMember" => {
                            if let (Some(ctx), Some(axis)) =
                                (context.as_mut(), pending_dimension.take())
                            {
                                ctx.segment.push(DimensionMember {
                                    axis: normalize_concept_id(&axis),
                                    member: normalize_concept_id(text.trim()),
                                });
                            }
                        }
                        "measure" => {
                            if let Some((_, measures, side, denominators)) = unit.as_mut() {
                                let m = text.trim().to_string();
                                match side {
                                    Some(DivideSide::Denominator) => denominators.push(m),
                                    _ => measures.push(m),
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if let Some(f) = fact.as_mut() {
                    if f.depth > 0 {
                        f.depth -= 1;
                        continue;
                    }
                    let done = fact.take().expect("fact present");
                    finish_fact(done, &mut instance, warnings);
                    continue;
                }
                match name.as_slice() {
                    b"context" => {
                        if let Some(builder) = context.take()
                            && let Some(ctx) = builder.finish(warnings)
                        {
                            instance.contexts.insert(ctx.id.clone(), ctx);
                        }
                    }
                    b"unit" => {
                        if let Some((id, measures, _, denominators)) = unit.take() {
                            let measure = if denominators.is_empty() {
                                measures.join("*")
                            } else {
                                format!("{}/{}", measures.join("*"), denominators.join("*"))
                            };
                            instance.units.insert(id.clone(), Unit { id, measure });
                        }
                    }
                    b"unitNumerator" | b"unitDenominator" => {
                        if let Some(u) = unit.as_mut() {
                            u.2 = None;
                        }
                    }
                    _ => {}
                }
                text_target = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if instance.contexts.is_empty() {
        return Err(XbrlError::NoContexts);
    }

    // facts must resolve to a surviving context
    let contexts = &instance.contexts;
    instance.facts.retain(|f| {
        let known = contexts.contains_key(&f.context_ref);
        if !known {
            warnings.push(ParseWarning::FactParseError {
                concept: f.concept.clone(),
                reason: format!("unknown context {}", f.context_ref),
            });
        }
        known
    });

    Ok(instance)
}

/// Turn a completed fact builder into a stored [`Fact`].
fn finish_fact(
    builder: FactBuilder,
    instance: &mut XbrlInstance,
    warnings: &mut Vec<ParseWarning>,
) {
    let raw = builder.text.trim().to_string();
    let value = if builder.unit_ref.is_some() && !builder.nil {
        match parse_numeric(&raw, builder.scale, builder.negate) {
            Ok(v) => Some(v),
            Err(reason) => {
                warn!(concept = %builder.concept, raw = %raw, "skipping unparseable fact");
                warnings.push(ParseWarning::FactParseError {
                    concept: builder.concept,
                    reason,
                });
                return;
            }
        }
    } else {
        None
    };

    instance.facts.push(Fact {
        concept: builder.concept,
        context_ref: builder.context_ref,
        unit_ref: builder.unit_ref,
        raw,
        value,
        decimals: builder.decimals,
        footnotes: Vec::new(),
    });
}

/// Parse a reported numeric string, applying inline scale and sign.
fn parse_numeric(raw: &str, scale: i32, negate: bool) -> std::result::Result<Decimal, String> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '$').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err("empty value".to_string());
    }
    let mut value: Decimal = cleaned
        .parse()
        .map_err(|e| format!("invalid number {cleaned}: {e}"))?;
    if scale != 0 {
        let factor = Decimal::from(10i64.pow(scale.unsigned_abs()));
        if scale > 0 {
            value *= factor;
        } else {
            value /= factor;
        }
    }
    if negate {
        value = -value;
    }
    Ok(value)
}

/// The `decimals` attribute; `INF` and absent both mean "exact".
fn parse_decimals(attr: Option<&str>) -> Option<i32> {
    match attr {
        None | Some("INF") => None,
        Some(d) => d.parse().ok(),
    }
}

/// Whether a qualified element name can carry a fact.
fn is_fact_element(qname: &str) -> bool {
    match qname.split_once(':') {
        Some((prefix, _)) => !STRUCTURAL_PREFIXES.contains(&prefix),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
            xmlns:us-gaap="http://fasb.org/us-gaap/2024"
            xmlns:tsla="http://tesla.com/20241231">
  <xbrli:context id="FY2024">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0001318605</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2024-01-01</xbrli:startDate>
      <xbrli:endDate>2024-12-31</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:context id="I2024">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0001318605</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:instant>2024-12-31</xbrli:instant>
    </xbrli:period>
  </xbrli:context>
  <xbrli:context id="FY2024_Auto">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0001318605</xbrli:identifier>
      <xbrli:segment>
        <xbrldi:explicitMember dimension="srt:ProductOrServiceAxis">tsla:AutomotiveMember</xbrldi:explicitMember>
      </xbrli:segment>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2024-01-01</xbrli:startDate>
      <xbrli:endDate>2024-12-31</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <xbrli:unit id="usdPerShare">
    <xbrli:divide>
      <xbrli:unitNumerator><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unitNumerator>
      <xbrli:unitDenominator><xbrli:measure>xbrli:shares</xbrli:measure></xbrli:unitDenominator>
    </xbrli:divide>
  </xbrli:unit>
  <tsla:AutomotiveRevenue contextRef="FY2024" unitRef="usd" decimals="-6">21307000000</tsla:AutomotiveRevenue>
  <us-gaap:Assets contextRef="I2024" unitRef="usd" decimals="-3">122070000</us-gaap:Assets>
  <us-gaap:Revenues contextRef="FY2024_Auto" unitRef="usd" decimals="-6">21307000000</us-gaap:Revenues>
  <us-gaap:IncreaseDecreaseInInventories contextRef="FY2024" unitRef="usd" decimals="0">500</us-gaap:IncreaseDecreaseInInventories>
  <us-gaap:DocumentType contextRef="FY2024">10-K</us-gaap:DocumentType>
  <us-gaap:BadNumber contextRef="FY2024" unitRef="usd">not-a-number</us-gaap:BadNumber>
</xbrli:xbrl>"#;

    #[test]
    fn test_parse_contexts_units_facts() {
        let mut warnings = Vec::new();
        let instance = parse_instance(INSTANCE, &mut warnings).unwrap();

        assert_eq!(instance.contexts.len(), 3);
        assert_eq!(instance.units.len(), 2);

        let fy = &instance.contexts["FY2024"];
        assert_eq!(fy.entity, "0001318605");
        assert!(fy.is_consolidated());
        assert!(fy.period.is_duration());

        let seg = &instance.contexts["FY2024_Auto"];
        assert_eq!(seg.segment.len(), 1);
        assert_eq!(seg.segment[0].axis, "srt:ProductOrServiceAxis");
        assert_eq!(seg.segment[0].member, "tsla:AutomotiveMember");

        assert_eq!(instance.units["usdPerShare"].measure, "iso4217:USD/xbrli:shares");

        // the malformed fact is dropped with a warning
        assert_eq!(instance.facts.len(), 5);
        assert!(warnings.iter().any(|w| matches!(
            w,
            ParseWarning::FactParseError { concept, .. } if concept == "us-gaap:BadNumber"
        )));

        let rev = instance
            .facts
            .iter()
            .find(|f| f.concept == "tsla:AutomotiveRevenue")
            .unwrap();
        assert_eq!(rev.value, Some(dec!(21307000000)));
        assert_eq!(rev.decimals, Some(-6));
        assert_eq!(rev.raw, "21307000000");

        // non-numeric facts keep text with no value
        let doc_type = instance
            .facts
            .iter()
            .find(|f| f.concept == "us-gaap:DocumentType")
            .unwrap();
        assert_eq!(doc_type.raw, "10-K");
        assert!(doc_type.value.is_none());
    }

    #[test]
    fn test_negative_values_stay_negative() {
        let xml = INSTANCE.replace(">500<", ">-500<");
        let mut warnings = Vec::new();
        let instance = parse_instance(&xml, &mut warnings).unwrap();
        let inv = instance
            .facts
            .iter()
            .find(|f| f.concept == "us-gaap:IncreaseDecreaseInInventories")
            .unwrap();
        assert_eq!(inv.value, Some(dec!(-500)));
    }

    #[test]
    fn test_inline_facts_match_standalone() {
        let xml = r#"<?xml version="1.0"?>
<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:xbrli="http://www.xbrl.org/2003/instance">
  <body>
    <ix:header>
      <ix:resources>
        <xbrli:context id="FY2024">
          <xbrli:entity>
            <xbrli:identifier scheme="http://www.sec.gov/CIK">0001318605</xbrli:identifier>
          </xbrli:entity>
          <xbrli:period>
            <xbrli:startDate>2024-01-01</xbrli:startDate>
            <xbrli:endDate>2024-12-31</xbrli:endDate>
          </xbrli:period>
        </xbrli:context>
        <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
      </ix:resources>
    </ix:header>
    <p>Revenue was $<ix:nonFraction name="us-gaap:Revenues" contextRef="FY2024"
        unitRef="usd" decimals="-6" scale="6" format="ixt:num-dot-decimal">21,307</ix:nonFraction> million.</p>
    <p>Inventory change: <ix:nonFraction name="us-gaap:IncreaseDecreaseInInventories"
        contextRef="FY2024" unitRef="usd" decimals="0" sign="-">500</ix:nonFraction></p>
  </body>
</html>"#;
        let mut warnings = Vec::new();
        let instance = parse_instance(xml, &mut warnings).unwrap();
        assert_eq!(instance.facts.len(), 2);

        let rev = instance
            .facts
            .iter()
            .find(|f| f.concept == "us-gaap:Revenues")
            .unwrap();
        // scale 6 applied: 21,307 -> 21,307,000,000
        assert_eq!(rev.value, Some(dec!(21307000000)));
        assert_eq!(rev.raw, "21,307");

        let inv = instance
            .facts
            .iter()
            .find(|f| f.concept == "us-gaap:IncreaseDecreaseInInventories")
            .unwrap();
        // sign attribute negates the displayed text
        assert_eq!(inv.value, Some(dec!(-500)));
    }

    #[test]
    fn test_no_contexts_is_fatal() {
        let xml = r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"></xbrli:xbrl>"#;
        let mut warnings = Vec::new();
        let err = parse_instance(xml, &mut warnings).unwrap_err();
        assert!(matches!(err, XbrlError::NoContexts));
    }

    #[test]
    fn test_malformed_context_date_dropped() {
        let xml = INSTANCE.replace("2024-12-31</xbrli:instant>", "not-a-date</xbrli:instant>");
        let mut warnings = Vec::new();
        let instance = parse_instance(&xml, &mut warnings).unwrap();
        assert_eq!(instance.contexts.len(), 2);
        assert!(warnings.iter().any(|w| matches!(
            w,
            ParseWarning::ContextInvalid { id, .. } if id == "I2024"
        )));
        // the fact referencing the dropped context goes with it
        assert!(!instance.facts.iter().any(|f| f.concept == "us-gaap:Assets"));
    }
}
