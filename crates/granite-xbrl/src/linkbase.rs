//! Linkbase parsing: label, presentation, calculation, and definition
//! networks.
//!
//! Each linkbase groups arcs into extended links keyed by a role URI. Arcs
//! connect locators, and locators point at schema concepts through href
//! fragments. Networks store concepts as [`ConceptRegistry`] arena indices,
//! so cyclic linkbase graphs never become cyclic object graphs.

use crate::concept::{ConceptRegistry, normalize_concept_id};
use crate::error::{ParseWarning, Result, XbrlError};
use crate::xmlutil::{attr, local_name};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Role of a label resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelRole {
    /// Default presentation label
    Standard,
    /// Short-form label
    Terse,
    /// Long-form label
    Verbose,
    /// Definition text for the concept
    Documentation,
    /// Label used on total rows
    Total,
    /// Label used where the value displays negated
    Negated,
    /// Label for period-start rows (equity rollforwards)
    PeriodStart,
    /// Label for period-end rows
    PeriodEnd,
    /// Any other label role, keyed by the URI suffix
    Other(String),
}

impl LabelRole {
    /// Map a label role URI to a [`LabelRole`].
    pub fn from_uri(uri: &str) -> Self {
        let suffix = uri.rsplit('/').next().unwrap_or(uri);
        match suffix {
            "label" => Self::Standard,
            "terseLabel" => Self::Terse,
            "verboseLabel" => Self::Verbose,
            "documentation" => Self::Documentation,
            "totalLabel" => Self::Total,
            "negatedLabel" | "negated" | "negatedTerseLabel" | "negatedTotalLabel" => Self::Negated,
            "periodStartLabel" => Self::PeriodStart,
            "periodEndLabel" => Self::PeriodEnd,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A single label resource attached to a concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Label role
    pub role: LabelRole,
    /// Language code (`en-US`)
    pub lang: String,
    /// Label text
    pub text: String,
}

/// All labels in a filing, keyed by concept arena index.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    by_concept: HashMap<usize, Vec<Label>>,
}

impl LabelSet {
    /// Labels for a concept.
    pub fn labels(&self, concept: usize) -> &[Label] {
        self.by_concept.get(&concept).map_or(&[], |v| v.as_slice())
    }

    /// Label text for a concept in a specific role.
    pub fn text(&self, concept: usize, role: &LabelRole) -> Option<&str> {
        self.labels(concept)
            .iter()
            .find(|l| &l.role == role)
            .map(|l| l.text.as_str())
    }

    /// The standard label for a concept.
    pub fn standard(&self, concept: usize) -> Option<&str> {
        self.text(concept, &LabelRole::Standard)
    }

    /// Documentation text for a concept.
    pub fn documentation(&self, concept: usize) -> Option<&str> {
        self.text(concept, &LabelRole::Documentation)
    }

    fn push(&mut self, concept: usize, label: Label) {
        self.by_concept.entry(concept).or_default().push(label);
    }
}

/// A parent→child arc in a presentation network.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationArc {
    /// Parent concept (arena index)
    pub parent: usize,
    /// Child concept (arena index)
    pub child: usize,
    /// XBRL `order` attribute
    pub order: f64,
    /// Preferred label role for rendering the child
    pub preferred_label: Option<LabelRole>,
}

/// A presentation network for one role URI.
#[derive(Debug, Clone)]
pub struct PresentationNetwork {
    /// Role URI grouping these arcs
    pub role: String,
    arcs: Vec<PresentationArc>,
    children: HashMap<usize, Vec<usize>>,
}

impl PresentationNetwork {
    fn new(role: String, arcs: Vec<PresentationArc>) -> Self {
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, arc) in arcs.iter().enumerate() {
            children.entry(arc.parent).or_default().push(idx);
        }
        for list in children.values_mut() {
            list.sort_by(|&a, &b| {
                arcs[a]
                    .order
                    .partial_cmp(&arcs[b].order)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
        }
        Self {
            role,
            arcs,
            children,
        }
    }

    /// Arcs from a parent, in `order` then insertion order.
    pub fn children_of(&self, parent: usize) -> Vec<&PresentationArc> {
        self.children
            .get(&parent)
            .map(|idxs| idxs.iter().map(|&i| &self.arcs[i]).collect())
            .unwrap_or_default()
    }

    /// Root concepts: sources that never appear as a target.
    pub fn roots(&self) -> Vec<usize> {
        let targets: HashSet<usize> = self.arcs.iter().map(|a| a.child).collect();
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        for arc in &self.arcs {
            if !targets.contains(&arc.parent) && seen.insert(arc.parent) {
                roots.push(arc.parent);
            }
        }
        roots
    }

    /// Every concept participating in this network.
    pub fn concepts(&self) -> HashSet<usize> {
        self.arcs
            .iter()
            .flat_map(|a| [a.parent, a.child])
            .collect()
    }

    /// All arcs in the network.
    pub fn arcs(&self) -> &[PresentationArc] {
        &self.arcs
    }
}

/// A parent→child arc in a calculation network, with a contribution weight.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationArc {
    /// Subtotal concept (arena index)
    pub parent: usize,
    /// Contributing concept (arena index)
    pub child: usize,
    /// XBRL `order` attribute
    pub order: f64,
    /// Contribution weight, typically ±1
    pub weight: f64,
}

/// A calculation network for one role URI.
#[derive(Debug, Clone)]
pub struct CalculationNetwork {
    /// Role URI grouping these arcs
    pub role: String,
    arcs: Vec<CalculationArc>,
}

impl CalculationNetwork {
    /// All arcs in the network.
    pub fn arcs(&self) -> &[CalculationArc] {
        &self.arcs
    }

    /// Arcs contributing to a subtotal, in `order` then insertion order.
    pub fn children_of(&self, parent: usize) -> Vec<&CalculationArc> {
        let mut arcs: Vec<(usize, &CalculationArc)> = self
            .arcs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.parent == parent)
            .collect();
        arcs.sort_by(|(ai, a), (bi, b)| {
            a.order
                .partial_cmp(&b.order)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ai.cmp(bi))
        });
        arcs.into_iter().map(|(_, a)| a).collect()
    }
}

/// Dimensional arc roles in a definition network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionArcrole {
    /// Primary item → hypercube (`all`)
    All,
    /// Primary item → excluded hypercube (`notAll`)
    NotAll,
    /// Hypercube → axis
    HypercubeDimension,
    /// Axis → domain
    DimensionDomain,
    /// Domain → member
    DomainMember,
    /// Axis → default member
    DimensionDefault,
    /// Anything else
    Other,
}

impl DefinitionArcrole {
    /// Map an arcrole URI to a [`DefinitionArcrole`].
    pub fn from_uri(uri: &str) -> Self {
        match uri.rsplit('/').next().unwrap_or(uri) {
            "all" => Self::All,
            "notAll" => Self::NotAll,
            "hypercube-dimension" => Self::HypercubeDimension,
            "dimension-domain" => Self::DimensionDomain,
            "domain-member" => Self::DomainMember,
            "dimension-default" => Self::DimensionDefault,
            _ => Self::Other,
        }
    }
}

/// An arc in a definition network.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionArc {
    /// Source concept (arena index)
    pub from: usize,
    /// Target concept (arena index)
    pub to: usize,
    /// XBRL `order` attribute
    pub order: f64,
    /// Dimensional arcrole
    pub arcrole: DefinitionArcrole,
}

/// A definition network for one role URI.
#[derive(Debug, Clone)]
pub struct DefinitionNetwork {
    /// Role URI grouping these arcs
    pub role: String,
    arcs: Vec<DefinitionArc>,
}

impl DefinitionNetwork {
    /// All arcs in the network.
    pub fn arcs(&self) -> &[DefinitionArc] {
        &self.arcs
    }

    /// Axis → default-member pairs declared in this network.
    pub fn dimension_defaults(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.arcs
            .iter()
            .filter(|a| a.arcrole == DefinitionArcrole::DimensionDefault)
            .map(|a| (a.from, a.to))
    }
}

/// The four relationship layers of a filing.
#[derive(Debug, Clone, Default)]
pub struct LinkbaseSet {
    /// Concept labels
    pub labels: LabelSet,
    /// Presentation networks, one per role
    pub presentation: Vec<PresentationNetwork>,
    /// Calculation networks, one per role
    pub calculation: Vec<CalculationNetwork>,
    /// Definition networks, one per role
    pub definition: Vec<DefinitionNetwork>,
}

impl LinkbaseSet {
    /// Presentation network for a role URI.
    pub fn presentation_for(&self, role: &str) -> Option<&PresentationNetwork> {
        self.presentation.iter().find(|n| n.role == role)
    }

    /// Calculation network for a role URI.
    pub fn calculation_for(&self, role: &str) -> Option<&CalculationNetwork> {
        self.calculation.iter().find(|n| n.role == role)
    }

    /// Axis → default-member pairs across all definition networks.
    pub fn dimension_defaults(&self) -> HashMap<usize, usize> {
        self.definition
            .iter()
            .flat_map(|n| n.dimension_defaults())
            .collect()
    }
}

// --- raw parsing ---------------------------------------------------------

/// An arc as it appears in the document, before locator resolution.
#[derive(Debug, Clone)]
struct RawArc {
    from: String,
    to: String,
    order: f64,
    priority: i32,
    prohibited: bool,
    weight: f64,
    preferred_label: Option<String>,
    arcrole: Option<String>,
}

/// One extended link: locators, arcs, and (for label links) resources.
#[derive(Debug, Default)]
struct RawLink {
    role: String,
    /// xlink:label → href fragment
    locators: HashMap<String, String>,
    arcs: Vec<RawArc>,
    /// xlink:label → label resources
    resources: HashMap<String, Vec<Label>>,
}

/// Which extended-link element a parse pass looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Label,
    Presentation,
    Calculation,
    Definition,
}

impl LinkKind {
    const fn link_element(self) -> &'static [u8] {
        match self {
            Self::Label => b"labelLink",
            Self::Presentation => b"presentationLink",
            Self::Calculation => b"calculationLink",
            Self::Definition => b"definitionLink",
        }
    }

    const fn arc_element(self) -> &'static [u8] {
        match self {
            Self::Label => b"labelArc",
            Self::Presentation => b"presentationArc",
            Self::Calculation => b"calculationArc",
            Self::Definition => b"definitionArc",
        }
    }

    const fn document(self) -> &'static str {
        match self {
            Self::Label => "label linkbase",
            Self::Presentation => "presentation linkbase",
            Self::Calculation => "calculation linkbase",
            Self::Definition => "definition linkbase",
        }
    }
}

fn parse_links(xml: &str, kind: LinkKind) -> Result<Vec<RawLink>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut links: Vec<RawLink> = Vec::new();
    let mut buf = Vec::new();

    // label-resource state: text content arrives between Start and End
    let mut pending_label: Option<(String, LabelRole, String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if name == kind.link_element() {
                    links.push(RawLink {
                        role: attr(e, "role").unwrap_or_default(),
                        ..RawLink::default()
                    });
                } else if let Some(link) = links.last_mut() {
                    if name == b"loc" {
                        let label = attr(e, "label").unwrap_or_default();
                        let href = attr(e, "href").unwrap_or_default();
                        let fragment = href.rsplit('#').next().unwrap_or("").to_string();
                        link.locators.insert(label, fragment);
                    } else if name == kind.arc_element() {
                        link.arcs.push(RawArc {
                            from: attr(e, "from").unwrap_or_default(),
                            to: attr(e, "to").unwrap_or_default(),
                            order: attr(e, "order")
                                .and_then(|o| o.parse().ok())
                                .unwrap_or(1.0),
                            priority: attr(e, "priority")
                                .and_then(|p| p.parse().ok())
                                .unwrap_or(0),
                            prohibited: attr(e, "use").is_some_and(|u| u == "prohibited"),
                            weight: attr(e, "weight")
                                .and_then(|w| w.parse().ok())
                                .unwrap_or(1.0),
                            preferred_label: attr(e, "preferredLabel"),
                            arcrole: attr(e, "arcrole"),
                        });
                    } else if name == b"label" && kind == LinkKind::Label {
                        let xlabel = attr(e, "label").unwrap_or_default();
                        let role = attr(e, "role")
                            .map(|r| LabelRole::from_uri(&r))
                            .unwrap_or(LabelRole::Standard);
                        let lang = attr(e, "lang").unwrap_or_else(|| "en-US".to_string());
                        pending_label = Some((xlabel, role, lang, String::new()));
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some((_, _, _, text)) = pending_label.as_mut()
                    && let Ok(unescaped) = t.unescape()
                {
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name().as_ref()) == b"label"
                    && let Some((xlabel, role, lang, text)) = pending_label.take()
                    && let Some(link) = links.last_mut()
                {
                    link.resources
                        .entry(xlabel)
                        .or_default()
                        .push(Label { role, lang, text });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XbrlError::XmlParse {
                    document: kind.document(),
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(links)
}

/// Resolve a locator label to a registry index, recording a dangling-arc
/// warning when the referenced concept is unknown.
fn resolve_locator(
    link: &RawLink,
    label: &str,
    other: &str,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Option<usize> {
    let Some(fragment) = link.locators.get(label) else {
        warn!(role = %link.role, locator = %label, "arc references undefined locator");
        warnings.push(ParseWarning::DanglingArc {
            role: link.role.clone(),
            from: label.to_string(),
            to: other.to_string(),
        });
        return None;
    };
    let idx = registry.index_of(&normalize_concept_id(fragment));
    if idx.is_none() {
        warn!(role = %link.role, concept = %fragment, "dropping arc to unknown concept");
        warnings.push(ParseWarning::DanglingArc {
            role: link.role.clone(),
            from: fragment.clone(),
            to: other.to_string(),
        });
    }
    idx
}

/// Apply XBRL priority/prohibition semantics within one network.
///
/// Arcs are grouped by (from, to); the highest-priority arc wins, and if the
/// winner is prohibited the whole group is dropped.
fn effective_arcs(mut arcs: Vec<(usize, usize, RawArc)>) -> Vec<(usize, usize, RawArc)> {
    let mut groups: HashMap<(usize, usize), Vec<(usize, usize, RawArc)>> = HashMap::new();
    for entry in arcs.drain(..) {
        groups.entry((entry.0, entry.1)).or_default().push(entry);
    }
    let mut result: Vec<(usize, usize, RawArc)> = Vec::new();
    for (_, mut group) in groups {
        group.sort_by_key(|(_, _, a)| std::cmp::Reverse(a.priority));
        let top_priority = group[0].2.priority;
        if group
            .iter()
            .any(|(_, _, a)| a.priority == top_priority && a.prohibited)
        {
            continue;
        }
        for entry in group {
            if !entry.2.prohibited {
                result.push(entry);
            }
        }
    }
    // deterministic order regardless of hash iteration
    result.sort_by(|a, b| {
        a.2.order
            .partial_cmp(&b.2.order)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });
    result
}

/// Drop arcs that close a cycle, warning at the repeated concept.
fn break_cycles(
    arcs: Vec<(usize, usize, RawArc)>,
    role: &str,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<(usize, usize, RawArc)> {
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, (from, _, _)) in arcs.iter().enumerate() {
        adjacency.entry(*from).or_default().push(idx);
    }

    let targets: HashSet<usize> = arcs.iter().map(|(_, to, _)| *to).collect();
    let mut starts: Vec<usize> = arcs
        .iter()
        .map(|(from, _, _)| *from)
        .filter(|f| !targets.contains(f))
        .collect();
    // cyclic components have no natural root; sweep every source so they
    // are still visited
    starts.extend(arcs.iter().map(|(from, _, _)| *from));

    let mut dropped: HashSet<usize> = HashSet::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut on_path: HashSet<usize> = HashSet::new();
    for start in starts {
        if !visited.contains(&start) {
            dfs_break(start, &arcs, &adjacency, &mut on_path, &mut visited, &mut dropped);
        }
        debug_assert!(on_path.is_empty());
    }

    for &arc_idx in &dropped {
        let (_, to, _) = &arcs[arc_idx];
        let concept = registry
            .by_index(*to)
            .map(|c| c.id.clone())
            .unwrap_or_else(|| to.to_string());
        warn!(role = %role, concept = %concept, "breaking linkbase cycle");
        warnings.push(ParseWarning::LinkbaseCycle {
            role: role.to_string(),
            concept,
        });
    }

    arcs.into_iter()
        .enumerate()
        .filter(|(idx, _)| !dropped.contains(idx))
        .map(|(_, arc)| arc)
        .collect()
}

fn dfs_break(
    node: usize,
    arcs: &[(usize, usize, RawArc)],
    adjacency: &HashMap<usize, Vec<usize>>,
    on_path: &mut HashSet<usize>,
    visited: &mut HashSet<usize>,
    dropped: &mut HashSet<usize>,
) {
    on_path.insert(node);
    if let Some(out) = adjacency.get(&node) {
        for &arc_idx in out {
            let (_, to, _) = &arcs[arc_idx];
            if on_path.contains(to) {
                // back edge: the target is already on the current path
                dropped.insert(arc_idx);
            } else if !visited.contains(to) {
                dfs_break(*to, arcs, adjacency, on_path, visited, dropped);
            }
        }
    }
    visited.insert(node);
    on_path.remove(&node);
}

fn resolve_network_arcs(
    link: &RawLink,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<(usize, usize, RawArc)> {
    let mut resolved = Vec::new();
    for arc in &link.arcs {
        let from = resolve_locator(link, &arc.from, &arc.to, registry, warnings);
        let to = resolve_locator(link, &arc.to, &arc.from, registry, warnings);
        if let (Some(from), Some(to)) = (from, to) {
            resolved.push((from, to, arc.clone()));
        }
    }
    effective_arcs(resolved)
}

/// Parse a label linkbase into a [`LabelSet`].
pub fn parse_label_linkbase(
    xml: &str,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Result<LabelSet> {
    let links = parse_links(xml, LinkKind::Label)?;
    let mut set = LabelSet::default();
    for link in &links {
        for arc in &link.arcs {
            let Some(concept) = resolve_locator(link, &arc.from, &arc.to, registry, warnings)
            else {
                continue;
            };
            if let Some(resources) = link.resources.get(&arc.to) {
                for label in resources {
                    set.push(concept, label.clone());
                }
            }
        }
    }
    Ok(set)
}

/// Parse a presentation linkbase into per-role networks.
pub fn parse_presentation_linkbase(
    xml: &str,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Vec<PresentationNetwork>> {
    let links = parse_links(xml, LinkKind::Presentation)?;
    let mut networks = Vec::new();
    for link in &links {
        let arcs = resolve_network_arcs(link, registry, warnings);
        let arcs = break_cycles(arcs, &link.role, registry, warnings);
        let arcs = arcs
            .into_iter()
            .map(|(parent, child, raw)| PresentationArc {
                parent,
                child,
                order: raw.order,
                preferred_label: raw.preferred_label.as_deref().map(LabelRole::from_uri),
            })
            .collect();
        networks.push(PresentationNetwork::new(link.role.clone(), arcs));
    }
    Ok(networks)
}

/// Parse a calculation linkbase into per-role networks.
pub fn parse_calculation_linkbase(
    xml: &str,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Vec<CalculationNetwork>> {
    let links = parse_links(xml, LinkKind::Calculation)?;
    let mut networks = Vec::new();
    for link in &links {
        let arcs = resolve_network_arcs(link, registry, warnings);
        let arcs = break_cycles(arcs, &link.role, registry, warnings);
        let arcs = arcs
            .into_iter()
            .map(|(parent, child, raw)| CalculationArc {
                parent,
                child,
                order: raw.order,
                weight: raw.weight,
            })
            .collect();
        networks.push(CalculationNetwork {
            role: link.role.clone(),
            arcs,
        });
    }
    Ok(networks)
}

/// Parse a definition linkbase into per-role networks.
pub fn parse_definition_linkbase(
    xml: &str,
    registry: &ConceptRegistry,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Vec<DefinitionNetwork>> {
    let links = parse_links(xml, LinkKind::Definition)?;
    let mut networks = Vec::new();
    for link in &links {
        let arcs = resolve_network_arcs(link, registry, warnings);
        let arcs = arcs
            .into_iter()
            .map(|(from, to, raw)| DefinitionArc {
                from,
                to,
                order: raw.order,
                arcrole: raw
                    .arcrole
                    .as_deref()
                    .map(DefinitionArcrole::from_uri)
                    .unwrap_or(DefinitionArcrole::Other),
            })
            .collect();
        networks.push(DefinitionNetwork {
            role: link.role.clone(),
            arcs,
        });
    }
    Ok(networks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{Concept, DataType, PeriodType};

    fn registry_with(ids: &[&str]) -> ConceptRegistry {
        let mut registry = ConceptRegistry::new();
        for id in ids {
            let id = normalize_concept_id(id);
            let (prefix, name) = id.split_once(':').unwrap();
            registry
                .insert(Concept {
                    id: id.clone(),
                    name: name.to_string(),
                    prefix: prefix.to_string(),
                    data_type: DataType::Monetary,
                    period_type: PeriodType::Duration,
                    balance: None,
                    is_abstract: false,
                })
                .unwrap();
        }
        registry
    }

    fn presentation_xml(arcs: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:presentationLink xlink:role="http://example.com/role/IncomeStatement">
    <link:loc xlink:label="loc_rev" xlink:href="s.xsd#us-gaap_Revenues"/>
    <link:loc xlink:label="loc_cost" xlink:href="s.xsd#us-gaap_CostOfRevenue"/>
    <link:loc xlink:label="loc_gp" xlink:href="s.xsd#us-gaap_GrossProfit"/>
    <link:loc xlink:label="loc_missing" xlink:href="s.xsd#abc_Missing"/>
    {arcs}
  </link:presentationLink>
</link:linkbase>"#
        )
    }

    #[test]
    fn test_presentation_parses_ordered_arcs() {
        let xml = presentation_xml(
            r#"<link:presentationArc xlink:from="loc_gp" xlink:to="loc_cost" order="2"/>
               <link:presentationArc xlink:from="loc_gp" xlink:to="loc_rev" order="1" preferredLabel="http://www.xbrl.org/2003/role/totalLabel"/>"#,
        );
        let registry = registry_with(&[
            "us-gaap:Revenues",
            "us-gaap:CostOfRevenue",
            "us-gaap:GrossProfit",
        ]);
        let mut warnings = Vec::new();
        let networks = parse_presentation_linkbase(&xml, &registry, &mut warnings).unwrap();
        assert_eq!(networks.len(), 1);

        let gp = registry.index_of("us-gaap:GrossProfit").unwrap();
        let children = networks[0].children_of(gp);
        assert_eq!(children.len(), 2);
        // order attribute, not document order
        assert_eq!(children[0].child, registry.index_of("us-gaap:Revenues").unwrap());
        assert_eq!(children[0].preferred_label, Some(LabelRole::Total));
        assert_eq!(children[1].child, registry.index_of("us-gaap:CostOfRevenue").unwrap());
        assert_eq!(networks[0].roots(), vec![gp]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_dangling_arc_dropped_with_warning() {
        let xml = presentation_xml(
            r#"<link:presentationArc xlink:from="loc_gp" xlink:to="loc_missing" order="1"/>"#,
        );
        let registry = registry_with(&["us-gaap:GrossProfit"]);
        let mut warnings = Vec::new();
        let networks = parse_presentation_linkbase(&xml, &registry, &mut warnings).unwrap();
        assert!(networks[0].arcs().is_empty());
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ParseWarning::DanglingArc { .. }))
        );
    }

    #[test]
    fn test_prohibited_arc_cancels_lower_priority() {
        let xml = presentation_xml(
            r#"<link:presentationArc xlink:from="loc_gp" xlink:to="loc_rev" order="1" priority="0"/>
               <link:presentationArc xlink:from="loc_gp" xlink:to="loc_rev" order="1" priority="1" use="prohibited"/>"#,
        );
        let registry = registry_with(&["us-gaap:Revenues", "us-gaap:GrossProfit"]);
        let mut warnings = Vec::new();
        let networks = parse_presentation_linkbase(&xml, &registry, &mut warnings).unwrap();
        assert!(networks[0].arcs().is_empty());
    }

    #[test]
    fn test_cycle_broken_at_repeat() {
        let xml = presentation_xml(
            r#"<link:presentationArc xlink:from="loc_gp" xlink:to="loc_rev" order="1"/>
               <link:presentationArc xlink:from="loc_rev" xlink:to="loc_cost" order="1"/>
               <link:presentationArc xlink:from="loc_cost" xlink:to="loc_gp" order="1"/>"#,
        );
        let registry = registry_with(&[
            "us-gaap:Revenues",
            "us-gaap:CostOfRevenue",
            "us-gaap:GrossProfit",
        ]);
        let mut warnings = Vec::new();
        let networks = parse_presentation_linkbase(&xml, &registry, &mut warnings).unwrap();
        assert_eq!(networks[0].arcs().len(), 2);
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ParseWarning::LinkbaseCycle { .. }))
        );
    }

    #[test]
    fn test_calculation_weights() {
        let xml = r#"<?xml version="1.0"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:calculationLink xlink:role="http://example.com/role/CashFlow">
    <link:loc xlink:label="loc_ocf" xlink:href="s.xsd#us-gaap_NetCashProvidedByUsedInOperatingActivities"/>
    <link:loc xlink:label="loc_inv" xlink:href="s.xsd#us-gaap_IncreaseDecreaseInInventories"/>
    <link:calculationArc xlink:from="loc_ocf" xlink:to="loc_inv" order="1" weight="-1.0"/>
  </link:calculationLink>
</link:linkbase>"#;
        let registry = registry_with(&[
            "us-gaap:NetCashProvidedByUsedInOperatingActivities",
            "us-gaap:IncreaseDecreaseInInventories",
        ]);
        let mut warnings = Vec::new();
        let networks = parse_calculation_linkbase(xml, &registry, &mut warnings).unwrap();
        assert_eq!(networks[0].arcs().len(), 1);
        assert_eq!(networks[0].arcs()[0].weight, -1.0);
    }

    #[test]
    fn test_label_linkbase_roles() {
        let xml = r#"<?xml version="1.0"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:labelLink xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:label="loc_rev" xlink:href="s.xsd#us-gaap_Revenues"/>
    <link:label xlink:label="lab_rev" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Revenues</link:label>
    <link:label xlink:label="lab_rev" xlink:role="http://www.xbrl.org/2003/role/terseLabel" xml:lang="en-US">Revenue</link:label>
    <link:labelArc xlink:from="loc_rev" xlink:to="lab_rev"/>
  </link:labelLink>
</link:linkbase>"#;
        let registry = registry_with(&["us-gaap:Revenues"]);
        let mut warnings = Vec::new();
        let labels = parse_label_linkbase(xml, &registry, &mut warnings).unwrap();
        let rev = registry.index_of("us-gaap:Revenues").unwrap();
        assert_eq!(labels.standard(rev), Some("Revenues"));
        assert_eq!(labels.text(rev, &LabelRole::Terse), Some("Revenue"));
        assert!(labels.documentation(rev).is_none());
    }

    #[test]
    fn test_definition_dimension_default() {
        let xml = r#"<?xml version="1.0"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:definitionLink xlink:role="http://example.com/role/Segments">
    <link:loc xlink:label="loc_axis" xlink:href="s.xsd#us-gaap_StatementBusinessSegmentsAxis"/>
    <link:loc xlink:label="loc_member" xlink:href="s.xsd#us-gaap_SegmentDomain"/>
    <link:definitionArc xlink:from="loc_axis" xlink:to="loc_member" order="1"
        xlink:arcrole="http://xbrl.org/int/dim/arcrole/dimension-default"/>
  </link:definitionLink>
</link:linkbase>"#;
        let registry = registry_with(&[
            "us-gaap:StatementBusinessSegmentsAxis",
            "us-gaap:SegmentDomain",
        ]);
        let mut warnings = Vec::new();
        let networks = parse_definition_linkbase(xml, &registry, &mut warnings).unwrap();
        let defaults: Vec<(usize, usize)> = networks[0].dimension_defaults().collect();
        assert_eq!(defaults.len(), 1);
    }
}
