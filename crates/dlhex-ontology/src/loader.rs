//! N-Triples オントロジーローダー

use crate::model::{Assertion, Ontology, TBoxAxiom};
use crate::OntologyError;
use dlhex_core::Symbol;
use oxrdf::Term;
use oxttl::NTriplesParser;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};

pub mod vocabulary {
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
    pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
    pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    pub const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
    pub const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
    pub const OWL_DISJOINT_WITH: &str = "http://www.w3.org/2002/07/owl#disjointWith";
    pub const OWL_EQUIVALENT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#equivalentProperty";
    pub const OWL_PROPERTY_DISJOINT_WITH: &str =
        "http://www.w3.org/2002/07/owl#propertyDisjointWith";
    pub const OWL_COMPLEMENT_OF: &str = "http://www.w3.org/2002/07/owl#complementOf";
    pub const OWL_NEGATIVE_PROPERTY_ASSERTION: &str =
        "http://www.w3.org/2002/07/owl#NegativePropertyAssertion";
    pub const OWL_SOURCE_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#sourceIndividual";
    pub const OWL_ASSERTION_PROPERTY: &str = "http://www.w3.org/2002/07/owl#assertionProperty";
    pub const OWL_TARGET_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#targetIndividual";
}

use vocabulary::*;

/// Ontology loader trait
pub trait OntologyLoader {
    /// Load the ontology identified by `name`
    fn load(&self, name: &str) -> Result<Ontology, OntologyError>;
}

/// Loads N-Triples files relative to a base directory
#[derive(Debug, Clone, Default)]
pub struct FileOntologyLoader {
    pub base_dir: PathBuf,
}

impl FileOntologyLoader {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl OntologyLoader for FileOntologyLoader {
    fn load(&self, name: &str) -> Result<Ontology, OntologyError> {
        let path = self.base_dir.join(name);
        let text = std::fs::read_to_string(&path).map_err(|source| OntologyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ontology = parse_ntriples(name, &text)?;
        info!(
            "Loaded ontology {} ({} concepts, {} roles, {} individuals, {} assertions)",
            name,
            ontology.concepts.len(),
            ontology.roles.len(),
            ontology.individuals.len(),
            ontology.abox.len()
        );
        Ok(ontology)
    }
}

/// Serves ontologies registered in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryOntologyLoader {
    ontologies: HashMap<String, Ontology>,
}

impl MemoryOntologyLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ontology: Ontology) {
        self.ontologies.insert(ontology.name.to_string(), ontology);
    }

    pub fn with(mut self, ontology: Ontology) -> Self {
        self.insert(ontology);
        self
    }
}

impl OntologyLoader for MemoryOntologyLoader {
    fn load(&self, name: &str) -> Result<Ontology, OntologyError> {
        self.ontologies
            .get(name)
            .cloned()
            .ok_or_else(|| OntologyError::NotFound(name.to_string()))
    }
}

/// RDF term of a parsed triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Node {
    Iri(String),
    Blank(String),
    Literal,
}

impl Node {
    fn iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl From<Term> for Node {
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => Node::Iri(node.into_string()),
            Term::BlankNode(node) => Node::Blank(node.into_string()),
            // literals and quoted triples never name OWL entities
            #[allow(unreachable_patterns)]
            _ => Node::Literal,
        }
    }
}

type Triple = (Node, Node, Node);

/// Syntax-checked triples of an N-Triples document
fn read_triples(text: &str) -> Result<Vec<Triple>, OntologyError> {
    NTriplesParser::new()
        .for_slice(text)
        .map(|result| {
            let triple = result.map_err(|e| OntologyError::Parse {
                line: usize::try_from(e.location().start.line).map_or(usize::MAX, |l| l + 1),
                message: e.message().to_string(),
            })?;
            Ok((
                Node::from(Term::from(triple.subject)),
                Node::Iri(triple.predicate.into_string()),
                Node::from(triple.object),
            ))
        })
        .collect()
}

/// Local name of an IRI: text after the last `#` or `/`
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(|c: char| c == '#' || c == '/').next().unwrap_or(iri)
}

/// Parse an N-Triples document into an [`Ontology`] named `name`.
///
/// Declarations are collected in a first pass so that assertions can be
/// told apart from axioms regardless of triple order.
pub fn parse_ntriples(name: &str, text: &str) -> Result<Ontology, OntologyError> {
    let triples = read_triples(text)?;
    debug!("Read {} triples for {}", triples.len(), name);

    let mut ontology = Ontology::new(name);
    let mut properties = BTreeSet::new();
    // blank node -> (predicate, object)
    let mut blanks: BTreeMap<String, Vec<(String, Node)>> = BTreeMap::new();

    // 1st pass: declarations and blank node descriptions
    for (s, p, o) in &triples {
        if let Node::Blank(b) = s {
            if let Some(p) = p.iri() {
                blanks.entry(b.clone()).or_default().push((p.to_string(), o.clone()));
            }
        }
        let (Some(s), Some(p), Some(o)) = (s.iri(), p.iri(), o.iri()) else {
            continue;
        };
        if p != RDF_TYPE {
            continue;
        }
        match o {
            OWL_ONTOLOGY => ontology.namespace = s.to_string(),
            OWL_CLASS => {
                ontology.add_axiom(TBoxAxiom::DeclareClass(Symbol::new(local_name(s))));
            }
            OWL_OBJECT_PROPERTY => {
                properties.insert(s.to_string());
                ontology.add_axiom(TBoxAxiom::DeclareRole(Symbol::new(local_name(s))));
            }
            OWL_NAMED_INDIVIDUAL => {
                ontology.individuals.insert(Symbol::new(local_name(s)));
            }
            _ => {}
        }
    }

    let blank_value = |blank: &str, predicate: &str| -> Option<String> {
        blanks.get(blank).and_then(|entries| {
            entries
                .iter()
                .find(|(p, _)| p == predicate)
                .and_then(|(_, o)| o.iri().map(str::to_string))
        })
    };

    // 2nd pass: axioms and assertions
    for (s, p, o) in &triples {
        let Some(p) = p.iri() else { continue };
        match (s, o) {
            (Node::Iri(s), Node::Iri(o)) => {
                let (a, b) = (Symbol::new(local_name(s)), Symbol::new(local_name(o)));
                match p {
                    RDFS_SUBCLASS_OF => ontology.add_axiom(TBoxAxiom::SubClassOf(a, b)),
                    OWL_EQUIVALENT_CLASS => {
                        ontology.add_axiom(TBoxAxiom::SubClassOf(a.clone(), b.clone()));
                        ontology.add_axiom(TBoxAxiom::SubClassOf(b, a));
                    }
                    OWL_DISJOINT_WITH => ontology.add_axiom(TBoxAxiom::DisjointClasses(a, b)),
                    RDFS_SUBPROPERTY_OF => ontology.add_axiom(TBoxAxiom::SubPropertyOf(a, b)),
                    OWL_EQUIVALENT_PROPERTY => {
                        ontology.add_axiom(TBoxAxiom::SubPropertyOf(a.clone(), b.clone()));
                        ontology.add_axiom(TBoxAxiom::SubPropertyOf(b, a));
                    }
                    OWL_PROPERTY_DISJOINT_WITH => {
                        ontology.add_axiom(TBoxAxiom::DisjointProperties(a, b))
                    }
                    RDFS_DOMAIN => ontology.add_axiom(TBoxAxiom::Domain { role: a, concept: b }),
                    RDF_TYPE if !o.starts_with(OWL) => {
                        ontology.add_assertion(Assertion::concept(b, a, false));
                    }
                    _ if properties.contains(p) => {
                        ontology.add_assertion(Assertion::role(local_name(p), a, b, false));
                    }
                    _ => debug!("Ignoring triple <{}> <{}> <{}>", s, p, o),
                }
            }
            (Node::Iri(s), Node::Blank(b)) if p == RDF_TYPE => {
                match blank_value(b, OWL_COMPLEMENT_OF) {
                    Some(class) => ontology.add_assertion(Assertion::concept(
                        local_name(&class),
                        local_name(s),
                        true,
                    )),
                    None => debug!("Ignoring anonymous type _:{} of <{}>", b, s),
                }
            }
            (Node::Blank(b), Node::Iri(o)) if p == RDF_TYPE && o == OWL_NEGATIVE_PROPERTY_ASSERTION => {
                let source = blank_value(b, OWL_SOURCE_INDIVIDUAL);
                let property = blank_value(b, OWL_ASSERTION_PROPERTY);
                let target = blank_value(b, OWL_TARGET_INDIVIDUAL);
                match (source, property, target) {
                    (Some(x), Some(r), Some(y)) => ontology.add_assertion(Assertion::role(
                        local_name(&r),
                        local_name(&x),
                        local_name(&y),
                        true,
                    )),
                    _ => {
                        return Err(OntologyError::Malformed(format!(
                            "incomplete negative property assertion _:{}",
                            b
                        )))
                    }
                }
            }
            _ => {}
        }
    }
    Ok(ontology)
}
