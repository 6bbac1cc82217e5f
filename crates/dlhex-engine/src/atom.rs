//! DL atoms and programs that use them

use crate::EngineError;
use dlhex_asp::{Aggregate, BodyLiteral, Head, Program, Rule};
use dlhex_core::{Atom, Symbol, Term};
use dlhex_ontology::names::{self, NEGATION};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of a DL atom as written in a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DlKind {
    #[serde(rename = "cDL")]
    Concept,
    #[serde(rename = "rDL")]
    Role,
    #[serde(rename = "consDL")]
    Consistent,
    #[serde(rename = "inconsDL")]
    Inconsistent,
}

impl DlKind {
    pub fn output_arity(self) -> usize {
        match self {
            DlKind::Concept => 1,
            DlKind::Role => 2,
            DlKind::Consistent | DlKind::Inconsistent => 0,
        }
    }

    fn has_query(self) -> bool {
        matches!(self, DlKind::Concept | DlKind::Role)
    }
}

impl std::fmt::Display for DlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DlKind::Concept => "cDL",
            DlKind::Role => "rDL",
            DlKind::Consistent => "consDL",
            DlKind::Inconsistent => "inconsDL",
        };
        write!(f, "{}", name)
    }
}

/// DL atom occurrence: positional input slots and output terms
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DlInvocation {
    pub kind: DlKind,
    /// ontology, c+, c-, r+, r-, [query], [flag]
    pub inputs: Vec<Term>,
    #[serde(default)]
    pub output: Vec<Term>,
}

impl std::fmt::Display for DlInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "&{}[{}]", self.kind, self.inputs.iter().join(","))?;
        if !self.output.is_empty() {
            write!(f, "({})", self.output.iter().join(","))?;
        }
        Ok(())
    }
}

/// What a DL atom asks
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryShape {
    Concept { concept: Symbol, negated: bool },
    Role { role: Symbol },
    Consistent,
    Inconsistent,
}

impl QueryShape {
    pub fn output_arity(&self) -> usize {
        match self {
            QueryShape::Concept { .. } => 1,
            QueryShape::Role { .. } => 2,
            QueryShape::Consistent | QueryShape::Inconsistent => 0,
        }
    }

    /// Queried DL name in label form (`C`, `¬C` or `R`)
    pub fn name(&self) -> Option<Symbol> {
        match self {
            QueryShape::Concept { concept, negated: false } => Some(concept.clone()),
            QueryShape::Concept { concept, negated: true } => {
                Some(names::negate(concept.as_str()))
            }
            QueryShape::Role { role } => Some(role.clone()),
            _ => None,
        }
    }
}

/// Update predicates of a DL atom
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpdatePredicates {
    pub concept_plus: Symbol,
    pub concept_minus: Symbol,
    pub role_plus: Symbol,
    pub role_minus: Symbol,
}

/// Kind of an update fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpdateKind {
    ConceptPlus,
    ConceptMinus,
    RolePlus,
    RoleMinus,
}

impl UpdateKind {
    pub const ALL: [UpdateKind; 4] = [
        UpdateKind::ConceptPlus,
        UpdateKind::ConceptMinus,
        UpdateKind::RolePlus,
        UpdateKind::RoleMinus,
    ];

    /// Arity of the update predicate
    pub fn arity(self) -> usize {
        match self {
            UpdateKind::ConceptPlus | UpdateKind::ConceptMinus => 2,
            UpdateKind::RolePlus | UpdateKind::RoleMinus => 3,
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, UpdateKind::ConceptMinus | UpdateKind::RoleMinus)
    }
}

impl UpdatePredicates {
    pub fn predicate(&self, kind: UpdateKind) -> &Symbol {
        match kind {
            UpdateKind::ConceptPlus => &self.concept_plus,
            UpdateKind::ConceptMinus => &self.concept_minus,
            UpdateKind::RolePlus => &self.role_plus,
            UpdateKind::RoleMinus => &self.role_minus,
        }
    }

    /// Update kind of a ground atom over one of these predicates
    pub fn kind_of(&self, atom: &Atom) -> Option<UpdateKind> {
        UpdateKind::ALL
            .into_iter()
            .find(|kind| self.predicate(*kind) == &atom.predicate && kind.arity() == atom.arity())
    }
}

/// Validated DL atom. Two occurrences with equal inputs share one `DlAtom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DlAtom {
    pub ontology: Symbol,
    pub updates: UpdatePredicates,
    pub query: QueryShape,
    pub use_abox: bool,
}

fn constant_slot(invocation: &DlInvocation, index: usize, what: &str) -> Result<Symbol, EngineError> {
    match invocation.inputs.get(index) {
        Some(Term::Const(s)) => Ok(s.clone()),
        Some(other) => Err(EngineError::Configuration(format!(
            "{} of {} must be a constant, found {}",
            what, invocation, other
        ))),
        None => Err(EngineError::Configuration(format!(
            "{} missing in {}",
            what, invocation
        ))),
    }
}

impl DlAtom {
    pub fn from_invocation(invocation: &DlInvocation) -> Result<Self, EngineError> {
        let kind = invocation.kind;
        let fixed = if kind.has_query() { 6 } else { 5 };
        let slots = invocation.inputs.len();
        if slots != fixed && slots != fixed + 1 {
            return Err(EngineError::Configuration(format!(
                "{} expects {} or {} input slots, found {}",
                kind,
                fixed,
                fixed + 1,
                slots
            )));
        }
        if invocation.output.len() != kind.output_arity() {
            return Err(EngineError::Configuration(format!(
                "{} has output arity {}, found {} in {}",
                kind,
                kind.output_arity(),
                invocation.output.len(),
                invocation
            )));
        }

        let ontology = constant_slot(invocation, 0, "ontology")?;
        let updates = UpdatePredicates {
            concept_plus: constant_slot(invocation, 1, "concept addition predicate")?,
            concept_minus: constant_slot(invocation, 2, "concept removal predicate")?,
            role_plus: constant_slot(invocation, 3, "role addition predicate")?,
            role_minus: constant_slot(invocation, 4, "role removal predicate")?,
        };

        let query = match kind {
            DlKind::Concept | DlKind::Role => {
                let term = constant_slot(invocation, 5, "query")?;
                let (name, negated) = match term.as_str().strip_prefix('-') {
                    Some(rest) => (rest, true),
                    None => match term.as_str().strip_prefix(NEGATION) {
                        Some(rest) => (rest, true),
                        None => (term.as_str(), false),
                    },
                };
                if name.is_empty() {
                    return Err(EngineError::Configuration(format!(
                        "empty query in {}",
                        invocation
                    )));
                }
                if kind == DlKind::Role {
                    if negated {
                        return Err(EngineError::Configuration(format!(
                            "negative role queries are not supported: {}",
                            invocation
                        )));
                    }
                    QueryShape::Role { role: Symbol::new(name) }
                } else {
                    QueryShape::Concept {
                        concept: Symbol::new(name),
                        negated,
                    }
                }
            }
            DlKind::Consistent => QueryShape::Consistent,
            DlKind::Inconsistent => QueryShape::Inconsistent,
        };

        let use_abox = match invocation.inputs.get(fixed) {
            None => true,
            Some(Term::Int(1)) => true,
            Some(Term::Int(0)) => false,
            Some(other) => {
                return Err(EngineError::Configuration(format!(
                    "ABox flag must be 0 or 1, found {} in {}",
                    other, invocation
                )))
            }
        };

        Ok(Self {
            ontology,
            updates,
            query,
            use_abox,
        })
    }

    pub fn output_arity(&self) -> usize {
        self.query.output_arity()
    }
}

impl std::fmt::Display for DlAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let u = &self.updates;
        let (kind, query) = match &self.query {
            QueryShape::Concept { .. } | QueryShape::Role { .. } => {
                let kind = if self.output_arity() == 1 { "cDL" } else { "rDL" };
                (kind, self.query.name().map(|n| format!(",{}", n)).unwrap_or_default())
            }
            QueryShape::Consistent => ("consDL", String::new()),
            QueryShape::Inconsistent => ("inconsDL", String::new()),
        };
        write!(
            f,
            "&{}[{},{},{},{},{}{},{}]",
            kind,
            self.ontology,
            u.concept_plus,
            u.concept_minus,
            u.role_plus,
            u.role_minus,
            query,
            u8::from(self.use_abox)
        )
    }
}

/// Body literal of a program with DL atoms
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexLiteral {
    Pos(Atom),
    Neg(Atom),
    Dl {
        atom: DlInvocation,
        #[serde(default = "default_true")]
        positive: bool,
    },
    Aggregate(Aggregate),
}

fn default_true() -> bool {
    true
}

impl From<BodyLiteral> for HexLiteral {
    fn from(literal: BodyLiteral) -> Self {
        match literal {
            BodyLiteral::Pos(a) => HexLiteral::Pos(a),
            BodyLiteral::Neg(a) => HexLiteral::Neg(a),
            BodyLiteral::Aggregate(a) => HexLiteral::Aggregate(a),
        }
    }
}

impl std::fmt::Display for HexLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HexLiteral::Dl { atom, positive: true } => write!(f, "{}", atom),
            HexLiteral::Dl { atom, positive: false } => write!(f, "not {}", atom),
            HexLiteral::Pos(a) => write!(f, "{}", BodyLiteral::Pos(a.clone())),
            HexLiteral::Neg(a) => write!(f, "{}", BodyLiteral::Neg(a.clone())),
            HexLiteral::Aggregate(a) => write!(f, "{}", BodyLiteral::Aggregate(a.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexRule {
    pub head: Head,
    #[serde(default)]
    pub body: Vec<HexLiteral>,
}

impl HexRule {
    pub fn new(head: Head, body: Vec<HexLiteral>) -> Self {
        Self { head, body }
    }

    pub fn fact(atom: Atom) -> Self {
        Self::new(Head::Disjunction(vec![atom]), Vec::new())
    }

    pub fn normal(head: Atom, body: Vec<HexLiteral>) -> Self {
        Self::new(Head::Disjunction(vec![head]), body)
    }

    pub fn constraint(body: Vec<HexLiteral>) -> Self {
        Self::new(Head::Disjunction(Vec::new()), body)
    }

    pub fn dl_atoms(&self) -> impl Iterator<Item = &DlInvocation> {
        self.body.iter().filter_map(|l| match l {
            HexLiteral::Dl { atom, .. } => Some(atom),
            _ => None,
        })
    }
}

impl From<Rule> for HexRule {
    fn from(rule: Rule) -> Self {
        Self {
            head: rule.head,
            body: rule.body.into_iter().map(HexLiteral::from).collect(),
        }
    }
}

impl std::fmt::Display for HexRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plain = Rule {
            head: self.head.clone(),
            body: Vec::new(),
        };
        let head = plain.to_string();
        let head = head.trim_end_matches('.');
        if self.body.is_empty() {
            return write!(f, "{}.", head);
        }
        if head.is_empty() {
            write!(f, ":- {}.", self.body.iter().join(", "))
        } else {
            write!(f, "{} :- {}.", head, self.body.iter().join(", "))
        }
    }
}

/// Program whose rule bodies may contain DL atoms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexProgram {
    pub rules: Vec<HexRule>,
}

impl HexProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: HexRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct DL atoms, in order of first occurrence
    pub fn dl_atoms(&self) -> Result<Vec<DlAtom>, EngineError> {
        let mut seen = BTreeSet::new();
        let mut atoms = Vec::new();
        for invocation in self.rules.iter().flat_map(HexRule::dl_atoms) {
            let atom = DlAtom::from_invocation(invocation)?;
            if seen.insert(atom.clone()) {
                atoms.push(atom);
            }
        }
        Ok(atoms)
    }

    /// Ontology names referenced by DL atoms
    pub fn ontologies(&self) -> Result<BTreeSet<Symbol>, EngineError> {
        Ok(self.dl_atoms()?.into_iter().map(|a| a.ontology).collect())
    }
}

impl FromIterator<HexRule> for HexProgram {
    fn from_iter<I: IntoIterator<Item = HexRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl From<Program> for HexProgram {
    fn from(program: Program) -> Self {
        program.rules.into_iter().map(HexRule::from).collect()
    }
}

impl std::fmt::Display for HexProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(kind: DlKind, extra: &[Term], output: Vec<Term>) -> DlInvocation {
        let mut inputs: Vec<Term> = ["family", "cp", "cm", "rp", "rm"]
            .iter()
            .map(|s| Term::constant(*s))
            .collect();
        inputs.extend(extra.iter().cloned());
        DlInvocation {
            kind,
            inputs,
            output,
        }
    }

    #[test]
    fn test_concept_query_shapes() {
        let atom = DlAtom::from_invocation(&invocation(
            DlKind::Concept,
            &[Term::constant("Animal")],
            vec![Term::var("X")],
        ))
        .unwrap();
        assert_eq!(
            atom.query,
            QueryShape::Concept {
                concept: "Animal".into(),
                negated: false
            }
        );
        assert!(atom.use_abox);

        let negated = DlAtom::from_invocation(&invocation(
            DlKind::Concept,
            &[Term::constant("-Animal"), Term::int(0)],
            vec![Term::var("X")],
        ))
        .unwrap();
        assert_eq!(negated.query.name().unwrap().as_str(), "¬Animal");
        assert!(!negated.use_abox);
    }

    #[test]
    fn test_negative_role_query_is_rejected() {
        let result = DlAtom::from_invocation(&invocation(
            DlKind::Role,
            &[Term::constant("-knows")],
            vec![Term::var("X"), Term::var("Y")],
        ));
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_flag_must_be_zero_or_one() {
        let result = DlAtom::from_invocation(&invocation(DlKind::Consistent, &[Term::int(2)], vec![]));
        assert!(matches!(result, Err(EngineError::Configuration(_))));
        let result = DlAtom::from_invocation(&invocation(
            DlKind::Consistent,
            &[Term::constant("yes")],
            vec![],
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_arity_checks() {
        assert!(DlAtom::from_invocation(&invocation(DlKind::Concept, &[], vec![Term::var("X")])).is_err());
        assert!(DlAtom::from_invocation(&invocation(
            DlKind::Concept,
            &[Term::constant("C")],
            vec![Term::var("X"), Term::var("Y")]
        ))
        .is_err());
        let atom = DlAtom::from_invocation(&invocation(DlKind::Inconsistent, &[], vec![])).unwrap();
        assert_eq!(atom.output_arity(), 0);
    }

    #[test]
    fn test_equal_invocations_share_an_atom() {
        let dl = invocation(DlKind::Concept, &[Term::constant("Animal")], vec![Term::var("X")]);
        let mut other = dl.clone();
        other.output = vec![Term::constant("bob")];
        let program: HexProgram = vec![
            HexRule::normal(
                Atom::new("a", vec![Term::var("X")]),
                vec![HexLiteral::Dl { atom: dl, positive: true }],
            ),
            HexRule::constraint(vec![HexLiteral::Dl { atom: other, positive: false }]),
        ]
        .into_iter()
        .collect();
        assert_eq!(program.dl_atoms().unwrap().len(), 1);
        assert_eq!(
            program.rules[1].to_string(),
            ":- not &cDL[family,cp,cm,rp,rm,\"Animal\"](bob)."
        );
    }

    #[test]
    fn test_program_json_round_trip() {
        let text = r#"{"rules": [
            {"head": {"disjunction": [{"predicate": "animal", "args": [{"var": "X"}]}]},
             "body": [{"dl": {"atom": {"kind": "cDL",
                "inputs": [{"const": "family"}, {"const": "cp"}, {"const": "cm"},
                           {"const": "rp"}, {"const": "rm"}, {"const": "Animal"}],
                "output": [{"var": "X"}]}}}]}
        ]}"#;
        let program: HexProgram = serde_json::from_str(text).unwrap();
        assert_eq!(program.dl_atoms().unwrap().len(), 1);
        let back: HexProgram = serde_json::from_str(&serde_json::to_string(&program).unwrap()).unwrap();
        assert_eq!(program, back);
    }
}
