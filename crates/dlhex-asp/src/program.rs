//! Non-ground program representation

use dlhex_core::{Atom, Symbol, Term};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rule head
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Head {
    /// `a | b | c`; empty for constraints
    Disjunction(Vec<Atom>),
    /// `{a; b; c}`
    Choice(Vec<Atom>),
}

impl Head {
    pub fn atoms(&self) -> &[Atom] {
        match self {
            Head::Disjunction(atoms) | Head::Choice(atoms) => atoms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub fn holds(self, value: i64, bound: i64) -> bool {
        match self {
            CompareOp::Lt => value < bound,
            CompareOp::Le => value <= bound,
            CompareOp::Gt => value > bound,
            CompareOp::Ge => value >= bound,
            CompareOp::Eq => value == bound,
            CompareOp::Ne => value != bound,
        }
    }

    /// Whether the comparison holds for every value in `[min, max]`
    pub fn holds_for_range(self, min: i64, max: i64, bound: i64) -> bool {
        match self {
            CompareOp::Lt | CompareOp::Le => self.holds(max, bound),
            CompareOp::Gt | CompareOp::Ge => self.holds(min, bound),
            CompareOp::Eq => min == bound && max == bound,
            CompareOp::Ne => bound < min || bound > max,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
        }
    }
}

/// `terms : condition` element of an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateElement {
    pub terms: Vec<Term>,
    pub condition: Vec<BodyLiteral>,
}

/// `#count{...} op bound` or `#sum{...} op bound`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub elements: Vec<AggregateElement>,
    pub op: CompareOp,
    pub bound: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLiteral {
    Pos(Atom),
    Neg(Atom),
    Aggregate(Aggregate),
}

impl BodyLiteral {
    /// Variables this literal binds when it is matched
    pub fn binding_variables(&self) -> Vec<Symbol> {
        match self {
            BodyLiteral::Pos(atom) => atom.variables(),
            _ => Vec::new(),
        }
    }

    /// Variables this literal needs bound elsewhere
    pub fn required_variables(&self) -> BTreeSet<Symbol> {
        match self {
            BodyLiteral::Pos(_) => BTreeSet::new(),
            BodyLiteral::Neg(atom) => atom.variables().into_iter().collect(),
            BodyLiteral::Aggregate(aggregate) => {
                let mut global = BTreeSet::new();
                for element in &aggregate.elements {
                    let local: BTreeSet<Symbol> = element
                        .condition
                        .iter()
                        .flat_map(BodyLiteral::binding_variables)
                        .collect();
                    let mut mentioned: BTreeSet<Symbol> = element
                        .terms
                        .iter()
                        .filter_map(|t| match t {
                            Term::Var(v) => Some(v.clone()),
                            _ => None,
                        })
                        .collect();
                    for literal in &element.condition {
                        mentioned.extend(literal.required_variables());
                    }
                    global.extend(mentioned.difference(&local).cloned());
                }
                global
            }
        }
    }
}

/// Rule `head :- body`; facts have an empty body, constraints an empty disjunction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub head: Head,
    #[serde(default)]
    pub body: Vec<BodyLiteral>,
}

impl Rule {
    pub fn fact(atom: Atom) -> Self {
        Self {
            head: Head::Disjunction(vec![atom]),
            body: Vec::new(),
        }
    }

    pub fn normal(head: Atom, body: Vec<BodyLiteral>) -> Self {
        Self {
            head: Head::Disjunction(vec![head]),
            body,
        }
    }

    pub fn disjunctive(head: Vec<Atom>, body: Vec<BodyLiteral>) -> Self {
        Self {
            head: Head::Disjunction(head),
            body,
        }
    }

    pub fn choice(head: Vec<Atom>, body: Vec<BodyLiteral>) -> Self {
        Self {
            head: Head::Choice(head),
            body,
        }
    }

    pub fn constraint(body: Vec<BodyLiteral>) -> Self {
        Self {
            head: Head::Disjunction(Vec::new()),
            body,
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(&self.head, Head::Disjunction(atoms) if atoms.is_empty())
    }

    /// Variables that do not occur in a positive body atom
    pub fn unsafe_variables(&self) -> Vec<Symbol> {
        let bound: BTreeSet<Symbol> = self
            .body
            .iter()
            .flat_map(BodyLiteral::binding_variables)
            .collect();
        let mut needed: BTreeSet<Symbol> = self
            .head
            .atoms()
            .iter()
            .flat_map(Atom::variables)
            .collect();
        for literal in &self.body {
            needed.extend(literal.required_variables());
        }
        needed.difference(&bound).cloned().collect()
    }
}

/// Ordered list of rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub rules: Vec<Rule>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn extend<I: IntoIterator<Item = Rule>>(&mut self, rules: I) {
        self.rules.extend(rules);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Symbolic constants mentioned anywhere in the program
    pub fn constants(&self) -> BTreeSet<Symbol> {
        fn collect(atom: &Atom, out: &mut BTreeSet<Symbol>) {
            out.extend(atom.args.iter().filter_map(Term::as_const).cloned());
        }
        fn collect_body(literal: &BodyLiteral, out: &mut BTreeSet<Symbol>) {
            match literal {
                BodyLiteral::Pos(atom) | BodyLiteral::Neg(atom) => collect(atom, out),
                BodyLiteral::Aggregate(aggregate) => {
                    for element in &aggregate.elements {
                        element.condition.iter().for_each(|l| collect_body(l, out));
                    }
                }
            }
        }

        let mut out = BTreeSet::new();
        for rule in &self.rules {
            rule.head.atoms().iter().for_each(|a| collect(a, &mut out));
            rule.body.iter().for_each(|l| collect_body(l, &mut out));
        }
        out
    }
}

impl FromIterator<Rule> for Program {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Program {
            rules: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for BodyLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodyLiteral::Pos(atom) => write!(f, "{}", atom),
            BodyLiteral::Neg(atom) => write!(f, "not {}", atom),
            BodyLiteral::Aggregate(aggregate) => {
                let function = match aggregate.function {
                    AggregateFunction::Count => "#count",
                    AggregateFunction::Sum => "#sum",
                };
                let elements = aggregate
                    .elements
                    .iter()
                    .map(|e| format!("{} : {}", e.terms.iter().join(","), e.condition.iter().join(", ")))
                    .join("; ");
                write!(f, "{}{{{}}} {} {}", function, elements, aggregate.op.symbol(), aggregate.bound)
            }
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.head {
            Head::Disjunction(atoms) => write!(f, "{}", atoms.iter().join(" | "))?,
            Head::Choice(atoms) => write!(f, "{{{}}}", atoms.iter().join("; "))?,
        }
        if self.body.is_empty() {
            return write!(f, ".");
        }
        if !self.is_constraint() {
            write!(f, " ")?;
        }
        write!(f, ":- {}.", self.body.iter().join(", "))
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
