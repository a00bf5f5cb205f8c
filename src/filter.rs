//! Context, label and dbms applicability filters
//!
//! These are recorded on documents, changesets and parameters. The resolver
//! itself only evaluates them for two things: dbms matching of changesets and
//! the applicability of parameter definitions. Everything else is left to the
//! execution subsystem.
//!
//! Expressions combine names with `not`/`!`, `and`, and `or`/`,`, in that
//! order of precedence, and group with parentheses. Matching is
//! case-insensitive.

use std::collections::BTreeSet;
use std::fmt;

/// Split a comma separated list into trimmed, lowercased, non-empty entries.
fn split_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Not,
    And,
    Or,
    Name(String),
}

fn tokenize(lowered: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        tokens.push(match word.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Name(word.clone()),
        });
        word.clear();
    };

    for c in lowered.chars() {
        let token = match c {
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            '!' => Some(Token::Not),
            ',' => Some(Token::Or),
            c if c.is_whitespace() => None,
            c => {
                word.push(c);
                continue;
            }
        };
        flush(&mut word, &mut tokens);
        tokens.extend(token);
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Expression tree. `Not` binds tighter than `And`, which binds tighter
/// than `Or`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Name(String),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

impl Node {
    fn evaluate(&self, names: &BTreeSet<String>) -> bool {
        match self {
            Node::Name(name) => names.contains(name),
            Node::Not(inner) => !inner.evaluate(names),
            Node::And(terms) => terms.iter().all(|term| term.evaluate(names)),
            Node::Or(terms) => terms.iter().any(|term| term.evaluate(names)),
        }
    }

    fn join(mut terms: Vec<Node>, combine: fn(Vec<Node>) -> Node) -> Option<Node> {
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(combine(terms)),
        }
    }
}

/// Recursive descent over the token stream. Missing operands and unbalanced
/// parentheses are tolerated: an operator without an operand is dropped and
/// an unclosed group ends with the input.
struct ExpressionParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExpressionParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Top level. Stray `)` and terms without a joining operator start a new
    /// alternative.
    fn parse(mut self) -> Option<Node> {
        let mut alternatives = Vec::new();
        while self.pos < self.tokens.len() {
            let before = self.pos;
            alternatives.extend(self.or_expr());
            if self.pos == before {
                self.pos += 1;
            }
        }
        Node::join(alternatives, Node::Or)
    }

    fn or_expr(&mut self) -> Option<Node> {
        let mut terms: Vec<Node> = self.and_expr().into_iter().collect();
        while self.eat(&Token::Or) {
            terms.extend(self.and_expr());
        }
        Node::join(terms, Node::Or)
    }

    fn and_expr(&mut self) -> Option<Node> {
        let mut terms: Vec<Node> = self.unary().into_iter().collect();
        while self.eat(&Token::And) {
            terms.extend(self.unary());
        }
        Node::join(terms, Node::And)
    }

    fn unary(&mut self) -> Option<Node> {
        if self.eat(&Token::Not) {
            return self.unary().map(|inner| Node::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Node> {
        if self.eat(&Token::Open) {
            let inner = self.or_expr();
            self.eat(&Token::Close);
            return inner;
        }
        match self.peek() {
            Some(Token::Name(name)) => {
                let node = Node::Name(name.clone());
                self.pos += 1;
                Some(node)
            }
            _ => None,
        }
    }
}

/// Parsed boolean expression over a set of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Expression {
    raw: String,
    root: Option<Node>,
}

impl Expression {
    fn parse(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or("").trim().to_string();
        let parser = ExpressionParser {
            tokens: tokenize(&raw.to_lowercase()),
            pos: 0,
        };
        let root = parser.parse();
        Self { raw, root }
    }

    fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn evaluate(&self, names: &BTreeSet<String>) -> bool {
        self.root.as_ref().map_or(true, |root| root.evaluate(names))
    }
}

/// Context expression attached to documents, changesets, includes and
/// parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextExpression(Expression);

impl ContextExpression {
    pub fn new(raw: Option<&str>) -> Self {
        Self(Expression::parse(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0.raw
    }

    /// Whether this expression applies under the given runtime contexts.
    /// An empty expression or an empty runtime set always matches.
    pub fn matches(&self, runtime_contexts: &BTreeSet<String>) -> bool {
        if self.is_empty() || runtime_contexts.is_empty() {
            return true;
        }
        let lowered: BTreeSet<String> = runtime_contexts
            .iter()
            .map(|context| context.to_lowercase())
            .collect();
        self.0.evaluate(&lowered)
    }
}

impl fmt::Display for ContextExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime label filter evaluated against a set of labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelExpression(Expression);

impl LabelExpression {
    pub fn new(raw: Option<&str>) -> Self {
        Self(Expression::parse(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0.raw
    }

    /// Whether the labels satisfy this expression. Unlabelled items and an
    /// empty expression always match.
    pub fn matches(&self, labels: &Labels) -> bool {
        if self.is_empty() || labels.is_empty() {
            return true;
        }
        self.0.evaluate(&labels.0)
    }
}

impl fmt::Display for LabelExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of labels attached to a changeset, include or parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(BTreeSet<String>);

impl Labels {
    pub fn new(raw: Option<&str>) -> Self {
        Self(raw.map(split_list).unwrap_or_default())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(&label.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(String::as_str).collect();
        f.write_str(&labels.join(","))
    }
}

/// Parse a dbms attribute into a set. `None` or blank means "all".
pub fn dbms_set(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(split_list).unwrap_or_default()
}

/// Whether a dbms definition applies to `database`.
///
/// An empty definition yields `if_empty`. `all` always matches, `none`
/// never does, `!name` excludes a database, and any positive entries form
/// an allow-list.
pub fn dbms_matches(definition: &BTreeSet<String>, database: &str, if_empty: bool) -> bool {
    if definition.is_empty() {
        return if_empty;
    }
    if definition.contains("all") {
        return true;
    }
    if definition.contains("none") {
        return false;
    }

    let database = database.to_ascii_lowercase();
    if definition.contains(&format!("!{}", database)) {
        return false;
    }

    let mut allowed = definition.iter().filter(|dbms| !dbms.starts_with('!')).peekable();
    if allowed.peek().is_none() {
        return true;
    }
    allowed.any(|dbms| *dbms == database)
}

/// The runtime a resolution is performed for.
#[derive(Debug, Clone, Default)]
pub struct RuntimeEnvironment {
    /// Short name of the target database (e.g. `postgresql`).
    pub database_type: Option<String>,
    /// Active contexts.
    pub contexts: BTreeSet<String>,
    /// Active label filter.
    pub label_filter: LabelExpression,
}

impl RuntimeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database_type(mut self, database_type: &str) -> Self {
        self.database_type = Some(database_type.to_ascii_lowercase());
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.contexts = contexts
            .into_iter()
            .map(|context| context.as_ref().trim().to_lowercase())
            .filter(|context| !context.is_empty())
            .collect();
        self
    }

    pub fn with_label_filter(mut self, expression: &str) -> Self {
        self.label_filter = LabelExpression::new(Some(expression));
        self
    }
}
