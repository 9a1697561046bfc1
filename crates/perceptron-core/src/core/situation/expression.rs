use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("Syntax error in expression '{expression}' at position {position}: {message}")]
    Syntax {
        expression: String,
        position: usize,
        message: String,
    },
    #[error("Expression '{expression}' refers to 'v{index}' but only {available} circumstances are defined")]
    UnknownVariable {
        expression: String,
        index: usize,
        available: usize,
    },
    #[error("Type error in expression '{expression}': {message}")]
    TypeMismatch { expression: String, message: String },
    #[error("Expression '{expression}' does not evaluate to a boolean")]
    NonBoolean { expression: String },
    #[error("Fingerprint has {actual} entries but {expected} circumstances are defined")]
    FingerprintMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Cmp(CmpOp),
    Var(usize),
    Literal(Value),
}

/// Deepest accepted nesting of parentheses and negations.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(Value),
    Var(usize),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    Compare(CmpOp, Box<Node>, Box<Node>),
}

/// A parsed boolean combination of circumstance flags.
///
/// Variables are named `v0`, `v1`, ... after the position of the circumstance
/// in its situation. Supported syntax: `||`/`or`, `&&`/`and`, `!`/`not`,
/// parentheses, `true`/`false`, numeric literals, and the comparisons
/// `== != < <= > >=`. The whole expression may be wrapped in `${ ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    source: String,
    root: Node,
}

impl LogicalExpression {
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let (offset, body) = unwrap_template(expression);
        let tokens = tokenize(expression, offset, body)?;
        let mut parser = Parser {
            expression,
            tokens: &tokens,
            pos: 0,
            end: offset + body.len(),
            depth: 0,
        };
        let root = parser.parse_or()?;
        if let Some((position, _)) = tokens.get(parser.pos) {
            return Err(syntax(expression, *position, "unexpected trailing input"));
        }
        Ok(Self {
            source: expression.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Highest variable index referenced, if any.
    pub fn max_variable(&self) -> Option<usize> {
        fn walk(node: &Node) -> Option<usize> {
            match node {
                Node::Literal(_) => None,
                Node::Var(i) => Some(*i),
                Node::Not(inner) => walk(inner),
                Node::And(operands) | Node::Or(operands) => operands.iter().filter_map(walk).max(),
                Node::Compare(_, a, b) => walk(a).max(walk(b)),
            }
        }
        walk(&self.root)
    }

    /// Checks that every referenced variable exists among `available` flags.
    pub fn check_variables(&self, available: usize) -> Result<(), ExpressionError> {
        match self.max_variable() {
            Some(index) if index >= available => Err(ExpressionError::UnknownVariable {
                expression: self.source.clone(),
                index,
                available,
            }),
            _ => Ok(()),
        }
    }

    pub fn evaluate(&self, flags: &[bool]) -> Result<bool, ExpressionError> {
        self.check_variables(flags.len())?;
        match self.eval_node(&self.root, flags)? {
            Value::Bool(b) => Ok(b),
            Value::Number(_) => Err(ExpressionError::NonBoolean {
                expression: self.source.clone(),
            }),
        }
    }

    fn eval_node(&self, node: &Node, flags: &[bool]) -> Result<Value, ExpressionError> {
        Ok(match node {
            Node::Literal(v) => *v,
            Node::Var(i) => Value::Bool(flags[*i]),
            Node::Not(inner) => Value::Bool(!self.expect_bool(self.eval_node(inner, flags)?, "!")?),
            Node::And(operands) => {
                let mut all = true;
                for operand in operands {
                    all &= self.expect_bool(self.eval_node(operand, flags)?, "&&")?;
                }
                Value::Bool(all)
            }
            Node::Or(operands) => {
                let mut any = false;
                for operand in operands {
                    any |= self.expect_bool(self.eval_node(operand, flags)?, "||")?;
                }
                Value::Bool(any)
            }
            Node::Compare(op, a, b) => {
                let a = self.eval_node(a, flags)?;
                let b = self.eval_node(b, flags)?;
                Value::Bool(self.compare(*op, a, b)?)
            }
        })
    }

    fn expect_bool(&self, value: Value, operator: &str) -> Result<bool, ExpressionError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Err(ExpressionError::TypeMismatch {
                expression: self.source.clone(),
                message: format!("operator '{}' expects a boolean, found {}", operator, n),
            }),
        }
    }

    fn compare(&self, op: CmpOp, a: Value, b: Value) -> Result<bool, ExpressionError> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => Ok(match op {
                CmpOp::Eq => x == y,
                CmpOp::Ne => x != y,
                CmpOp::Lt => x < y,
                CmpOp::Le => x <= y,
                CmpOp::Gt => x > y,
                CmpOp::Ge => x >= y,
            }),
            (Value::Bool(x), Value::Bool(y)) if matches!(op, CmpOp::Eq | CmpOp::Ne) => {
                Ok((x == y) == (op == CmpOp::Eq))
            }
            _ => Err(ExpressionError::TypeMismatch {
                expression: self.source.clone(),
                message: format!("cannot compare {} {} {}", a, op.symbol(), b),
            }),
        }
    }
}

impl fmt::Display for LogicalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Conjunction of all flags; an empty fingerprint is satisfied.
pub fn conjunction(flags: &[bool]) -> bool {
    flags.iter().all(|&flag| flag)
}

/// Strips surrounding whitespace and an optional `${ ... }` wrapper.
///
/// Returns the byte offset of the body within `expression` with the body.
fn unwrap_template(expression: &str) -> (usize, &str) {
    let trimmed = expression.trim_start();
    let lead = expression.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    match trimmed
        .strip_prefix("${")
        .and_then(|inner| inner.strip_suffix('}'))
    {
        Some(inner) => (lead + 2, inner),
        None => (lead, trimmed),
    }
}

fn syntax(expression: &str, position: usize, message: impl Into<String>) -> ExpressionError {
    ExpressionError::Syntax {
        expression: expression.to_string(),
        position,
        message: message.into(),
    }
}

fn tokenize(
    expression: &str,
    offset: usize,
    body: &str,
) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let chars: Vec<(usize, char)> = body
        .char_indices()
        .map(|(pos, c)| (offset + pos, c))
        .collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match (c, next) {
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('!', Some('=')) => (Token::Cmp(CmpOp::Ne), 2),
            ('!', _) => (Token::Not, 1),
            ('=', Some('=')) => (Token::Cmp(CmpOp::Eq), 2),
            ('<', Some('=')) => (Token::Cmp(CmpOp::Le), 2),
            ('<', _) => (Token::Cmp(CmpOp::Lt), 1),
            ('>', Some('=')) => (Token::Cmp(CmpOp::Ge), 2),
            ('>', _) => (Token::Cmp(CmpOp::Gt), 1),
            (c, _) if c.is_ascii_digit() || c == '.' => {
                let end = scan(&chars, i, |c| c.is_ascii_digit() || c == '.');
                let text: String = chars[i..end].iter().map(|&(_, c)| c).collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| syntax(expression, pos, format!("invalid number '{}'", text)))?;
                (Token::Literal(Value::Number(number)), end - i)
            }
            (c, _) if c.is_ascii_alphabetic() || c == '_' => {
                let end = scan(&chars, i, |c| c.is_ascii_alphanumeric() || c == '_');
                let word: String = chars[i..end].iter().map(|&(_, c)| c).collect();
                (identifier(expression, pos, &word)?, end - i)
            }
            (c, _) => return Err(syntax(expression, pos, format!("unexpected character '{}'", c))),
        };
        tokens.push((pos, token));
        i += width;
    }
    Ok(tokens)
}

fn scan(chars: &[(usize, char)], start: usize, accept: impl Fn(char) -> bool) -> usize {
    chars[start..]
        .iter()
        .position(|&(_, c)| !accept(c))
        .map_or(chars.len(), |offset| start + offset)
}

fn identifier(expression: &str, pos: usize, word: &str) -> Result<Token, ExpressionError> {
    match word {
        "and" => return Ok(Token::And),
        "or" => return Ok(Token::Or),
        "not" => return Ok(Token::Not),
        "true" => return Ok(Token::Literal(Value::Bool(true))),
        "false" => return Ok(Token::Literal(Value::Bool(false))),
        _ => {}
    }
    word.strip_prefix('v')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .map(Token::Var)
        .ok_or_else(|| syntax(expression, pos, format!("unknown identifier '{}'", word)))
}

struct Parser<'a> {
    expression: &'a str,
    tokens: &'a [(usize, Token)],
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(p, _)| *p)
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        if self.depth >= MAX_NESTING {
            return Err(syntax(
                self.expression,
                self.position(),
                format!("nesting deeper than {} levels", MAX_NESTING),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Node, ExpressionError> {
        let mut operands = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            operands.push(self.parse_and()?);
        }
        Ok(match operands.len() {
            1 => operands.remove(0),
            _ => Node::Or(operands),
        })
    }

    fn parse_and(&mut self) -> Result<Node, ExpressionError> {
        let mut operands = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            operands.push(self.parse_unary()?);
        }
        Ok(match operands.len() {
            1 => operands.remove(0),
            _ => Node::And(operands),
        })
    }

    fn parse_unary(&mut self) -> Result<Node, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.enter()?;
            self.pos += 1;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, ExpressionError> {
        let left = self.parse_primary()?;
        if let Some(&Token::Cmp(op)) = self.peek() {
            self.pos += 1;
            let right = self.parse_primary()?;
            return Ok(Node::Compare(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Node, ExpressionError> {
        let position = self.position();
        let token = self.peek().cloned();
        self.pos += 1;
        match token {
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(syntax(self.expression, self.position(), "expected ')'"));
                }
                self.pos += 1;
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::Var(i)) => Ok(Node::Var(i)),
            Some(Token::Literal(v)) => Ok(Node::Literal(v)),
            Some(_) => Err(syntax(self.expression, position, "expected an operand")),
            None => Err(syntax(self.expression, position, "unexpected end of expression")),
        }
    }
}
