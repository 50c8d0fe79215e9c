use crate::autodiff::Dual;
use crate::error::{EvaluationError, ParseError};
use crate::traits::{Scalar, ScalarFunction};
use nalgebra::Vector2;
use std::cell::RefCell;
use std::collections::HashMap;

/// Built-in single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    Sign,
    Floor,
    Ceil,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "exp" => Self::Exp,
            // `log` is the natural logarithm, as in most graphing calculators.
            "log" | "ln" => Self::Ln,
            "log10" => Self::Log10,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "sign" => Self::Sign,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            _ => return None,
        };
        Some(function)
    }

    fn apply<T: Scalar>(self, a: T) -> T {
        match self {
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Log10 => a.log10(),
            Self::Sqrt => a.sqrt(),
            Self::Abs => a.abs(),
            Self::Sign => a.signum(),
            Self::Floor => a.floor(),
            Self::Ceil => a.ceil(),
        }
    }
}

/// OpCodes for the Stack-based Virtual Machine.
/// The VM operates on a stack of `Scalar` values (f64 or Dual).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes a variable onto the stack: 0 = x, 1 = y.
    LoadVar(usize),
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    /// Pops top value (a), pushes f(a).
    Call(Function),
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

/// Stack-based Virtual Machine for evaluating equations.
///
/// The VM is stateless; `execute` takes the bytecode, the variable values and
/// a scratch stack, and returns the value left on the stack.
pub struct VM;

impl VM {
    pub fn execute<T: Scalar>(bytecode: &Bytecode, vars: &[T], stack: &mut Vec<T>) -> T {
        stack.clear();

        for op in &bytecode.ops {
            match *op {
                OpCode::LoadConst(val) => stack.push(T::from_f64(val)),
                OpCode::LoadVar(idx) => stack.push(vars[idx]),
                OpCode::Add => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a + b);
                }
                OpCode::Sub => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a - b);
                }
                OpCode::Mul => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a * b);
                }
                OpCode::Div => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a / b);
                }
                OpCode::Pow => {
                    let (a, b) = pop_pair(stack);
                    stack.push(a.powf(b));
                }
                OpCode::Neg => {
                    let a = stack.pop().unwrap_or_else(T::zero);
                    stack.push(-a);
                }
                OpCode::Call(function) => {
                    let a = stack.pop().unwrap_or_else(T::zero);
                    stack.push(function.apply(a));
                }
            }
        }

        // Compiled bytecode always leaves exactly one value.
        stack.pop().unwrap_or_else(T::zero)
    }
}

fn pop_pair<T: Scalar>(stack: &mut Vec<T>) -> (T, T) {
    let b = stack.pop().unwrap_or_else(T::zero);
    let a = stack.pop().unwrap_or_else(T::zero);
    (a, b)
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /, ^
    Unary(char, Box<Expr>),             // only '-'
    Call(String, Box<Expr>),            // functions like sin(x)
}

/// Compiles an AST (`Expr`) into `Bytecode`.
/// Resolves variable names to indices and named constants to values.
pub struct Compiler {
    pub var_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(var_names: &[&str]) -> Self {
        let var_map = var_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { var_map }
    }

    /// Compiler for the two plotting variables, `x` (index 0) and `y` (index 1).
    pub fn planar() -> Self {
        Self::new(&["x", "y"])
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode, ParseError> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<(), ParseError> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                if let Some(&idx) = self.var_map.get(name) {
                    ops.push(OpCode::LoadVar(idx));
                } else if let Some(value) = named_constant(name) {
                    ops.push(OpCode::LoadConst(value));
                } else {
                    return Err(ParseError::UnknownVariable(name.clone()));
                }
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                let code = match op {
                    '+' => OpCode::Add,
                    '-' => OpCode::Sub,
                    '*' => OpCode::Mul,
                    '/' => OpCode::Div,
                    _ => OpCode::Pow,
                };
                ops.push(code);
            }
            Expr::Unary(_, operand) => {
                self.compile_recursive(operand, ops)?;
                ops.push(OpCode::Neg);
            }
            Expr::Call(func, arg) => {
                let function = Function::from_name(func)
                    .ok_or_else(|| ParseError::UnknownFunction(func.clone()))?;
                self.compile_recursive(arg, ops)?;
                ops.push(OpCode::Call(function));
            }
        }
        Ok(())
    }
}

fn named_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

// --- Simple Parser ---

/// Parses a string expression into an AST.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some((token, position)) => Err(ParseError::UnexpectedToken {
            found: token.describe(),
            position,
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Identifier(name) => format!("'{name}'"),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            // Scientific notation only when digits follow; a bare `e` is Euler's number.
            let rest = &input[position + num_str.len()..];
            if let Some(exponent) = exponent_suffix(rest) {
                num_str.push_str(exponent);
                for _ in 0..exponent.len() {
                    chars.next();
                }
            }
            let value = num_str
                .parse()
                .map_err(|_| ParseError::InvalidNumber(num_str.clone()))?;
            tokens.push((Token::Number(value), position));
        } else if c.is_alphabetic() {
            let mut ident = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((Token::Identifier(ident), position));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => return Err(ParseError::UnexpectedCharacter { found: c, position }),
            };
            tokens.push((token, position));
            chars.next();
        }
    }
    Ok(tokens)
}

fn exponent_suffix(rest: &str) -> Option<&str> {
    let bytes = rest.as_bytes();
    if !matches!(bytes.first(), Some(b'e') | Some(b'E')) {
        return None;
    }
    let mut end = 1;
    if matches!(bytes.get(1), Some(b'+') | Some(b'-')) {
        end = 2;
    }
    let digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some(&rest[..end + digits])
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.pos).cloned()
    }

    fn consume(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, |(_, position)| position + 1)
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;

        while let Some((token, _)) = self.peek() {
            let op = match token {
                Token::Plus => '+',
                Token::Minus => '-',
                _ => break,
            };
            self.consume();
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some((token, _)) = self.peek() {
            let op = match token {
                Token::Star => '*',
                Token::Slash => '/',
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // Unary minus binds looser than `^`: -x^2 is -(x^2).
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some((Token::Minus, _)) => {
                self.consume();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary('-', Box::new(expr)))
            }
            Some((Token::Plus, _)) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // Right-associative: 2^3^2 is 2^(3^2).
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if let Some((Token::Caret, _)) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), '^', Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.consume() {
            Some((Token::Number(n), _)) => Ok(Expr::Number(n)),
            Some((Token::Identifier(name), _)) => {
                if let Some((Token::LParen, _)) = self.peek() {
                    self.consume();
                    let arg = self.parse_expression()?;
                    self.expect_closing_paren()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some((Token::LParen, _)) => {
                let expr = self.parse_expression()?;
                self.expect_closing_paren()?;
                Ok(expr)
            }
            Some((token, position)) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                position,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn expect_closing_paren(&mut self) -> Result<(), ParseError> {
        match self.consume() {
            Some((Token::RParen, _)) => Ok(()),
            Some((_, position)) => Err(ParseError::MissingClosingParen(position)),
            None => Err(ParseError::MissingClosingParen(self.end_position())),
        }
    }
}

// --- CompiledExpression ---

/// A compiled `f(x, y)` that plugs into the tracer as a `ScalarFunction`.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    bytecode: Bytecode,
    // Interior mutability for VM stacks to avoid allocation per evaluation.
    // This makes the expression !Sync; clone it per thread to parallelize.
    stack: RefCell<Vec<f64>>,
    dual_stack: RefCell<Vec<Dual>>,
}

impl CompiledExpression {
    /// Parses and compiles `source` over the variables `x` and `y`.
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let expr = parse(source)?;
        let bytecode = Compiler::planar().compile(&expr)?;
        Ok(Self::from_bytecode(source, bytecode))
    }

    pub fn from_bytecode(source: &str, bytecode: Bytecode) -> Self {
        Self {
            source: source.to_string(),
            bytecode,
            stack: RefCell::new(Vec::with_capacity(64)),
            dual_stack: RefCell::new(Vec::with_capacity(64)),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    /// Raw evaluation; may return NaN or infinities.
    pub fn eval_raw(&self, x: f64, y: f64) -> f64 {
        let mut stack = self.stack.borrow_mut();
        VM::execute(&self.bytecode, &[x, y], &mut stack)
    }

    fn partial(&self, x: Dual, y: Dual) -> f64 {
        let mut stack = self.dual_stack.borrow_mut();
        VM::execute(&self.bytecode, &[x, y], &mut stack).eps
    }
}

impl ScalarFunction for CompiledExpression {
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvaluationError> {
        let value = self.eval_raw(x, y);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NonFinite { x, y })
        }
    }

    fn gradient(&self, x: f64, y: f64) -> Option<Vector2<f64>> {
        let dx = self.partial(Dual::variable(x), Dual::constant(y));
        let dy = self.partial(Dual::constant(x), Dual::variable(y));
        let grad = Vector2::new(dx, dy);
        grad.iter().all(|v| v.is_finite()).then_some(grad)
    }

    fn x_partial(&self, x: f64, y: f64) -> Option<f64> {
        let dx = self.partial(Dual::variable(x), Dual::constant(y));
        dx.is_finite().then_some(dx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, x: f64, y: f64) -> f64 {
        CompiledExpression::compile(source)
            .expect("expression should compile")
            .eval_raw(x, y)
    }

    #[test]
    fn respects_operator_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0, 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0, 0.0), 9.0);
        assert_eq!(eval("8 / 4 / 2", 0.0, 0.0), 1.0);
        assert_eq!(eval("10 - 4 - 3", 0.0, 0.0), 3.0);
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_negation() {
        assert_eq!(eval("2^3^2", 0.0, 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0, 0.0), -9.0);
        assert_eq!(eval("2^-1", 0.0, 0.0), 0.5);
    }

    #[test]
    fn evaluates_variables_constants_and_functions() {
        assert!((eval("x^2 + y^2", 3.0, 4.0) - 25.0).abs() < 1e-12);
        assert!((eval("sin(pi / 2)", 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("log(e)", 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("sqrt(abs(x))", -16.0, 0.0) - 4.0).abs() < 1e-12);
        assert_eq!(eval("sign(x)", 0.0, 0.0), 0.0);
    }

    #[test]
    fn scientific_notation_does_not_swallow_euler() {
        assert_eq!(eval("2e3", 0.0, 0.0), 2000.0);
        assert!((eval("2*e", 0.0, 0.0) - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse("1 +"), Err(ParseError::UnexpectedEnd)));
        assert!(matches!(
            parse("(x + 1"),
            Err(ParseError::MissingClosingParen(_))
        ));
        assert!(matches!(
            parse("x # y"),
            Err(ParseError::UnexpectedCharacter { found: '#', .. })
        ));
        assert!(matches!(
            parse("2 x"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn rejects_unknown_symbols() {
        assert!(matches!(
            CompiledExpression::compile("x + z"),
            Err(ParseError::UnknownVariable(name)) if name == "z"
        ));
        assert!(matches!(
            CompiledExpression::compile("foo(x)"),
            Err(ParseError::UnknownFunction(name)) if name == "foo"
        ));
    }

    #[test]
    fn non_finite_values_are_evaluation_errors() {
        let f = CompiledExpression::compile("log(x)").expect("compiles");
        assert!(f.evaluate(-1.0, 0.0).is_err());
        assert!(f.evaluate(1.0, 0.0).is_ok());
    }

    #[test]
    fn gradient_matches_analytic_derivative() {
        let f = CompiledExpression::compile("x^2 * y + sin(y)").expect("compiles");
        let grad = f.gradient(2.0, 0.5).expect("gradient should be finite");
        assert!((grad.x - 2.0).abs() < 1e-12);
        assert!((grad.y - (4.0 + 0.5f64.cos())).abs() < 1e-12);
    }

    #[test]
    fn x_partial_agrees_with_gradient() {
        let f = CompiledExpression::compile("x^3 - x*y").expect("compiles");
        let dx = f.x_partial(1.5, 2.0).expect("finite");
        assert!((dx - (3.0 * 1.5 * 1.5 - 2.0)).abs() < 1e-12);
        assert_eq!(Some(dx), f.gradient(1.5, 2.0).map(|g| g.x));
        let log = CompiledExpression::compile("log(x)").expect("compiles");
        assert_eq!(log.x_partial(-1.0, 0.0), None);
    }
}
