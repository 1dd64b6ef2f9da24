// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Integer expression engine for conditional directives.
//!
//! Evaluation runs in three stages: a tokenizer splits a macro-expanded
//! expression into operand and operator tokens (merging two-character
//! operators), a shunting-yard pass reorders them into reverse polish
//! notation, and a stack machine computes the result.
//!
//! Arithmetic is `i32` with an explicit contract: `+ - * / %` wrap on
//! overflow, shift counts are masked to `0..=31`, and `>>` is an
//! arithmetic (sign-propagating) shift. Comparisons and logical operators
//! yield 0 or 1. Unary operators are not supported; `-a` must be written
//! `0 - a`.

use std::collections::VecDeque;

use crate::core::error::{PreprocessError, PreprocessErrorKind};

/// Operand width used throughout the evaluator.
pub type Operand = i32;

/// Precedence tiers, tightest-binding first. Parentheses are handled
/// structurally and have no tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    MulDiv,
    AddSub,
    Shift,
    Relational,
    Equality,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalOr,
}

/// Operator identity. `Assign` (`=`) and `Not` (`!`) only exist while
/// tokenizing, as the first half of `==` and `!=`; a finished expression
/// containing either is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oper {
    ParenLeft,
    ParenRight,
    Multiply,
    Divide,
    Remainder,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRight,
    Lesser,
    Greater,
    LesserEq,
    GreaterEq,
    EqEq,
    NotEq,
    BitOr,
    BitXor,
    BitAnd,
    LogicalAnd,
    LogicalOr,
    Assign,
    Not,
}

impl Oper {
    /// Map a single operator character to its token, or `None` for
    /// non-operator characters.
    fn from_char(c: u8) -> Option<Self> {
        match c {
            b'(' => Some(Self::ParenLeft),
            b')' => Some(Self::ParenRight),
            b'*' => Some(Self::Multiply),
            b'/' => Some(Self::Divide),
            b'%' => Some(Self::Remainder),
            b'+' => Some(Self::Add),
            b'-' => Some(Self::Subtract),
            b'<' => Some(Self::Lesser),
            b'>' => Some(Self::Greater),
            b'=' => Some(Self::Assign),
            b'!' => Some(Self::Not),
            b'|' => Some(Self::BitOr),
            b'^' => Some(Self::BitXor),
            b'&' => Some(Self::BitAnd),
            _ => None,
        }
    }

    /// Combine `self` with a directly following operator into a
    /// two-character operator, if the pair forms one.
    fn merge(self, next: Self) -> Option<Self> {
        match (self, next) {
            (Self::Lesser, Self::Assign) => Some(Self::LesserEq),
            (Self::Greater, Self::Assign) => Some(Self::GreaterEq),
            (Self::Assign, Self::Assign) => Some(Self::EqEq),
            (Self::Not, Self::Assign) => Some(Self::NotEq),
            (Self::Lesser, Self::Lesser) => Some(Self::ShiftLeft),
            (Self::Greater, Self::Greater) => Some(Self::ShiftRight),
            (Self::BitOr, Self::BitOr) => Some(Self::LogicalOr),
            (Self::BitAnd, Self::BitAnd) => Some(Self::LogicalAnd),
            _ => None,
        }
    }

    fn precedence(self) -> Precedence {
        match self {
            Self::Multiply | Self::Divide | Self::Remainder => Precedence::MulDiv,
            Self::Add | Self::Subtract => Precedence::AddSub,
            Self::ShiftLeft | Self::ShiftRight => Precedence::Shift,
            Self::Lesser | Self::Greater | Self::LesserEq | Self::GreaterEq => {
                Precedence::Relational
            }
            Self::EqEq | Self::NotEq => Precedence::Equality,
            Self::BitAnd => Precedence::BitAnd,
            Self::BitXor => Precedence::BitXor,
            Self::BitOr => Precedence::BitOr,
            Self::LogicalAnd => Precedence::LogicalAnd,
            Self::LogicalOr => Precedence::LogicalOr,
            Self::ParenLeft | Self::ParenRight | Self::Assign | Self::Not => Precedence::None,
        }
    }
}

/// A tokenized expression element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Operand(Operand),
    Operator(Oper),
}

/// Characters permitted in an expression: the printable ASCII range up to
/// `|`, minus reserved punctuation. Space is the only legal whitespace.
fn is_legal_char(c: u8) -> bool {
    (b' '..=b'|').contains(&c)
        && !matches!(
            c,
            b'{' | b'\\'
                | b'['
                | b']'
                | b'@'
                | b'?'
                | b';'
                | b':'
                | b'.'
                | b'`'
                | b'\''
                | b'"'
                | b'$'
                | b'#'
        )
}

#[derive(Debug, Default)]
struct Tokens {
    list: VecDeque<Token>,
}

impl Tokens {
    /// Push a word as an operand. A word that is not a complete decimal
    /// numeral (an identifier that survived macro expansion, `123a`, an
    /// out-of-range literal) silently becomes 0.
    fn push_word(&mut self, word: &str) -> Result<(), PreprocessError> {
        if matches!(self.list.back(), Some(Token::Operand(_))) {
            return Err(PreprocessError::new(
                PreprocessErrorKind::MalformedOperatorSequence,
                "expected expression",
            ));
        }
        let value = word.parse::<Operand>().unwrap_or(0);
        self.list.push_back(Token::Operand(value));
        Ok(())
    }

    fn push_operator(&mut self, op: Oper) -> Result<(), PreprocessError> {
        // `(` always starts a fresh token regardless of what precedes it.
        if op == Oper::ParenLeft {
            self.list.push_back(Token::Operator(op));
            return Ok(());
        }
        let prev = match self.list.back() {
            Some(Token::Operator(prev)) => *prev,
            _ => {
                self.list.push_back(Token::Operator(op));
                return Ok(());
            }
        };
        if let Some(merged) = prev.merge(op) {
            if let Some(last) = self.list.back_mut() {
                *last = Token::Operator(merged);
            }
            return Ok(());
        }
        // After `)` any operator may follow, except a second `)` with
        // nothing between. All other operator pairs are malformed.
        if prev == Oper::ParenRight && op != Oper::ParenRight {
            self.list.push_back(Token::Operator(op));
            return Ok(());
        }
        Err(PreprocessError::new(
            PreprocessErrorKind::MalformedOperatorSequence,
            "failed to parse operator",
        ))
    }
}

/// Split an expression into operand and operator tokens.
///
/// The whole input is sanitized against the legal character set before any
/// token is produced, so an illegal character fails independent of its
/// position.
pub fn tokenize(expr: &str) -> Result<VecDeque<Token>, PreprocessError> {
    let bytes = expr.as_bytes();
    if let Some(&bad) = bytes.iter().find(|&&c| !is_legal_char(c)) {
        return Err(PreprocessError::new(
            PreprocessErrorKind::IllegalCharacter,
            format!(
                "illegal character ({}) in expression",
                (bad as char).escape_default()
            ),
        ));
    }

    let mut tokens = Tokens::default();
    let mut word_start: Option<usize> = None;
    for (i, &c) in bytes.iter().enumerate() {
        let op = Oper::from_char(c);
        if op.is_none() && c != b' ' {
            word_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = word_start.take() {
            tokens.push_word(&expr[start..i])?;
        }
        if let Some(op) = op {
            tokens.push_operator(op)?;
        }
    }
    if let Some(start) = word_start {
        tokens.push_word(&expr[start..])?;
    }
    Ok(tokens.list)
}

/// Reorder an infix token sequence into reverse polish notation.
///
/// Left-associative throughout: on a precedence tie the earlier operator
/// is popped first. An unmatched `)` fails; an unmatched `(` left on the
/// operator stack at end of input is silently discarded, along with any
/// operators stacked beneath it (a long-standing quirk, kept as-is and
/// pinned by tests).
pub fn shunting_yard(mut tokens: VecDeque<Token>) -> Result<Vec<Token>, PreprocessError> {
    let mut out_queue = Vec::with_capacity(tokens.len());
    let mut oper_stack: Vec<Oper> = Vec::new();

    while let Some(token) = tokens.pop_front() {
        let incoming = match token {
            Token::Operand(_) => {
                out_queue.push(token);
                continue;
            }
            Token::Operator(op) => op,
        };
        match incoming {
            Oper::ParenLeft => oper_stack.push(incoming),
            Oper::ParenRight => loop {
                match oper_stack.pop() {
                    None => {
                        return Err(PreprocessError::new(
                            PreprocessErrorKind::MismatchedParenthesis,
                            "mismatched parenthesis in expression",
                        ));
                    }
                    Some(Oper::ParenLeft) => break,
                    Some(op) => out_queue.push(Token::Operator(op)),
                }
            },
            _ => {
                while let Some(&top) = oper_stack.last() {
                    if top != Oper::ParenLeft && incoming.precedence() >= top.precedence() {
                        out_queue.push(Token::Operator(top));
                        oper_stack.pop();
                    } else {
                        break;
                    }
                }
                oper_stack.push(incoming);
            }
        }
    }

    while let Some(&top) = oper_stack.last() {
        if top == Oper::ParenLeft {
            break;
        }
        out_queue.push(Token::Operator(top));
        oper_stack.pop();
    }
    Ok(out_queue)
}

fn pop_operand(stack: &mut Vec<Operand>) -> Result<Operand, PreprocessError> {
    stack.pop().ok_or_else(|| {
        PreprocessError::new(
            PreprocessErrorKind::ExpressionEvaluation,
            "malformed expression",
        )
    })
}

/// Apply `b <op> a`, where `a` was popped first (the expression's
/// right-hand operand).
fn apply(op: Oper, b: Operand, a: Operand) -> Result<Operand, PreprocessError> {
    if matches!(op, Oper::Divide | Oper::Remainder) && a == 0 {
        return Err(PreprocessError::new(
            PreprocessErrorKind::DivisionByZero,
            "division by zero",
        ));
    }
    let value = match op {
        Oper::Multiply => b.wrapping_mul(a),
        Oper::Divide => b.wrapping_div(a),
        Oper::Remainder => b.wrapping_rem(a),
        Oper::Add => b.wrapping_add(a),
        Oper::Subtract => b.wrapping_sub(a),
        Oper::ShiftLeft => b.wrapping_shl((a & 0x1f) as u32),
        Oper::ShiftRight => b.wrapping_shr((a & 0x1f) as u32),
        Oper::Lesser => (b < a) as Operand,
        Oper::LesserEq => (b <= a) as Operand,
        Oper::Greater => (b > a) as Operand,
        Oper::GreaterEq => (b >= a) as Operand,
        Oper::EqEq => (b == a) as Operand,
        Oper::NotEq => (b != a) as Operand,
        Oper::BitOr => b | a,
        Oper::BitXor => b ^ a,
        Oper::BitAnd => b & a,
        Oper::LogicalAnd => (b != 0 && a != 0) as Operand,
        Oper::LogicalOr => (b != 0 || a != 0) as Operand,
        Oper::ParenLeft | Oper::ParenRight | Oper::Assign | Oper::Not => {
            return Err(PreprocessError::new(
                PreprocessErrorKind::ExpressionEvaluation,
                "malformed expression",
            ));
        }
    };
    Ok(value)
}

/// Evaluate an expression string to an integer.
pub fn evaluate(expr: &str) -> Result<Operand, PreprocessError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(PreprocessError::new(
            PreprocessErrorKind::ExpressionEvaluation,
            "empty expression",
        ));
    }
    let queue = shunting_yard(tokens)?;

    let mut operands: Vec<Operand> = Vec::new();
    for token in queue {
        let op = match token {
            Token::Operand(value) => {
                operands.push(value);
                continue;
            }
            Token::Operator(op) => op,
        };
        let a = pop_operand(&mut operands)?;
        let b = pop_operand(&mut operands)?;
        operands.push(apply(op, b, a)?);
    }

    if operands.len() != 1 {
        return Err(PreprocessError::new(
            PreprocessErrorKind::ExpressionEvaluation,
            "malformed expression",
        ));
    }
    Ok(operands[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PreprocessErrorKind;
    use proptest::prelude::*;

    fn kind_of(expr: &str) -> PreprocessErrorKind {
        match evaluate(expr) {
            Ok(value) => panic!("expected failure for {expr:?}, got {value}"),
            Err(err) => err.kind(),
        }
    }

    #[test]
    fn precedence_mul_before_add() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14);
        assert_eq!(evaluate("2*3+4").unwrap(), 10);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20);
    }

    #[test]
    fn left_associative_same_tier() {
        assert_eq!(evaluate("10-4-3").unwrap(), 3);
        assert_eq!(evaluate("100/10/5").unwrap(), 2);
        assert_eq!(evaluate("7%4%2").unwrap(), 1);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(kind_of("10/0"), PreprocessErrorKind::DivisionByZero);
        assert_eq!(kind_of("10%0"), PreprocessErrorKind::DivisionByZero);
        assert_eq!(evaluate("0/10").unwrap(), 0);
    }

    #[test]
    fn comparison_and_logical_chain() {
        assert_eq!(evaluate("1==1&&0!=1").unwrap(), 1);
        assert_eq!(evaluate("1==2||1==1").unwrap(), 1);
        assert_eq!(evaluate("3<2").unwrap(), 0);
        assert_eq!(evaluate("2<=2").unwrap(), 1);
        assert_eq!(evaluate("5>=6").unwrap(), 0);
    }

    #[test]
    fn bitwise_and_shift_mix() {
        assert_eq!(evaluate("(5&3)|(2<<1)").unwrap(), 5);
        assert_eq!(evaluate("5^3").unwrap(), 6);
        assert_eq!(evaluate("3>>1").unwrap(), 1);
        assert_eq!(evaluate("1|2|4").unwrap(), 7);
    }

    #[test]
    fn shift_count_is_masked() {
        assert_eq!(evaluate("1<<33").unwrap(), 2);
        assert_eq!(evaluate("4>>34").unwrap(), 1);
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(evaluate("2147483647+1").unwrap(), i32::MIN);
        assert_eq!(evaluate("0-2147483647-2").unwrap(), i32::MAX);
    }

    #[test]
    fn right_shift_is_arithmetic() {
        assert_eq!(evaluate("(0-8)>>1").unwrap(), -4);
    }

    #[test]
    fn words_that_are_not_numerals_become_zero() {
        assert_eq!(evaluate("UNDEFINED").unwrap(), 0);
        assert_eq!(evaluate("123a+1").unwrap(), 1);
        assert_eq!(evaluate("99999999999+5").unwrap(), 5);
    }

    #[test]
    fn consecutive_operands_fail() {
        assert_eq!(
            kind_of("3 3"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
        assert_eq!(
            kind_of("1 foo"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
    }

    #[test]
    fn consecutive_operators_fail() {
        assert_eq!(
            kind_of("1 + + 2"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
        assert_eq!(
            kind_of("1 <+ 2"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
        assert_eq!(
            kind_of("1 * / 2"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
    }

    #[test]
    fn empty_parentheses_fail() {
        assert_eq!(kind_of("()"), PreprocessErrorKind::MalformedOperatorSequence);
        assert_eq!(
            kind_of("1+()"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
    }

    #[test]
    fn doubled_closing_parenthesis_fails_tokenization() {
        assert_eq!(
            kind_of("(1))"),
            PreprocessErrorKind::MalformedOperatorSequence
        );
    }

    #[test]
    fn operator_after_closing_parenthesis_is_fine() {
        assert_eq!(evaluate("(1+2)*3").unwrap(), 9);
        assert_eq!(evaluate("(1)<(2)").unwrap(), 1);
    }

    #[test]
    fn unmatched_closing_parenthesis_fails() {
        assert_eq!(kind_of("3+4)"), PreprocessErrorKind::MismatchedParenthesis);
    }

    #[test]
    fn dangling_open_parenthesis_quirk() {
        // The final flush stops at an unmatched `(`: the parenthesis is
        // dropped, so `(1+2` still evaluates...
        assert_eq!(evaluate("(1+2").unwrap(), 3);
        // ...while operators stacked beneath it are stranded and the
        // operand count no longer balances.
        assert_eq!(kind_of("1+(2*3"), PreprocessErrorKind::ExpressionEvaluation);
    }

    #[test]
    fn trailing_operator_fails_evaluation() {
        assert_eq!(kind_of("3+"), PreprocessErrorKind::ExpressionEvaluation);
        assert_eq!(kind_of("*3"), PreprocessErrorKind::ExpressionEvaluation);
    }

    #[test]
    fn lone_half_operators_fail() {
        assert_eq!(kind_of("1 = 2"), PreprocessErrorKind::ExpressionEvaluation);
        assert_eq!(kind_of("1 ! 2"), PreprocessErrorKind::ExpressionEvaluation);
    }

    #[test]
    fn illegal_characters_fail() {
        assert_eq!(kind_of("1 ~ 2"), PreprocessErrorKind::IllegalCharacter);
        assert_eq!(kind_of("a.b"), PreprocessErrorKind::IllegalCharacter);
        assert_eq!(kind_of("1\t+ 2"), PreprocessErrorKind::IllegalCharacter);
        assert_eq!(kind_of("{1}"), PreprocessErrorKind::IllegalCharacter);
    }

    #[test]
    fn empty_expression_fails() {
        assert_eq!(kind_of(""), PreprocessErrorKind::ExpressionEvaluation);
        assert_eq!(kind_of("   "), PreprocessErrorKind::ExpressionEvaluation);
    }

    #[test]
    fn no_unary_minus() {
        assert_eq!(kind_of("-1"), PreprocessErrorKind::ExpressionEvaluation);
        assert_eq!(evaluate("0-1").unwrap(), -1);
    }

    proptest! {
        #[test]
        fn decimal_literal_round_trip(value in 0..=i32::MAX) {
            prop_assert_eq!(evaluate(&value.to_string()).unwrap(), value);
        }

        #[test]
        fn addition_wraps_like_wrapping_add(a in 0..=i32::MAX, b in 0..=i32::MAX) {
            let expr = format!("{a}+{b}");
            prop_assert_eq!(evaluate(&expr).unwrap(), a.wrapping_add(b));
        }

        #[test]
        fn mul_binds_tighter_than_add(a in 0..1000i32, b in 0..1000i32, c in 0..1000i32) {
            let expr = format!("{a}+{b}*{c}");
            prop_assert_eq!(evaluate(&expr).unwrap(), a + b * c);
        }

        #[test]
        fn comparisons_yield_zero_or_one(a in any::<i32>(), b in 0..=i32::MAX) {
            let expr = format!("(0-{})<{}", a.unsigned_abs(), b);
            let value = evaluate(&expr).unwrap();
            prop_assert!(value == 0 || value == 1);
        }
    }
}
