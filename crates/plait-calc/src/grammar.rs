//! Token-level expression grammar.

use plait_core::{
    binary, choice, eof, index, succeed, unary, BinaryOp, Forward, OperatorTable, ParseError,
    Parser, Reply, TokenStream, UnaryOp,
};

use crate::functions::FunctionTable;
use crate::token::CalcToken;

type P<T> = Parser<TokenStream<CalcToken>, T>;

fn op(symbol: &'static str) -> P<()> {
    plait_core::token(move |t: &CalcToken| {
        matches!(t, CalcToken::Op(s) if *s == symbol).then_some(())
    })
    .label(symbol)
}

fn number() -> P<f64> {
    plait_core::token(|t: &CalcToken| match t {
        CalcToken::Number(n) => Some(*n),
        _ => None,
    })
    .label("number")
}

fn identifier() -> P<String> {
    plait_core::token(|t: &CalcToken| match t {
        CalcToken::Word(w) => Some(w.clone()),
        _ => None,
    })
    .label("identifier")
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn infix(symbol: &'static str, f: fn(f64, f64) -> f64) -> P<BinaryOp<f64>> {
    op(symbol).map(move |_| binary(f))
}

fn prefix(symbol: &'static str, f: fn(f64) -> f64) -> P<UnaryOp<f64>> {
    op(symbol).map(move |_| unary(f))
}

fn operator_table() -> OperatorTable<TokenStream<CalcToken>, f64> {
    OperatorTable::new()
        .infixl(infix("&&", |a, b| truth(a != 0.0 && b != 0.0)), 10)
        .infixl(infix("||", |a, b| truth(a != 0.0 || b != 0.0)), 10)
        .infixl(infix("==", |a, b| truth(a == b)), 20)
        .infixl(infix("!=", |a, b| truth(a != b)), 20)
        .infixl(infix("<=", |a, b| truth(a <= b)), 20)
        .infixl(infix("<", |a, b| truth(a < b)), 20)
        .infixl(infix(">=", |a, b| truth(a >= b)), 20)
        .infixl(infix(">", |a, b| truth(a > b)), 20)
        .infixl(infix("+", |a, b| a + b), 40)
        .infixl(infix("-", |a, b| a - b), 40)
        .infixl(infix("*", |a, b| a * b), 50)
        .infixl(infix("/", |a, b| a / b), 50)
        .infixl(infix("%", |a, b| a % b), 50)
        .infixr(infix("**", f64::powf), 60)
        .prefix(prefix("+", |n| n), 70)
        .prefix(prefix("-", |n| -n), 70)
        .prefix(prefix("!", |n| truth(n == 0.0)), 70)
}

/// A constant, or a function applied to its arguments.
///
/// A name that resolves to neither raises an abnormal condition at the
/// start of the name, so no alternative can paper over it.
fn call(expr: P<f64>, functions: FunctionTable) -> P<f64> {
    let args = expr
        .sep_end_by(op(",").or(op("#")))
        .between(op("("), op(")"));
    index()
        .zip(identifier())
        .zip(args.optional())
        .bind(move |((at, name), args)| {
            let args = args.unwrap_or_default();
            match functions.resolve(&name, &args) {
                Ok(value) => succeed(value),
                Err(unresolved) => {
                    let payload = unresolved.to_string();
                    Parser::new("unresolved", move |_, _| {
                        Reply::Err(Some(ParseError::abnormal(at, payload.as_str())))
                    })
                }
            }
        })
}

/// The whole expression language, requiring every token to be consumed.
pub fn expression(functions: FunctionTable) -> P<f64> {
    let expr: Forward<TokenStream<CalcToken>, f64> = Forward::new("expression");
    let term = choice([
        expr.parser().between(op("("), op(")")),
        call(expr.parser(), functions),
        number(),
    ]);
    expr.define(operator_table().build(term));
    expr.parser().followed_by(eof("end of expression"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::AngleMode;
    use plait_core::{run_tokens, DefaultPositionMap, ParseFailure, Token};
    use pretty_assertions::assert_eq;

    fn stream(tokens: Vec<(usize, CalcToken)>, end: usize) -> TokenStream<CalcToken> {
        TokenStream::new(
            tokens
                .into_iter()
                .map(|(i, v)| Token::new(i, 1, v))
                .collect(),
            end,
        )
    }

    fn num(n: f64) -> CalcToken {
        CalcToken::Number(n)
    }

    fn eval(tokens: Vec<CalcToken>) -> Result<f64, ParseFailure> {
        let len = tokens.len();
        let s = stream(tokens.into_iter().enumerate().collect(), len);
        let source: Vec<char> = " ".repeat(len + 1).chars().collect();
        let mut map = DefaultPositionMap::new(&source);
        run_tokens(&s, &expression(FunctionTable::default()), &mut map, "grammar")
    }

    #[test]
    fn test_precedence_from_tokens() {
        use CalcToken::Op;
        assert_eq!(eval(vec![num(1.0), Op("+"), num(2.0), Op("*"), num(3.0)]), Ok(7.0));
        assert_eq!(eval(vec![Op("-"), num(2.0), Op("**"), num(2.0)]), Ok(4.0));
    }

    #[test]
    fn test_call_from_tokens() {
        use CalcToken::{Op, Word};
        let tokens = vec![
            Word("min".to_string()),
            Op("("),
            num(3.0),
            Op("#"),
            num(2.0),
            Op(")"),
        ];
        assert_eq!(eval(tokens), Ok(2.0));
    }

    #[test]
    fn test_unresolved_aborts_at_name() {
        use CalcToken::{Op, Word};
        let tokens = vec![num(1.0), Op("+"), Word("nope".to_string())];
        match eval(tokens) {
            Err(ParseFailure::Aborted { index, payload, .. }) => {
                assert_eq!(index, 2);
                assert_eq!(payload, "no constant or function `nope` taking 0 argument(s)");
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[test]
    fn test_no_angle_functions() {
        use CalcToken::{Op, Word};
        let tokens = vec![Word("cos".to_string()), Op("("), num(0.0), Op(")")];
        let s = stream(tokens.into_iter().enumerate().collect(), 4);
        let source: Vec<char> = "     ".chars().collect();
        let mut map = DefaultPositionMap::new(&source);
        let p = expression(FunctionTable::new(AngleMode::None));
        assert!(matches!(
            run_tokens(&s, &p, &mut map, "grammar"),
            Err(ParseFailure::Aborted { .. })
        ));
    }
}
