//! Tree-walking evaluator and the two call sites built on it.

use crate::{BinaryOp, Builtin, Context, Expr, UnaryOp, Value, parse};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tableau_error::{ExpressionError, ExpressionErrorKind};
use tracing::{trace, warn};

static TEMPLATE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^}]+)\s*\}\}").expect("Valid template regex"));

/// Evaluate `expression` against `context`.
///
/// # Errors
///
/// Returns an error for syntax errors, unknown identifiers, property access
/// on `null`/`undefined`, and calls to anything but a builtin.
pub fn evaluate(expression: &str, context: &Context) -> Result<Value, ExpressionError> {
    let expr = parse(expression)?;
    let value = eval(&expr, context)?;
    trace!(expression, result = ?value, "Evaluated expression");
    Ok(value)
}

/// Truthiness of `expression`; failures log a warning and yield `false`.
///
/// An empty expression is `false`.
pub fn evaluate_condition(expression: &str, context: &Context) -> bool {
    if expression.trim().is_empty() {
        return false;
    }
    match evaluate(expression, context) {
        Ok(value) => value.is_truthy(),
        Err(e) => {
            warn!(expression, error = %e.kind, "Condition evaluation failed");
            false
        }
    }
}

/// Replace each `{{ expr }}` span with its string value.
///
/// A span that fails to evaluate becomes the empty string; the rest of the
/// template is unaffected.
pub fn interpolate(template: &str, context: &Context) -> String {
    TEMPLATE_SPAN
        .replace_all(template, |caps: &Captures<'_>| {
            let expression = caps[1].trim();
            match evaluate(expression, context) {
                Ok(value) => value.to_display(),
                Err(e) => {
                    warn!(expression, error = %e.kind, "Interpolation failed");
                    String::new()
                }
            }
        })
        .into_owned()
}

fn eval(expr: &Expr, context: &Context) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => context.lookup(name).ok_or_else(|| {
            ExpressionError::new(ExpressionErrorKind::UnknownIdentifier(name.clone()))
        }),
        Expr::Member(object, name) => {
            let object = eval(object, context)?;
            member(&object, name, context)
        }
        Expr::Index(object, index) => {
            let object = eval(object, context)?;
            let index = eval(index, context)?;
            match (&object, &index) {
                (Value::Array(items), Value::Number(n)) => Ok(array_item(items, *n)),
                (Value::String(s), Value::Number(n)) => Ok(string_char(s, *n)),
                _ => member(&object, &index.to_display(), context),
            }
        }
        Expr::Call(callee, args) => {
            let function = eval(callee, context)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, context))
                .collect::<Result<Vec<_>, _>>()?;
            match function {
                Value::Function(Builtin::CustomGet) => Ok(args
                    .first()
                    .map_or(Value::Undefined, |key| context.custom(&key.to_display()))),
                other => Err(ExpressionError::new(ExpressionErrorKind::NotCallable(
                    describe(callee, &other),
                ))),
            }
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, context)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Negate => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let left = eval(lhs, context)?;
            if left.is_truthy() {
                eval(rhs, context)
            } else {
                Ok(left)
            }
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let left = eval(lhs, context)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval(rhs, context)
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval(lhs, context)?;
            let right = eval(rhs, context)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Conditional(test, then, otherwise) => {
            if eval(test, context)?.is_truthy() {
                eval(then, context)
            } else {
                eval(otherwise, context)
            }
        }
    }
}

fn member(object: &Value, name: &str, context: &Context) -> Result<Value, ExpressionError> {
    match object {
        Value::Undefined | Value::Null => Err(ExpressionError::new(ExpressionErrorKind::Type(
            format!(
                "Cannot read properties of {} (reading '{}')",
                object.to_display(),
                name
            ),
        ))),
        Value::Custom if name == "get" => Ok(Value::Function(Builtin::CustomGet)),
        Value::Custom => Ok(context.custom(name)),
        Value::Object(map) => Ok(map.get(name).map_or(Value::Undefined, Value::from)),
        Value::Array(items) if name == "length" => Ok(Value::Number(items.len() as f64)),
        Value::Array(items) => Ok(name
            .parse::<f64>()
            .map_or(Value::Undefined, |n| array_item(items, n))),
        Value::String(s) if name == "length" => {
            Ok(Value::Number(s.encode_utf16().count() as f64))
        }
        Value::String(s) => Ok(name
            .parse::<f64>()
            .map_or(Value::Undefined, |n| string_char(s, n))),
        Value::Bool(_) | Value::Number(_) | Value::Function(_) => Ok(Value::Undefined),
    }
}

fn array_item(items: &[serde_json::Value], n: f64) -> Value {
    if n.fract() != 0.0 || n < 0.0 {
        return Value::Undefined;
    }
    items.get(n as usize).map_or(Value::Undefined, Value::from)
}

fn string_char(s: &str, n: f64) -> Value {
    if n.fract() != 0.0 || n < 0.0 {
        return Value::Undefined;
    }
    s.chars()
        .nth(n as usize)
        .map_or(Value::Undefined, |c| Value::String(c.to_string()))
}

fn describe(callee: &Expr, value: &Value) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member(_, name) => format!("{} ({})", name, value.type_name()),
        _ => value.type_name().to_string(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let (l, r) = (left.to_primitive(), right.to_primitive());
            if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                Value::String(format!("{}{}", l.to_display(), r.to_display()))
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Eq => Value::Bool(loose_eq(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_eq(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_eq(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_eq(left, right)),
        BinaryOp::Less => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::LessEq => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::GreaterEq => Value::Bool(compare(left, right, |o| o.is_ge())),
        BinaryOp::And if left.is_truthy() => right.clone(),
        BinaryOp::Or if !left.is_truthy() => right.clone(),
        BinaryOp::And | BinaryOp::Or => left.clone(),
    }
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a == b,
        (Value::Custom, Value::Custom) => true,
        (Value::Function(a), Value::Function(b)) => a == b,
        _ => false,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    if left.is_nullish() || right.is_nullish() {
        return left.is_nullish() && right.is_nullish();
    }
    match (left, right) {
        (Value::Bool(_), _) => loose_eq(&Value::Number(left.to_number()), right),
        (_, Value::Bool(_)) => loose_eq(left, &Value::Number(right.to_number())),
        (Value::Number(a), Value::String(_)) => *a == right.to_number(),
        (Value::String(_), Value::Number(b)) => left.to_number() == *b,
        _ if left.is_primitive() != right.is_primitive() => {
            loose_eq(&left.to_primitive(), &right.to_primitive())
        }
        _ => strict_eq(left, right),
    }
}

fn compare(left: &Value, right: &Value, accept: fn(std::cmp::Ordering) -> bool) -> bool {
    let (l, r) = (left.to_primitive(), right.to_primitive());
    if let (Value::String(a), Value::String(b)) = (&l, &r) {
        return accept(a.cmp(b));
    }
    l.to_number()
        .partial_cmp(&r.to_number())
        .is_some_and(accept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn context() -> Context {
        let mut state = Map::new();
        state.insert("score".into(), json!(5));
        state.insert("name".into(), json!("Ada"));
        state.insert("flags".into(), json!({"intro": true}));
        state.insert("items".into(), json!([1, 2, 3]));
        state.insert("none".into(), json!(null));
        let mut custom = Map::new();
        custom.insert("lang".into(), json!("es"));
        custom.insert("get".into(), json!("shadowed"));
        Context::new(state, custom)
    }

    fn eval_str(source: &str) -> Value {
        evaluate(source, &context()).unwrap()
    }

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(eval_str("score * 2 + 1"), Value::Number(11.0));
        assert_eq!(eval_str("'a' + score"), Value::String("a5".into()));
        assert_eq!(eval_str("score + '1'"), Value::String("51".into()));
        assert_eq!(eval_str("7 % 4"), Value::Number(3.0));
        assert_eq!(eval_str("items + ''"), Value::String("1,2,3".into()));
    }

    #[test]
    fn test_loose_and_strict_equality() {
        assert_eq!(eval_str("score == '5'"), Value::Bool(true));
        assert_eq!(eval_str("score === '5'"), Value::Bool(false));
        assert_eq!(eval_str("none == undefined"), Value::Bool(true));
        assert_eq!(eval_str("none === undefined"), Value::Bool(false));
        assert_eq!(eval_str("1 == true"), Value::Bool(true));
        assert_eq!(eval_str("0 == ''"), Value::Bool(true));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(eval_str("none || 'fallback'"), Value::String("fallback".into()));
        assert_eq!(eval_str("score && name"), Value::String("Ada".into()));
        assert_eq!(eval_str("!flags.outro"), Value::Bool(true));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert_eq!(eval_str("false && missing"), Value::Bool(false));
        assert_eq!(eval_str("true || missing"), Value::Bool(true));
    }

    #[test]
    fn test_member_and_index_access() {
        assert_eq!(eval_str("state.score"), Value::Number(5.0));
        assert_eq!(eval_str("flags['intro']"), Value::Bool(true));
        assert_eq!(eval_str("items[1]"), Value::Number(2.0));
        assert_eq!(eval_str("items.length"), Value::Number(3.0));
        assert_eq!(eval_str("name.length"), Value::Number(3.0));
        assert_eq!(eval_str("flags.missing"), Value::Undefined);
    }

    #[test]
    fn test_custom_namespace() {
        assert_eq!(eval_str("custom.lang"), Value::String("es".into()));
        assert_eq!(eval_str("custom.get('lang')"), Value::String("es".into()));
        assert_eq!(eval_str("custom.get('nope')"), Value::Undefined);
        assert_eq!(eval_str("custom['lang'] == 'es'"), Value::Bool(true));
    }

    #[test]
    fn test_relational_comparisons() {
        assert_eq!(eval_str("score > 3"), Value::Bool(true));
        assert_eq!(eval_str("'b' > 'a'"), Value::Bool(true));
        assert_eq!(eval_str("'10' < 9"), Value::Bool(false));
        assert_eq!(eval_str("undefined < 1"), Value::Bool(false));
    }

    #[test]
    fn test_errors() {
        let ctx = context();
        assert!(matches!(
            evaluate("missing > 1", &ctx).unwrap_err().kind,
            ExpressionErrorKind::UnknownIdentifier(ref n) if n == "missing"
        ));
        assert!(matches!(
            evaluate("none.field", &ctx).unwrap_err().kind,
            ExpressionErrorKind::Type(_)
        ));
        assert!(matches!(
            evaluate("name()", &ctx).unwrap_err().kind,
            ExpressionErrorKind::NotCallable(_)
        ));
    }

    #[test]
    fn test_condition_recovers_to_false() {
        let ctx = context();
        assert!(evaluate_condition("score > 3", &ctx));
        assert!(!evaluate_condition("missing > 3", &ctx));
        assert!(!evaluate_condition("score >", &ctx));
        assert!(!evaluate_condition("", &ctx));
    }

    #[test]
    fn test_interpolate() {
        let ctx = context();
        assert_eq!(
            interpolate("Hi {{name}}, score {{ score + 1 }}!", &ctx),
            "Hi Ada, score 6!"
        );
        assert_eq!(interpolate("[{{ missing }}]", &ctx), "[]");
        assert_eq!(interpolate("{{ items }}", &ctx), "1,2,3");
        assert_eq!(interpolate("no spans", &ctx), "no spans");
    }
}
