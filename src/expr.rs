//! The expression evaluator named as a collaborator in spec §6: given a
//! record, its schema, and an expression tree, yields a typed value. Scans
//! use the boolean result to filter. Variants beyond `=`, `<`, `>` (`<=`,
//! `>=`, `!=`) are a supplement grounded on `original_source`'s `expr.c`,
//! which defines the fuller comparison set the distilled spec only
//! sampled from.

use crate::common::{Error, Result};
use crate::storage::tuple::Record;
use crate::types::{Field, Schema};

/// An expression tree over a single record: constants, attribute
/// references, comparisons, and boolean combinators (spec §6).
#[derive(Debug, Clone)]
pub enum Expr {
    Const(Field),
    Attr(usize),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn attr(index: usize) -> Expr {
        Expr::Attr(index)
    }

    pub fn constant(value: Field) -> Expr {
        Expr::Const(value)
    }

    pub fn eq(self, other: Expr) -> Expr {
        Expr::Eq(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: Expr) -> Expr {
        Expr::Lt(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: Expr) -> Expr {
        Expr::Gt(Box::new(self), Box::new(other))
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    /// Evaluates this expression against `record` under `schema`, yielding
    /// a typed `Field`. Comparisons and boolean combinators always yield
    /// `Field::Bool`.
    pub fn evaluate(&self, record: &Record, schema: &Schema) -> Result<Field> {
        match self {
            Expr::Const(v) => Ok(v.clone()),
            Expr::Attr(i) => record.get_attr(*i).map(|f| f.clone()),
            Expr::Eq(l, r) => self.compare(l, r, record, schema, |o| o == std::cmp::Ordering::Equal),
            Expr::Ne(l, r) => self.compare(l, r, record, schema, |o| o != std::cmp::Ordering::Equal),
            Expr::Lt(l, r) => self.compare(l, r, record, schema, |o| o == std::cmp::Ordering::Less),
            Expr::Le(l, r) => self.compare(l, r, record, schema, |o| o != std::cmp::Ordering::Greater),
            Expr::Gt(l, r) => self.compare(l, r, record, schema, |o| o == std::cmp::Ordering::Greater),
            Expr::Ge(l, r) => self.compare(l, r, record, schema, |o| o != std::cmp::Ordering::Less),
            Expr::And(l, r) => {
                let lv = self.eval_bool_inner(l, record, schema)?;
                let rv = self.eval_bool_inner(r, record, schema)?;
                Ok(Field::Bool(lv && rv))
            }
            Expr::Or(l, r) => {
                let lv = self.eval_bool_inner(l, record, schema)?;
                let rv = self.eval_bool_inner(r, record, schema)?;
                Ok(Field::Bool(lv || rv))
            }
            Expr::Not(e) => {
                let v = self.eval_bool_inner(e, record, schema)?;
                Ok(Field::Bool(!v))
            }
        }
    }

    fn compare(
        &self,
        l: &Expr,
        r: &Expr,
        record: &Record,
        schema: &Schema,
        accept: impl Fn(std::cmp::Ordering) -> bool,
    ) -> Result<Field> {
        let lv = l.evaluate(record, schema)?;
        let rv = r.evaluate(record, schema)?;
        let ord = lv
            .partial_cmp(&rv)
            .ok_or_else(|| Error::InvalidArgument("incomparable operand types".into()))?;
        Ok(Field::Bool(accept(ord)))
    }

    fn eval_bool_inner(&self, e: &Expr, record: &Record, schema: &Schema) -> Result<bool> {
        match e.evaluate(record, schema)? {
            Field::Bool(b) => Ok(b),
            other => Err(Error::InvalidArgument(format!(
                "expected boolean, got {other}"
            ))),
        }
    }

    /// Evaluates this expression as a boolean, as a scan predicate does.
    pub fn eval_bool(&self, record: &Record, schema: &Schema) -> Result<bool> {
        self.eval_bool_inner(self, record, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribute, Schema};

    fn schema() -> Schema {
        Schema::new(vec![Attribute::new_int("a"), Attribute::new_int("b")], vec![0]).unwrap()
    }

    fn record(a: i32, b: i32) -> Record {
        Record::new(vec![Field::Int(a), Field::Int(b)])
    }

    #[test]
    fn comparisons_match_spec_semantics() {
        let s = schema();
        let r = record(5, 10);
        assert!(Expr::attr(0).lt(Expr::attr(1)).eval_bool(&r, &s).unwrap());
        assert!(!Expr::attr(0).gt(Expr::attr(1)).eval_bool(&r, &s).unwrap());
        assert!(Expr::attr(0).eq(Expr::constant(Field::Int(5))).eval_bool(&r, &s).unwrap());
    }

    #[test]
    fn and_or_not_combine_boolean_results() {
        let s = schema();
        let r = record(5, 10);
        let a_lt_b = Expr::attr(0).lt(Expr::attr(1));
        let a_eq_5 = Expr::attr(0).eq(Expr::constant(Field::Int(5)));
        assert!(a_lt_b.clone().and(a_eq_5.clone()).eval_bool(&r, &s).unwrap());
        assert!(!a_lt_b.clone().not().eval_bool(&r, &s).unwrap());
        let a_gt_b = Expr::attr(0).gt(Expr::attr(1));
        assert!(a_gt_b.or(a_eq_5).eval_bool(&r, &s).unwrap());
    }

    #[test]
    fn not_on_non_boolean_is_rejected() {
        let s = schema();
        let r = record(5, 10);
        assert!(Expr::attr(0).not().eval_bool(&r, &s).is_err());
    }

    #[test]
    fn incomparable_types_are_rejected() {
        let s = Schema::new(
            vec![Attribute::new_int("a"), Attribute::new_bool("b")],
            vec![0],
        )
        .unwrap();
        let r = Record::new(vec![Field::Int(1), Field::Bool(true)]);
        assert!(Expr::attr(0).eq(Expr::attr(1)).eval_bool(&r, &s).is_err());
    }
}
