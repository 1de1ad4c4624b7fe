use std::cmp::Ordering;

use ahash::AHashMap;
use shapefile::dbase::{FieldValue, Record};

/// A literal operand in a definition query.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
}

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Parsed definition-query expression. Field names are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Cmp {
        field: String,
        op: CmpOp,
        value: Literal,
    },
    In {
        field: String,
        values: Vec<Literal>,
    },
    IsNull {
        field: String,
        negated: bool,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate against one attribute record; `fields` maps lowercased names
    /// to their dbf spelling.
    pub fn matches(&self, record: &Record, fields: &AHashMap<String, String>) -> bool {
        match self {
            Expr::Cmp { field, op, value } => compare(&lookup(record, fields, field), *op, value),
            Expr::In { field, values } => {
                let scalar = lookup(record, fields, field);
                values.iter().any(|v| compare(&scalar, CmpOp::Eq, v))
            }
            Expr::IsNull { field, negated } => {
                let is_null = matches!(lookup(record, fields, field), Scalar::Null);
                is_null != *negated
            }
            Expr::Not(inner) => !inner.matches(record, fields),
            Expr::And(a, b) => a.matches(record, fields) && b.matches(record, fields),
            Expr::Or(a, b) => a.matches(record, fields) || b.matches(record, fields),
        }
    }
}

enum Scalar {
    Text(String),
    Number(f64),
    Null,
}

fn lookup(record: &Record, fields: &AHashMap<String, String>, field: &str) -> Scalar {
    let Some(actual) = fields.get(field) else {
        return Scalar::Null;
    };
    match record.get(actual) {
        Some(FieldValue::Character(Some(s))) => Scalar::Text(s.trim().to_string()),
        Some(FieldValue::Memo(s)) => Scalar::Text(s.trim().to_string()),
        Some(FieldValue::Numeric(Some(n))) => Scalar::Number(*n),
        Some(FieldValue::Float(Some(n))) => Scalar::Number(*n as f64),
        Some(FieldValue::Integer(n)) => Scalar::Number(*n as f64),
        Some(FieldValue::Double(n)) => Scalar::Number(*n),
        Some(FieldValue::Currency(n)) => Scalar::Number(*n),
        Some(FieldValue::Logical(Some(b))) => Scalar::Text(b.to_string()),
        Some(FieldValue::Date(Some(d))) => {
            Scalar::Text(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        _ => Scalar::Null,
    }
}

fn compare(scalar: &Scalar, op: CmpOp, literal: &Literal) -> bool {
    let ordering = match (scalar, literal) {
        (Scalar::Number(a), Literal::Number(b)) => a.total_cmp(b),
        (Scalar::Text(a), Literal::Text(b)) => a.as_str().cmp(b.as_str()),
        // Numeric literal against a text field: compare numerically when the
        // text parses, since dbf code fields are often stored as text.
        (Scalar::Text(a), Literal::Number(b)) => match a.trim().parse::<f64>() {
            Ok(n) => n.total_cmp(b),
            Err(_) => return false,
        },
        _ => return false,
    };
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    }
}
