//! Named-to-positional placeholder translation.
//!
//! sqlx binds positionally with `?`. A [`NamedStatement`] rewrites the
//! `:name` placeholders once at prepare time, remembers their order, and
//! collects bound values by name until execution.

use std::collections::HashMap;
use std::convert::Infallible;

use livedb_core::{placeholder, DriverError, DriverErrorKind, ParamType, SqlValue, Statement};

/// A statement with named placeholders, ready for positional binding.
#[derive(Debug, Clone)]
pub struct NamedStatement {
    sql: String,
    compiled: String,
    order: Vec<String>,
    values: HashMap<String, SqlValue>,
}

impl NamedStatement {
    #[must_use]
    pub fn new(sql: &str) -> Self {
        let mut order = Vec::new();
        let compiled = match placeholder::rewrite::<Infallible>(sql, |name| {
            order.push(name.to_owned());
            Ok(String::from("?"))
        }) {
            Ok(compiled) => compiled,
            Err(never) => match never {},
        };
        Self {
            sql: sql.to_owned(),
            compiled,
            order,
            values: HashMap::new(),
        }
    }

    /// The SQL with every `:name` replaced by `?`.
    #[must_use]
    pub fn compiled(&self) -> &str {
        &self.compiled
    }

    /// Placeholder names in positional order. A name used twice appears
    /// twice.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Returns the bound values in positional order.
    ///
    /// # Errors
    ///
    /// Returns [`DriverErrorKind::UnboundPlaceholder`] naming the first
    /// placeholder that received no value.
    pub fn arguments(&self) -> Result<Vec<&SqlValue>, DriverError> {
        self.order
            .iter()
            .map(|name| {
                self.values.get(name).ok_or_else(|| {
                    DriverError::new(
                        DriverErrorKind::UnboundPlaceholder,
                        format!("no value bound for :{name}"),
                    )
                })
            })
            .collect()
    }
}

impl Statement for NamedStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn bind_value(
        &mut self,
        placeholder: &str,
        value: &SqlValue,
        param_type: ParamType,
    ) -> Result<(), DriverError> {
        if !self.order.iter().any(|name| name == placeholder) {
            return Err(DriverError::new(
                DriverErrorKind::Statement,
                format!("statement has no placeholder :{placeholder}"),
            ));
        }
        self.values
            .insert(placeholder.to_owned(), value.clone().cast(param_type));
        Ok(())
    }
}
