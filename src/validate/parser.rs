//! SQL validation logic.
//!
//! Uses sqlparser-rs with the SQLite dialect to parse candidate statements
//! and walk the AST. Every relation and column must resolve against the
//! schema descriptor; statements that fail to parse are rejected outright
//! (conservative default).

use std::collections::HashSet;

use sqlparser::ast::{
    Assignment, AssignmentTarget, Delete, Distinct, Expr, FromTable, Function, FunctionArg,
    FunctionArgExpr, FunctionArguments, GroupByExpr, Ident, Insert, JoinConstraint, JoinOperator,
    ObjectName, OrderByExpr, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins, Value, WindowType,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::db::schema::TableSchema;
use crate::error::{AskbenchError, Result};

use super::{AccessLevel, StatementKind, ValidatedStatement};

/// Validates candidate SQL statements against the schema descriptor.
#[derive(Debug)]
pub struct StatementValidator {
    dialect: SQLiteDialect,
    schema: TableSchema,
    allow_writes: bool,
}

impl StatementValidator {
    /// Creates a validator with the default read-only policy.
    pub fn new(schema: TableSchema) -> Self {
        Self {
            dialect: SQLiteDialect {},
            schema,
            allow_writes: false,
        }
    }

    /// Permits INSERT, UPDATE and DELETE statements.
    pub fn with_writes_allowed(mut self) -> Self {
        self.allow_writes = true;
        self
    }

    /// Validates a candidate statement together with the number of parameters
    /// the caller intends to bind.
    ///
    /// On success the statement is a single schema-conformant statement whose
    /// placeholder count equals `param_count`; it is safe to bind and
    /// execute. All failures are `Validation` errors.
    pub fn validate(&self, sql: &str, param_count: usize) -> Result<ValidatedStatement> {
        let statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| AskbenchError::validation(format!("SQL parse error: {}", e)))?;

        if statements.is_empty() {
            return Err(AskbenchError::validation("Empty SQL statement"));
        }
        if statements.len() > 1 {
            return Err(AskbenchError::validation(format!(
                "Expected a single statement, found {}",
                statements.len()
            )));
        }

        let statement = &statements[0];
        let (kind, access) = classify_statement(statement);
        if access == AccessLevel::Forbidden {
            return Err(match kind {
                StatementKind::Unknown => {
                    AskbenchError::validation("Statement type is not supported")
                }
                _ => AskbenchError::validation(format!("{} statements are not allowed", kind)),
            });
        }
        if !access.is_allowed(self.allow_writes) {
            return Err(AskbenchError::validation(format!(
                "{} requires write access, which is disabled",
                kind
            )));
        }

        let mut walker = SchemaWalker::new(&self.schema);
        walker.check_statement(statement)?;

        if walker.placeholders != param_count {
            return Err(AskbenchError::validation(format!(
                "Statement has {} placeholder(s) but {} parameter(s) were supplied",
                walker.placeholders, param_count
            )));
        }

        Ok(ValidatedStatement {
            kind,
            access,
            placeholders: walker.placeholders,
        })
    }
}

/// Classifies a single parsed statement.
///
/// Anything unrecognized falls through to Forbidden.
fn classify_statement(statement: &Statement) -> (StatementKind, AccessLevel) {
    match statement {
        Statement::Query(_) => (StatementKind::Select, AccessLevel::ReadOnly),

        // Data modification: allowed only with the write opt-in
        Statement::Insert(_) => (StatementKind::Insert, AccessLevel::Write),
        Statement::Update { .. } => (StatementKind::Update, AccessLevel::Write),
        Statement::Delete(_) => (StatementKind::Delete, AccessLevel::Write),

        // Schema changes and side-band constructs: never executed
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateVirtualTable { .. } => (StatementKind::Create, AccessLevel::Forbidden),
        Statement::Drop { .. } => (StatementKind::Drop, AccessLevel::Forbidden),
        Statement::AlterTable { .. } => (StatementKind::Alter, AccessLevel::Forbidden),
        Statement::Truncate { .. } => (StatementKind::Truncate, AccessLevel::Forbidden),
        Statement::Pragma { .. } => (StatementKind::Pragma, AccessLevel::Forbidden),
        Statement::AttachDatabase { .. } => (StatementKind::Attach, AccessLevel::Forbidden),
        Statement::StartTransaction { .. }
        | Statement::Commit { .. }
        | Statement::Rollback { .. } => (StatementKind::Transaction, AccessLevel::Forbidden),

        _ => (StatementKind::Unknown, AccessLevel::Forbidden),
    }
}

/// Walks a parsed statement, resolving relations and columns against the
/// schema descriptor and counting placeholders.
///
/// Alias scoping is flat: an alias introduced anywhere in the statement is
/// accepted anywhere else in it. Every alias still binds to an expression
/// over descriptor columns, so no name outside the schema can slip through.
struct SchemaWalker<'a> {
    schema: &'a TableSchema,
    /// Relations visible to the statement: CTE names and table aliases
    /// (lowercased). The schema table itself is checked separately.
    relations: HashSet<String>,
    /// Column aliases introduced in projections or alias lists (lowercased).
    output_aliases: HashSet<String>,
    /// Number of `?` placeholders seen.
    placeholders: usize,
}

impl<'a> SchemaWalker<'a> {
    fn new(schema: &'a TableSchema) -> Self {
        Self {
            schema,
            relations: HashSet::new(),
            output_aliases: HashSet::new(),
            placeholders: 0,
        }
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Query(query) => self.check_query(query),
            Statement::Insert(insert) => self.check_insert(insert),
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                returning,
                ..
            } => {
                self.register_table_with_joins(table)?;
                if let Some(from) = from {
                    self.register_table_with_joins(from)?;
                }
                for assignment in assignments {
                    self.check_assignment(assignment)?;
                }
                if let Some(selection) = selection {
                    self.check_expr(selection)?;
                }
                if let Some(returning) = returning {
                    self.check_select_items(returning)?;
                }
                Ok(())
            }
            Statement::Delete(delete) => self.check_delete(delete),
            // Classification already filtered everything else out
            _ => Err(AskbenchError::validation("Statement type is not supported")),
        }
    }

    fn check_query(&mut self, query: &Query) -> Result<()> {
        if let Some(with) = &query.with {
            // Recursive CTEs reference their own name inside the body
            if with.recursive {
                for cte in &with.cte_tables {
                    self.relations.insert(cte.alias.name.value.to_lowercase());
                }
            }
            for cte in &with.cte_tables {
                self.check_query(&cte.query)?;
                self.relations.insert(cte.alias.name.value.to_lowercase());
                for column in &cte.alias.columns {
                    self.output_aliases.insert(column.value.to_lowercase());
                }
            }
        }
        self.check_set_expr(&query.body)?;
        if let Some(order_by) = &query.order_by {
            self.check_order_by(&order_by.exprs)?;
        }
        if let Some(limit) = &query.limit {
            self.check_expr(limit)?;
        }
        if let Some(offset) = &query.offset {
            self.check_expr(&offset.value)?;
        }
        Ok(())
    }

    fn check_set_expr(&mut self, set_expr: &SetExpr) -> Result<()> {
        match set_expr {
            SetExpr::Select(select) => self.check_select(select),
            SetExpr::Query(query) => self.check_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.check_set_expr(left)?;
                self.check_set_expr(right)
            }
            SetExpr::Values(values) => {
                for row in &values.rows {
                    for expr in row {
                        self.check_expr(expr)?;
                    }
                }
                Ok(())
            }
            SetExpr::Table(_) => Ok(()),
            SetExpr::Insert(_) | SetExpr::Update(_) => Err(AskbenchError::validation(
                "Data-modifying subqueries are not allowed",
            )),
        }
    }

    fn check_select(&mut self, select: &Select) -> Result<()> {
        // Register FROM first so projections can use its aliases
        for table_with_joins in &select.from {
            self.register_table_with_joins(table_with_joins)?;
        }
        if let Some(Distinct::On(exprs)) = &select.distinct {
            for expr in exprs {
                self.check_expr(expr)?;
            }
        }
        self.check_select_items(&select.projection)?;
        if let Some(selection) = &select.selection {
            self.check_expr(selection)?;
        }
        match &select.group_by {
            GroupByExpr::Expressions(exprs, _) => {
                for expr in exprs {
                    self.check_expr(expr)?;
                }
            }
            GroupByExpr::All(_) => {}
        }
        if let Some(having) = &select.having {
            self.check_expr(having)?;
        }
        Ok(())
    }

    fn check_select_items(&mut self, items: &[SelectItem]) -> Result<()> {
        for item in items {
            match item {
                SelectItem::UnnamedExpr(expr) => self.check_expr(expr)?,
                SelectItem::ExprWithAlias { expr, alias } => {
                    self.check_expr(expr)?;
                    self.output_aliases.insert(alias.value.to_lowercase());
                }
                SelectItem::QualifiedWildcard(name, _) => self.resolve_relation(name)?,
                SelectItem::Wildcard(_) => {}
            }
        }
        Ok(())
    }

    fn register_table_with_joins(&mut self, twj: &TableWithJoins) -> Result<()> {
        self.register_table_factor(&twj.relation)?;
        for join in &twj.joins {
            self.register_table_factor(&join.relation)?;
            match &join.join_operator {
                JoinOperator::Inner(constraint)
                | JoinOperator::LeftOuter(constraint)
                | JoinOperator::RightOuter(constraint)
                | JoinOperator::FullOuter(constraint) => self.check_join_constraint(constraint)?,
                JoinOperator::CrossJoin => {}
                _ => return Err(AskbenchError::validation("Unsupported join type")),
            }
        }
        Ok(())
    }

    fn register_table_factor(&mut self, factor: &TableFactor) -> Result<()> {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                self.resolve_relation(name)?;
                if let Some(alias) = alias {
                    self.relations.insert(alias.name.value.to_lowercase());
                }
                Ok(())
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                self.check_query(subquery)?;
                if let Some(alias) = alias {
                    self.relations.insert(alias.name.value.to_lowercase());
                    for column in &alias.columns {
                        self.output_aliases.insert(column.value.to_lowercase());
                    }
                }
                Ok(())
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.register_table_with_joins(table_with_joins),
            _ => Err(AskbenchError::validation("Unsupported table expression")),
        }
    }

    fn check_join_constraint(&mut self, constraint: &JoinConstraint) -> Result<()> {
        match constraint {
            JoinConstraint::On(expr) => self.check_expr(expr),
            JoinConstraint::Using(columns) => {
                for column in columns {
                    self.check_column(column)?;
                }
                Ok(())
            }
            JoinConstraint::Natural | JoinConstraint::None => Ok(()),
        }
    }

    fn check_insert(&mut self, insert: &Insert) -> Result<()> {
        self.resolve_relation(&insert.table_name)?;
        if insert.on.is_some() {
            return Err(AskbenchError::validation(
                "INSERT ... ON CONFLICT is not supported",
            ));
        }
        for column in &insert.columns {
            self.check_column(column)?;
        }
        if let Some(source) = &insert.source {
            self.check_query(source)?;
        }
        if let Some(returning) = &insert.returning {
            self.check_select_items(returning)?;
        }
        Ok(())
    }

    fn check_delete(&mut self, delete: &Delete) -> Result<()> {
        for name in &delete.tables {
            self.resolve_relation(name)?;
        }
        match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => {
                for twj in tables {
                    self.register_table_with_joins(twj)?;
                }
            }
        }
        if let Some(using) = &delete.using {
            for twj in using {
                self.register_table_with_joins(twj)?;
            }
        }
        if let Some(selection) = &delete.selection {
            self.check_expr(selection)?;
        }
        if let Some(returning) = &delete.returning {
            self.check_select_items(returning)?;
        }
        self.check_order_by(&delete.order_by)?;
        if let Some(limit) = &delete.limit {
            self.check_expr(limit)?;
        }
        Ok(())
    }

    fn check_assignment(&mut self, assignment: &Assignment) -> Result<()> {
        match &assignment.target {
            AssignmentTarget::ColumnName(name) => self.check_assignment_target(name)?,
            AssignmentTarget::Tuple(names) => {
                for name in names {
                    self.check_assignment_target(name)?;
                }
            }
        }
        self.check_expr(&assignment.value)
    }

    fn check_assignment_target(&self, name: &ObjectName) -> Result<()> {
        match name.0.as_slice() {
            [column] => self.check_column(column),
            [qualifier, column] => {
                if !self.is_known_relation(&qualifier.value) {
                    return Err(AskbenchError::validation(format!(
                        "Unknown table: {}",
                        qualifier.value
                    )));
                }
                self.check_column(column)
            }
            _ => Err(AskbenchError::validation(format!(
                "Unknown column: {}",
                name
            ))),
        }
    }

    fn check_order_by(&mut self, exprs: &[OrderByExpr]) -> Result<()> {
        for order_expr in exprs {
            self.check_expr(&order_expr.expr)?;
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Identifier(ident) => self.check_column(ident),
            Expr::CompoundIdentifier(idents) => match idents.as_slice() {
                [qualifier, column] => {
                    if !self.is_known_relation(&qualifier.value) {
                        return Err(AskbenchError::validation(format!(
                            "Unknown table: {}",
                            qualifier.value
                        )));
                    }
                    self.check_column(column)
                }
                _ => Err(AskbenchError::validation(format!(
                    "Unknown column: {}",
                    expr
                ))),
            },
            Expr::Value(value) => self.check_value(value),
            Expr::BinaryOp { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
            Expr::UnaryOp { expr, .. } => self.check_expr(expr),
            Expr::Nested(expr) => self.check_expr(expr),
            Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::IsTrue(expr)
            | Expr::IsNotTrue(expr)
            | Expr::IsFalse(expr)
            | Expr::IsNotFalse(expr)
            | Expr::IsUnknown(expr)
            | Expr::IsNotUnknown(expr) => self.check_expr(expr),
            Expr::Between {
                expr, low, high, ..
            } => {
                self.check_expr(expr)?;
                self.check_expr(low)?;
                self.check_expr(high)
            }
            Expr::InList { expr, list, .. } => {
                self.check_expr(expr)?;
                for item in list {
                    self.check_expr(item)?;
                }
                Ok(())
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.check_expr(expr)?;
                self.check_query(subquery)
            }
            Expr::Exists { subquery, .. } => self.check_query(subquery),
            Expr::Subquery(query) => self.check_query(query),
            Expr::Like { expr, pattern, .. }
            | Expr::ILike { expr, pattern, .. }
            | Expr::SimilarTo { expr, pattern, .. } => {
                self.check_expr(expr)?;
                self.check_expr(pattern)
            }
            Expr::Cast { expr, .. } => self.check_expr(expr),
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                if let Some(operand) = operand {
                    self.check_expr(operand)?;
                }
                for condition in conditions {
                    self.check_expr(condition)?;
                }
                for result in results {
                    self.check_expr(result)?;
                }
                if let Some(else_result) = else_result {
                    self.check_expr(else_result)?;
                }
                Ok(())
            }
            Expr::Function(function) => self.check_function(function),
            Expr::Tuple(exprs) => {
                for expr in exprs {
                    self.check_expr(expr)?;
                }
                Ok(())
            }
            Expr::Floor { expr, .. } | Expr::Ceil { expr, .. } => self.check_expr(expr),
            Expr::Position { expr, r#in } => {
                self.check_expr(expr)?;
                self.check_expr(r#in)
            }
            Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                self.check_expr(expr)?;
                if let Some(from) = substring_from {
                    self.check_expr(from)?;
                }
                if let Some(length) = substring_for {
                    self.check_expr(length)?;
                }
                Ok(())
            }
            Expr::Trim {
                expr, trim_what, ..
            } => {
                self.check_expr(expr)?;
                if let Some(what) = trim_what {
                    self.check_expr(what)?;
                }
                Ok(())
            }
            Expr::Wildcard => Ok(()),
            Expr::QualifiedWildcard(name) => self.resolve_relation(name),
            _ => Err(AskbenchError::validation(format!(
                "Unsupported expression: {}",
                expr
            ))),
        }
    }

    fn check_value(&mut self, value: &Value) -> Result<()> {
        if let Value::Placeholder(placeholder) = value {
            // Positional counting only works for plain `?`
            if placeholder != "?" {
                return Err(AskbenchError::validation(format!(
                    "Unsupported placeholder style: {} (use ?)",
                    placeholder
                )));
            }
            self.placeholders += 1;
        }
        Ok(())
    }

    fn check_function(&mut self, function: &Function) -> Result<()> {
        self.check_function_arguments(&function.parameters)?;
        self.check_function_arguments(&function.args)?;
        if let Some(filter) = &function.filter {
            self.check_expr(filter)?;
        }
        self.check_order_by(&function.within_group)?;
        match &function.over {
            Some(WindowType::WindowSpec(spec)) => {
                for expr in &spec.partition_by {
                    self.check_expr(expr)?;
                }
                self.check_order_by(&spec.order_by)?;
            }
            Some(WindowType::NamedWindow(_)) => {
                return Err(AskbenchError::validation("Named windows are not supported"));
            }
            None => {}
        }
        Ok(())
    }

    fn check_function_arguments(&mut self, arguments: &FunctionArguments) -> Result<()> {
        match arguments {
            FunctionArguments::None => Ok(()),
            FunctionArguments::Subquery(query) => self.check_query(query),
            FunctionArguments::List(list) => {
                for arg in &list.args {
                    let arg_expr = match arg {
                        FunctionArg::Named { arg, .. } => arg,
                        FunctionArg::Unnamed(arg) => arg,
                    };
                    match arg_expr {
                        FunctionArgExpr::Expr(expr) => self.check_expr(expr)?,
                        FunctionArgExpr::Wildcard => {}
                        FunctionArgExpr::QualifiedWildcard(name) => self.resolve_relation(name)?,
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve_relation(&self, name: &ObjectName) -> Result<()> {
        if name.0.len() == 1 && self.is_known_relation(&name.0[0].value) {
            Ok(())
        } else {
            Err(AskbenchError::validation(format!("Unknown table: {}", name)))
        }
    }

    fn is_known_relation(&self, name: &str) -> bool {
        self.schema.has_table(name) || self.relations.contains(&name.to_lowercase())
    }

    fn check_column(&self, ident: &Ident) -> Result<()> {
        let name = &ident.value;
        if self.schema.has_column(name) || self.output_aliases.contains(&name.to_lowercase()) {
            Ok(())
        } else {
            Err(AskbenchError::validation(format!("Unknown column: {}", name)))
        }
    }
}
