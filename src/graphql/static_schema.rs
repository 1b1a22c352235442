//! A table-driven executor.
//!
//! Resolves top-level fields of any operation from a fixed value table. It
//! parses documents with a real GraphQL parser, selects the requested
//! operation and checks variables against scalar declarations, which is
//! enough to drive every transport end to end without a full schema.

use async_graphql_parser::types::{BaseType, OperationType, Selection, SelectionSet, Type};
use async_graphql_parser::{parse_query, Pos};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::graphql::error::{ErrorList, GraphError, PARSE_FAILED, VALIDATION_FAILED};
use crate::graphql::executor::{GraphExecutor, OperationContext, OperationKind};
use crate::graphql::params::ParameterBundle;
use crate::graphql::response::GraphResponse;
use crate::observability::tracing::TraceContext;

/// Selected root fields as (response key, field name).
#[derive(Debug, Clone)]
struct StaticPlan {
    fields: Vec<(String, String)>,
}

/// Executor answering from a fixed field → value table.
#[derive(Debug, Clone, Default)]
pub struct StaticExecutor {
    fields: Map<String, Value>,
}

impl StaticExecutor {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Convenience constructor from `(field, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn collect_fields(
        &self,
        set: &SelectionSet,
        kind: OperationKind,
        out: &mut Vec<(String, String)>,
    ) -> Result<(), GraphError> {
        for item in &set.items {
            match &item.node {
                Selection::Field(field) => {
                    let name = field.node.name.node.as_str();
                    let key = field
                        .node
                        .alias
                        .as_ref()
                        .map_or(name, |alias| alias.node.as_str());
                    if name != "__typename" && !self.fields.contains_key(name) {
                        return Err(at(
                            GraphError::protocol(
                                format!(
                                    "Cannot query field \"{name}\" on type \"{}\".",
                                    root_type(kind)
                                ),
                                VALIDATION_FAILED,
                            ),
                            field.pos,
                        ));
                    }
                    out.push((key.to_string(), name.to_string()));
                }
                Selection::InlineFragment(fragment) => {
                    self.collect_fields(&fragment.node.selection_set.node, kind, out)?;
                }
                Selection::FragmentSpread(spread) => {
                    return Err(at(
                        GraphError::protocol(
                            "fragment spreads are not supported",
                            VALIDATION_FAILED,
                        ),
                        spread.pos,
                    ));
                }
            }
        }
        Ok(())
    }
}

fn at(err: GraphError, pos: Pos) -> GraphError {
    err.with_location(pos.line, pos.column)
}

fn root_type(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Query => "Query",
        OperationKind::Mutation => "Mutation",
        OperationKind::Subscription => "Subscription",
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check one variable value against its declared type.
///
/// A `null` at a position that has an upload bound to it counts as present.
fn check_variable(
    ty: &Type,
    value: Option<&Value>,
    path: &str,
    params: &ParameterBundle,
) -> Result<(), String> {
    let value = match value {
        None | Some(Value::Null) => {
            if ty.nullable || params.upload_at(path).is_some() {
                return Ok(());
            }
            return Err("must be defined".to_string());
        }
        Some(value) => value,
    };

    match &ty.base {
        BaseType::List(inner) => match value {
            Value::Array(items) => items.iter().enumerate().try_for_each(|(i, item)| {
                check_variable(inner, Some(item), &format!("{path}.{i}"), params)
            }),
            single => check_variable(inner, Some(single), path, params),
        },
        BaseType::Named(name) => {
            let ok = match name.as_str() {
                "Int" => matches!(value, Value::Number(n) if n.is_i64() || n.is_u64()),
                "Float" => value.is_number(),
                "String" => value.is_string(),
                "ID" => value.is_string() || value.is_number(),
                "Boolean" => value.is_boolean(),
                _ => true,
            };
            if ok {
                Ok(())
            } else {
                Err(format!("cannot use {} as {}", json_kind(value), name.as_str()))
            }
        }
    }
}

#[async_trait]
impl GraphExecutor for StaticExecutor {
    fn create_operation_context(
        &self,
        _trace: &TraceContext,
        params: ParameterBundle,
    ) -> Result<OperationContext, ErrorList> {
        if params.query.trim().is_empty() {
            return Err(vec![GraphError::protocol(
                "no operation provided",
                VALIDATION_FAILED,
            )]);
        }

        let doc = parse_query(&params.query).map_err(|e| {
            let err = e
                .positions()
                .fold(GraphError::protocol(e.to_string(), PARSE_FAILED), at);
            vec![err]
        })?;

        let mut operations = doc.operations.iter();
        let selected = if params.operation_name.is_empty() {
            match (operations.next(), operations.next()) {
                (Some(op), None) => op,
                (None, _) => {
                    return Err(vec![GraphError::protocol(
                        "no operation provided",
                        VALIDATION_FAILED,
                    )])
                }
                _ => {
                    return Err(vec![GraphError::protocol(
                        "an operation name is required when the document has several operations",
                        VALIDATION_FAILED,
                    )])
                }
            }
        } else {
            let wanted = params.operation_name.as_str();
            operations
                .find(|(name, _)| name.map(|n| n.as_str()) == Some(wanted))
                .ok_or_else(|| {
                    vec![GraphError::protocol(
                        format!("operation {wanted} not found"),
                        VALIDATION_FAILED,
                    )]
                })?
        };
        let (name, operation) = selected;

        let kind = match operation.node.ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        };

        let mut errors = Vec::new();
        for definition in &operation.node.variable_definitions {
            let var = definition.node.name.node.as_str();
            let value = params.variables.get(var);
            let defaulted = value.is_none() && definition.node.default_value.is_some();
            if defaulted {
                continue;
            }
            if let Err(message) = check_variable(
                &definition.node.var_type.node,
                value,
                &format!("variables.{var}"),
                &params,
            ) {
                errors.push(
                    GraphError::protocol(message, VALIDATION_FAILED)
                        .with_path(vec![json!("variable"), json!(var)]),
                );
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut fields = Vec::new();
        self.collect_fields(&operation.node.selection_set.node, kind, &mut fields)
            .map_err(|e| vec![e])?;

        let operation_name = name.map(|n| n.to_string());
        let mut ctx = OperationContext::new(params, kind);
        ctx.operation_name = operation_name;
        ctx.extensions.insert(StaticPlan { fields });
        Ok(ctx)
    }

    async fn dispatch_operation(
        &self,
        trace: &TraceContext,
        operation: OperationContext,
    ) -> GraphResponse {
        let Some(plan) = operation.extensions.get::<StaticPlan>() else {
            return GraphResponse::error_message("operation was not prepared by this executor");
        };

        let mut data = Map::new();
        for (key, field) in &plan.fields {
            let value = if field == "__typename" {
                Value::String(root_type(operation.kind).to_string())
            } else {
                self.fields.get(field).cloned().unwrap_or(Value::Null)
            };
            data.insert(key.clone(), value);
        }

        tracing::debug!(
            request_id = %trace.request_id(),
            kind = operation.kind.as_str(),
            fields = plan.fields.len(),
            uploads = operation.params.uploads.len(),
            "Static operation resolved"
        );
        GraphResponse::data(Value::Object(data))
    }

    fn dispatch_error(&self, _trace: &TraceContext, errors: ErrorList) -> GraphResponse {
        GraphResponse::errors(errors)
    }
}
