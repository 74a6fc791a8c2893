//! Stored-procedure calls over a [`ProcedureExecutor`].
//!
//! `SqlLayer` strings the binding engine together: build parameters from a
//! model, run the procedure, hydrate or write back the results. Every call has
//! a form using the registry's current connection and an `*_on` form taking a
//! connection string explicitly.

use std::sync::Arc;

use procmodel_core::error::check_argument;
use procmodel_core::{
    BoundParameter, ConnectionStrings, Error, Model, ProcedureExecutor, ProcedureOutcome, Result,
    SqlField, apply_call_values, build_parameters, hydrate, hydrate_one, output_parameters,
};

/// Procedure-calling front end.
///
/// # Example
///
/// ```ignore
/// let connections = Arc::new(ConnectionStrings::with("main", "Server=db;Integrated Security=true;")?);
/// let layer = SqlLayer::new(MyExecutor::default(), connections);
///
/// let mut user = User { name: "Ann".into(), ..User::default() };
/// layer.save_model("usp_SaveUser", &mut user)?;
///
/// let users: Vec<User> = layer.load_models("usp_ListUsers", &[])?;
/// ```
#[derive(Debug)]
pub struct SqlLayer<E: ProcedureExecutor> {
    executor: E,
    connections: Arc<ConnectionStrings>,
}

impl<E: ProcedureExecutor> SqlLayer<E> {
    /// Create a layer over an executor and a connection registry.
    pub fn new(executor: E, connections: Arc<ConnectionStrings>) -> Self {
        Self {
            executor,
            connections,
        }
    }

    /// The connection registry.
    pub fn connections(&self) -> &Arc<ConnectionStrings> {
        &self.connections
    }

    /// The executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn current_connection(&self) -> Result<String> {
        self.connections
            .current()
            .ok_or_else(|| Error::argument("connection", "no current connection string is set"))
    }

    fn run(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<ProcedureOutcome> {
        check_argument(connection, "connection")?;
        check_argument(procedure, "procedure")?;

        let outcome = self.executor.execute(connection, procedure, parameters)?;
        tracing::debug!(
            procedure,
            rows = outcome.rows.len(),
            outputs = outcome.outputs.len(),
            return_value = outcome.return_value,
            rows_affected = outcome.rows_affected,
            "Procedure executed"
        );
        Ok(outcome)
    }

    /// Save a model on the current connection. See [`SqlLayer::save_model_on`].
    pub fn save_model<M: Model>(&self, procedure: &str, model: &mut M) -> Result<u64> {
        let connection = self.current_connection()?;
        self.save_model_on(&connection, procedure, model)
    }

    /// Call `procedure` with the model's parameters, then write output
    /// parameter values and the return value back into the model.
    ///
    /// Returns the number of rows affected.
    #[tracing::instrument(
        level = "debug",
        skip(self, connection, model),
        fields(model = M::MODEL_NAME)
    )]
    pub fn save_model_on<M: Model>(
        &self,
        connection: &str,
        procedure: &str,
        model: &mut M,
    ) -> Result<u64> {
        let descriptor = M::descriptor()?;
        let parameters = build_parameters(model, &descriptor)?;
        let outcome = self.run(connection, procedure, &parameters)?;
        apply_call_values(model, &descriptor, &outcome.outputs, outcome.return_value)?;
        Ok(outcome.rows_affected)
    }

    /// Run a procedure on the current connection. See [`SqlLayer::save_on`].
    pub fn save(&self, procedure: &str, parameters: &[BoundParameter]) -> Result<u64> {
        let connection = self.current_connection()?;
        self.save_on(&connection, procedure, parameters)
    }

    /// Run a procedure with caller-supplied parameters, ignoring any result
    /// set. Returns the number of rows affected.
    #[tracing::instrument(
        level = "debug",
        skip(self, connection, parameters),
        fields(parameters = parameters.len())
    )]
    pub fn save_on(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<u64> {
        Ok(self.run(connection, procedure, parameters)?.rows_affected)
    }

    /// Load models on the current connection. See [`SqlLayer::load_models_on`].
    pub fn load_models<M: Model>(
        &self,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<Vec<M>> {
        let connection = self.current_connection()?;
        self.load_models_on(&connection, procedure, parameters)
    }

    /// Call `procedure` and hydrate one model per returned row.
    ///
    /// A return value slot and the model's output parameters are appended to
    /// `parameters`; their values are copied into every hydrated model.
    #[tracing::instrument(
        level = "debug",
        skip(self, connection, parameters),
        fields(model = M::MODEL_NAME, parameters = parameters.len())
    )]
    pub fn load_models_on<M: Model>(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<Vec<M>> {
        let descriptor = M::descriptor()?;
        let call_parameters = load_parameters(parameters, &output_parameters(&descriptor));
        let outcome = self.run(connection, procedure, &call_parameters)?;
        hydrate(&descriptor, &outcome.rows, &outcome.outputs, outcome.return_value)
    }

    /// Load a single model on the current connection. See
    /// [`SqlLayer::load_model_on`].
    pub fn load_model<M: Model>(&self, procedure: &str, parameters: &[BoundParameter]) -> Result<M> {
        let connection = self.current_connection()?;
        self.load_model_on(&connection, procedure, parameters)
    }

    /// Like [`SqlLayer::load_models_on`], keeping the first model.
    ///
    /// Returns `M::default()` when the procedure returns no rows.
    #[tracing::instrument(
        level = "debug",
        skip(self, connection, parameters),
        fields(model = M::MODEL_NAME, parameters = parameters.len())
    )]
    pub fn load_model_on<M: Model>(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<M> {
        let descriptor = M::descriptor()?;
        let call_parameters = load_parameters(parameters, &output_parameters(&descriptor));
        let outcome = self.run(connection, procedure, &call_parameters)?;
        hydrate_one(&descriptor, &outcome.rows, &outcome.outputs, outcome.return_value)
    }

    /// Scalar call on the current connection. See
    /// [`SqlLayer::execute_scalar_on`].
    pub fn execute_scalar<T: SqlField>(
        &self,
        procedure: &str,
        parameters: &[BoundParameter],
        default: T,
    ) -> Result<T> {
        let connection = self.current_connection()?;
        self.execute_scalar_on(&connection, procedure, parameters, default)
    }

    /// First column of the first row, converted best effort.
    ///
    /// No rows, a null value, or a value that does not convert to `T`
    /// (including an undefined enum discriminant) yields `default`.
    #[tracing::instrument(
        level = "debug",
        skip(self, connection, parameters, default),
        fields(parameters = parameters.len())
    )]
    pub fn execute_scalar_on<T: SqlField>(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
        default: T,
    ) -> Result<T> {
        let outcome = self.run(connection, procedure, parameters)?;
        Ok(match outcome.rows.first() {
            Some(row) => row.get_or_at(0, default),
            None => default,
        })
    }
}

fn load_parameters(parameters: &[BoundParameter], outputs: &[BoundParameter]) -> Vec<BoundParameter> {
    let mut all = Vec::with_capacity(parameters.len() + outputs.len() + 1);
    all.extend_from_slice(parameters);
    all.push(BoundParameter::return_value());
    all.extend_from_slice(outputs);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use procmodel_core::{Direction, Row, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String, Vec<BoundParameter>)>>,
        outcome: ProcedureOutcome,
    }

    impl ProcedureExecutor for Recorder {
        fn execute(
            &self,
            connection: &str,
            procedure: &str,
            parameters: &[BoundParameter],
        ) -> Result<ProcedureOutcome> {
            self.calls.lock().unwrap().push((
                connection.to_string(),
                procedure.to_string(),
                parameters.to_vec(),
            ));
            Ok(self.outcome.clone())
        }
    }

    fn layer(outcome: ProcedureOutcome) -> SqlLayer<Recorder> {
        let connections = Arc::new(ConnectionStrings::with("main", "Server=a;").unwrap());
        SqlLayer::new(
            Recorder {
                outcome,
                ..Recorder::default()
            },
            connections,
        )
    }

    #[test]
    fn test_save_uses_current_connection() {
        let layer = layer(ProcedureOutcome {
            rows_affected: 3,
            ..ProcedureOutcome::default()
        });
        let affected = layer
            .save("usp_Touch", &[BoundParameter::input("Id", 1_i32)])
            .unwrap();
        assert_eq!(affected, 3);

        let calls = layer.executor().calls.lock().unwrap();
        assert_eq!(calls[0].0, "Server=a;");
        assert_eq!(calls[0].1, "usp_Touch");
        assert_eq!(calls[0].2[0].name, "@Id");
    }

    #[test]
    fn test_blank_procedure_rejected_before_execution() {
        let layer = layer(ProcedureOutcome::default());
        assert!(matches!(
            layer.save("  ", &[]),
            Err(Error::Argument { ref name, .. }) if name == "procedure"
        ));
        assert!(matches!(
            layer.save_on("", "usp_Touch", &[]),
            Err(Error::Argument { ref name, .. }) if name == "connection"
        ));
        assert!(layer.executor().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_current_connection() {
        let layer = SqlLayer::new(Recorder::default(), Arc::new(ConnectionStrings::new()));
        assert!(matches!(
            layer.save("usp_Touch", &[]),
            Err(Error::Argument { ref name, .. }) if name == "connection"
        ));
    }

    #[test]
    fn test_execute_scalar() {
        let layer = layer(ProcedureOutcome::with_rows(vec![Row::from_pairs([
            ("Total", Value::BigInt(12)),
            ("Other", Value::Int(1)),
        ])]));
        assert_eq!(layer.execute_scalar("usp_Count", &[], 0_i32).unwrap(), 12);

        let empty = layer_with_rows(vec![]);
        assert_eq!(empty.execute_scalar("usp_Count", &[], -1_i32).unwrap(), -1);

        let text = layer_with_rows(vec![Row::from_pairs([("v", Value::from("abc"))])]);
        assert_eq!(text.execute_scalar("usp_Count", &[], 5_i32).unwrap(), 5);
    }

    fn layer_with_rows(rows: Vec<Row>) -> SqlLayer<Recorder> {
        layer(ProcedureOutcome::with_rows(rows))
    }

    #[test]
    fn test_load_parameters_append_return_slot_then_outputs() {
        let outputs = [BoundParameter::output("Score", procmodel_core::SqlDbType::Int, 4)];
        let all = load_parameters(&[BoundParameter::input("Id", 1_i32)], &outputs);
        let directions: Vec<_> = all.iter().map(|p| p.direction).collect();
        assert_eq!(
            directions,
            [Direction::Input, Direction::ReturnValue, Direction::Output]
        );
    }
}
