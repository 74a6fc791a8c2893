#![allow(dead_code)]

use std::sync::Mutex;

use procmodel::prelude::*;
use rust_decimal::Decimal;

#[derive(Model, Debug, Clone, Default, PartialEq)]
pub struct User {
    #[procmodel(return_value)]
    pub id: i32,
    #[procmodel(alias = "FullName")]
    pub name: String,
    #[procmodel(output(size = 4))]
    pub score: Option<i32>,
}

#[derive(SqlEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tier {
    #[default]
    Free = 0,
    Pro = 2,
    Enterprise = 9,
}

#[derive(Model, Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub balance: Decimal,
    pub tier: Tier,
    pub nickname: Option<String>,
    pub r#type: u8,
    #[procmodel(ignore)]
    pub scratch: Vec<String>,
}

/// One recorded executor call.
#[derive(Debug, Clone)]
pub struct Call {
    pub connection: String,
    pub procedure: String,
    pub parameters: Vec<BoundParameter>,
}

type Responder = Box<dyn Fn(&[BoundParameter]) -> Result<ProcedureOutcome> + Send + Sync>;

/// In-memory executor: records every call and answers through a closure.
pub struct ScriptedExecutor {
    calls: Mutex<Vec<Call>>,
    respond: Responder,
}

impl ScriptedExecutor {
    pub fn new(
        respond: impl Fn(&[BoundParameter]) -> Result<ProcedureOutcome> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Always answer with the same outcome.
    pub fn returning(outcome: ProcedureOutcome) -> Self {
        Self::new(move |_| Ok(outcome.clone()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls().pop().expect("no call recorded")
    }
}

impl ProcedureExecutor for ScriptedExecutor {
    fn execute(
        &self,
        connection: &str,
        procedure: &str,
        parameters: &[BoundParameter],
    ) -> Result<ProcedureOutcome> {
        self.calls.lock().unwrap().push(Call {
            connection: connection.to_string(),
            procedure: procedure.to_string(),
            parameters: parameters.to_vec(),
        });
        (self.respond)(parameters)
    }
}

/// Echo every input parameter back as one row, and every output parameter
/// back with the value it was sent with.
pub fn echo(parameters: &[BoundParameter]) -> ProcedureOutcome {
    let row = Row::from_pairs(
        parameters
            .iter()
            .filter(|p| p.direction == Direction::Input)
            .map(|p| (p.bare_name().to_string(), p.value.clone())),
    );
    let outputs = parameters
        .iter()
        .filter(|p| p.direction == Direction::Output)
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect();
    let return_value = parameters
        .iter()
        .find(|p| p.direction == Direction::ReturnValue)
        .and_then(|p| p.value.as_i64())
        .and_then(|v| i32::try_from(v).ok());
    ProcedureOutcome {
        rows: vec![row],
        outputs,
        return_value,
        rows_affected: 1,
    }
}

pub fn layer(executor: ScriptedExecutor) -> SqlLayer<ScriptedExecutor> {
    let connections = ConnectionStrings::with("main", "Server=main;Integrated Security=true;")
        .expect("valid connection");
    SqlLayer::new(executor, Arc::new(connections))
}
