mod common;

use common::{ScriptedExecutor, Tier, User, echo, layer};
use procmodel::prelude::*;

#[test]
fn save_model_writes_outputs_and_return_back() {
    let executor = ScriptedExecutor::returning(ProcedureOutcome {
        outputs: OutputValues::new().with("@score", 42_i32),
        return_value: Some(7),
        rows_affected: 1,
        ..ProcedureOutcome::default()
    });
    let layer = layer(executor);

    let mut user = User {
        name: "Ann".to_string(),
        ..User::default()
    };
    let affected = layer.save_model("usp_SaveUser", &mut user).unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        user,
        User {
            id: 7,
            name: "Ann".to_string(),
            score: Some(42),
        }
    );

    let call = layer.executor().last_call();
    assert_eq!(call.procedure, "usp_SaveUser");
    assert_eq!(call.connection, "Server=main;Integrated Security=true;");
    let names: Vec<_> = call.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["@id", "@FullName", "@score"]);
    assert_eq!(call.parameters[1].value, Value::from("Ann"));
}

#[test]
fn save_model_leaves_fields_alone_without_values() {
    let layer = layer(ScriptedExecutor::returning(ProcedureOutcome {
        outputs: OutputValues::new().with("@score", Value::Null),
        ..ProcedureOutcome::default()
    }));
    let mut user = User {
        id: 3,
        name: "Ann".to_string(),
        score: Some(1),
    };
    layer.save_model("usp_SaveUser", &mut user).unwrap();
    assert_eq!(user.id, 3);
    assert_eq!(user.score, Some(1));
}

#[test]
fn load_models_appends_return_slot_and_outputs_then_broadcasts() {
    let executor = ScriptedExecutor::returning(ProcedureOutcome {
        rows: vec![
            Row::from_pairs([("FullName", Value::from("Ann"))]),
            Row::from_pairs([("name", Value::from("Bo"))]),
        ],
        outputs: OutputValues::new().with("@Score", 42_i32),
        return_value: Some(7),
        rows_affected: 0,
    });
    let layer = layer(executor);

    let users: Vec<User> = layer
        .load_models("usp_ListUsers", &[BoundParameter::input("Team", "red")])
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "Ann");
    assert_eq!(users[1].name, "Bo");
    assert!(users.iter().all(|u| u.id == 7 && u.score == Some(42)));

    let call = layer.executor().last_call();
    let shape: Vec<_> = call
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.direction))
        .collect();
    assert_eq!(
        shape,
        [
            ("@Team", Direction::Input),
            ("@RETURN_VALUE", Direction::ReturnValue),
            ("@score", Direction::Output),
        ]
    );
    assert_eq!(call.parameters[2].size, 4);
}

#[test]
fn load_model_returns_default_when_no_rows() {
    let layer = layer(ScriptedExecutor::returning(ProcedureOutcome {
        return_value: Some(7),
        ..ProcedureOutcome::default()
    }));
    let user: User = layer.load_model("usp_GetUser", &[]).unwrap();
    assert_eq!(user, User::default());
}

#[test]
fn load_model_takes_the_first_row() {
    let layer = layer(ScriptedExecutor::returning(ProcedureOutcome::with_rows(vec![
        Row::from_pairs([("name", Value::from("first"))]),
        Row::from_pairs([("name", Value::from("second"))]),
    ])));
    let user: User = layer.load_model("usp_GetUser", &[]).unwrap();
    assert_eq!(user.name, "first");
}

#[test]
fn echo_round_trip_through_layer() {
    let layer = layer(ScriptedExecutor::new(|params| Ok(echo(params))));
    let mut user = User {
        id: 11,
        name: "Cy".to_string(),
        score: Some(5),
    };
    layer.save_model("usp_Echo", &mut user).unwrap();
    assert_eq!(
        user,
        User {
            id: 11,
            name: "Cy".to_string(),
            score: Some(5),
        }
    );
}

#[test]
fn execute_scalar_reads_first_column_best_effort() {
    let rows = |value: Value| {
        ProcedureOutcome::with_rows(vec![Row::from_pairs([
            ("value", value),
            ("ignored", Value::Int(0)),
        ])])
    };

    let tiers = layer(ScriptedExecutor::returning(rows(Value::Int(9))));
    assert_eq!(
        tiers.execute_scalar("usp_Tier", &[], Tier::Free).unwrap(),
        Tier::Enterprise
    );

    let undefined = layer(ScriptedExecutor::returning(rows(Value::Int(5))));
    assert_eq!(
        undefined.execute_scalar("usp_Tier", &[], Tier::Pro).unwrap(),
        Tier::Pro
    );

    let nulls = layer(ScriptedExecutor::returning(rows(Value::Null)));
    assert_eq!(
        nulls.execute_scalar("usp_Count", &[], Some(3_i64)).unwrap(),
        Some(3)
    );

    let empty = layer(ScriptedExecutor::returning(ProcedureOutcome::default()));
    assert_eq!(
        empty
            .execute_scalar("usp_Name", &[], String::from("nobody"))
            .unwrap(),
        "nobody"
    );
}

#[test]
fn executor_errors_pass_through_unchanged() {
    let layer = layer(ScriptedExecutor::new(|_| {
        Err(Error::execution(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "server unreachable",
        )))
    }));

    let err = layer.save("usp_Touch", &[]).unwrap_err();
    match err {
        Error::Execution(source) => assert_eq!(source.to_string(), "server unreachable"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(layer.load_models::<User>("usp_List", &[]).is_err());
}

#[test]
fn configuration_errors_stop_before_execution() {
    #[derive(Model, Debug, Default)]
    struct Broken {
        #[procmodel(output)]
        blob: Vec<u8>,
    }

    let layer = layer(ScriptedExecutor::returning(ProcedureOutcome::default()));
    let err = layer.load_models::<Broken>("usp_Blob", &[]).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(layer.executor().calls().is_empty());
}

#[test]
fn calls_follow_the_current_connection() {
    let layer = layer(ScriptedExecutor::returning(ProcedureOutcome::default()));
    layer
        .connections()
        .upsert_settings(
            "reporting",
            &SqlConnectionString::with_credentials("replica", "report", "pw")
                .initial_catalog("Reports"),
        )
        .unwrap();

    layer.save("usp_A", &[]).unwrap();
    layer.connections().set_current("reporting").unwrap();
    layer.save("usp_B", &[]).unwrap();
    layer.save_on("Server=explicit;", "usp_C", &[]).unwrap();

    let connections: Vec<_> = layer
        .executor()
        .calls()
        .into_iter()
        .map(|c| c.connection)
        .collect();
    assert_eq!(
        connections,
        [
            "Server=main;Integrated Security=true;",
            "Server=replica;Integrated Security=false;Initial Catalog=Reports;Application Name=SqlDataLayer;User ID=report;Password=pw;",
            "Server=explicit;",
        ]
    );
}

#[test]
fn registry_loads_from_json_configuration() {
    let connections = ConnectionStrings::from_json(
        r#"{
            "connections": [
                { "key": "main", "connection": { "server": "db01", "integrated_security": true } },
                { "key": "audit", "connection": "Server=audit;" }
            ]
        }"#,
    )
    .unwrap();
    let layer = SqlLayer::new(
        ScriptedExecutor::returning(ProcedureOutcome::default()),
        Arc::new(connections),
    );

    layer.save("usp_A", &[]).unwrap();
    assert_eq!(
        layer.executor().last_call().connection,
        "Server=db01;Integrated Security=true;Initial Catalog=Master;Application Name=SqlDataLayer;"
    );
}
