use std::collections::BTreeSet;

use querykit::condition::InCondition;
use querykit::{
    CaseArg, CaseX, Condition, Expr, Operand, Params, Query, QueryBuilder, Value, WhenThen, Where,
    cond, hash, list,
};
use regex::Regex;

fn placeholders(sql: &str) -> BTreeSet<String> {
    let re = Regex::new(r":[A-Za-z_][A-Za-z0-9_]*").unwrap();
    let mut names = BTreeSet::new();
    for m in re.find_iter(sql) {
        // `::type` casts are not placeholders.
        if m.start() > 0 && sql.as_bytes()[m.start() - 1] == b':' {
            continue;
        }
        names.insert(m.as_str().to_string());
    }
    names
}

fn param_names(params: &Params) -> BTreeSet<String> {
    params.names().map(str::to_string).collect()
}

fn busy_query() -> Query {
    let sub = Query::new()
        .select(["customer_id"])
        .from(["orders"])
        .where_(cond![">", "total", 100]);
    Query::new()
        .select(["id", "name"])
        .from(["customer"])
        .where_(hash! {"status" => "active", "age" => [18, 19, 20]})
        .and_where(cond!["in", "id", sub])
        .and_where(cond!["like", "name", ["a", "b"]])
        .and_where(cond!["between", "created_at", "2024-01-01", "2024-12-31"])
        .and_where(Expr::raw_with_params("score > :pv0", [(":pv0", 7)]))
        .and_where(cond!["in", ["id", "kind"], [list![1, "a"], list![2, None::<i32>]]])
        .order_by("id DESC")
        .limit(10)
}

/// Raw fragments whose parameter names collide with each other and with suffixed names.
fn suffixed_raw_query() -> Query {
    Query::new().from(["t"]).where_(cond![
        "and",
        Expr::raw_with_params("x = :id", [(":id", 0)]),
        Expr::raw_with_params("a = :id AND b = :id_0", [(":id", 1), (":id_0", 2)]),
    ])
}

/// A sub-query carrying its own named parameter next to a raw fragment reusing the name.
fn sub_query_params_query() -> Query {
    let sub = Query::new()
        .select(["id"])
        .from(["doc"])
        .where_("owner = :owner")
        .add_params([("owner", 7)]);
    Query::new()
        .from(["t"])
        .where_(cond!["in", "id", sub])
        .and_where(Expr::raw_with_params("editor = :owner", [("owner", 9)]))
        .and_where(hash! {"kind" => "note"})
}

fn bijection_cases() -> Vec<Query> {
    vec![busy_query(), suffixed_raw_query(), sub_query_params_query()]
}

#[test]
fn compiling_twice_is_identical() {
    let query = busy_query();
    for qb in [QueryBuilder::postgres(), QueryBuilder::mysql(), QueryBuilder::sqlite()] {
        let first = qb.build(&query).unwrap();
        let second = qb.build(&query).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn every_placeholder_is_bound_exactly_once() {
    for query in bijection_cases() {
        for qb in [QueryBuilder::postgres(), QueryBuilder::mysql(), QueryBuilder::sqlite()] {
            let (sql, params) = qb.build(&query).unwrap();
            let names: Vec<&str> = params.names().collect();
            let unique: BTreeSet<&str> = names.iter().copied().collect();
            assert_eq!(names.len(), unique.len(), "duplicate names in {names:?}");
            assert_eq!(placeholders(&sql), param_names(&params), "{sql}");
        }
    }
}

#[test]
fn renamed_raw_parameters_keep_their_values() {
    let (sql, params) = QueryBuilder::postgres().build(&suffixed_raw_query()).unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "t" WHERE (x = :id) AND (a = :id_0 AND b = :id_0_0)"#
    );
    assert_eq!(params.value(":id"), Some(&Value::Int(0)));
    assert_eq!(params.value(":id_0"), Some(&Value::Int(1)));
    assert_eq!(params.value(":id_0_0"), Some(&Value::Int(2)));
    assert_eq!(params.len(), 3);
}

#[test]
fn sub_query_params_merge_into_the_statement() {
    let (sql, params) = QueryBuilder::postgres().build(&sub_query_params_query()).unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "t" WHERE ("id" IN (SELECT "id" FROM "doc" WHERE owner = :owner)) AND (editor = :owner_0) AND ("kind"=:pv2)"#
    );
    assert_eq!(params.value(":owner"), Some(&Value::Int(7)));
    assert_eq!(params.value(":owner_0"), Some(&Value::Int(9)));
    assert_eq!(params.value(":pv2"), Some(&Value::String("note".into())));
}

#[test]
fn conflicting_sub_query_params_are_rejected() {
    let sub = Query::new()
        .select(["id"])
        .from(["doc"])
        .where_("owner = :owner")
        .add_params([("owner", 2)]);
    let same = sub.clone();
    let query = Query::new()
        .from(["t"])
        .where_(cond!["in", "id", sub])
        .and_where("owner = :owner")
        .add_params([("owner", 1)]);
    let err = QueryBuilder::postgres().build(&query).unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(err.to_string(), "Parameter ':owner' is already bound to a different value.");

    let agreeing = Query::new()
        .from(["t"])
        .where_(cond!["exists", same])
        .add_params([("owner", 2)]);
    let (_, params) = QueryBuilder::postgres().build(&agreeing).unwrap();
    assert_eq!(params.len(), 1);
}

#[test]
fn raw_parameter_collision_is_renamed() {
    let (sql, params) = QueryBuilder::postgres().build(&busy_query()).unwrap();
    assert!(sql.contains("score > :pv0_0"), "{sql}");
    assert_eq!(params.value(":pv0_0"), Some(&Value::Int(7)));
    assert_eq!(params.value(":pv0"), Some(&Value::String("active".into())));
}

#[test]
fn hash_and_operator_format_agree() {
    let qb = QueryBuilder::postgres();
    let (hash_sql, hash_params) = qb.build_where(&hash! {"status" => "active"}).unwrap();
    let (op_sql, op_params) = qb.build_where(&cond!["=", "status", "active"]).unwrap();
    let squash = |s: &str| s.replace([' ', '(', ')'], "");
    assert_eq!(squash(&hash_sql), squash(&op_sql));
    assert_eq!(hash_params, op_params);
}

#[test]
fn empty_in_excludes_everything_and_empty_not_in_vanishes() {
    let qb = QueryBuilder::postgres();
    let mut params = Params::new();
    let none = Condition::In(InCondition::new("id", "IN", Vec::<i32>::new()));
    assert_eq!(qb.build_condition_node(&none, &mut params).unwrap(), "0=1");
    let all = Condition::In(InCondition::new("id", "NOT IN", Vec::<i32>::new()));
    assert_eq!(qb.build_condition_node(&all, &mut params).unwrap(), "");
    assert!(params.is_empty());
}

#[test]
fn conjunctions_collapse() {
    let qb = QueryBuilder::postgres();
    let sql = |w: Where| qb.build_where(&w).unwrap().0;
    assert_eq!(sql(cond!["and"]), "");
    assert_eq!(sql(cond!["and", cond!["and"], cond!["or", ""]]), "");
    assert_eq!(sql(cond!["and", "a = 1"]), "a = 1");
    assert_eq!(sql(cond!["and", "a = 1", "b = 2"]), "(a = 1) AND (b = 2)");
    assert_eq!(sql(cond!["or", "a = 1", "b = 2", "c = 3"]), "(a = 1) OR (b = 2) OR (c = 3)");
}

#[test]
fn between_with_missing_bound_is_filtered() {
    assert!(cond!["between", "id", 1, None::<i32>].filter().is_none());
    let query = Query::new()
        .from(["t"])
        .filter_where(cond!["between", "id", 1, None::<i32>]);
    assert_eq!(QueryBuilder::postgres().build(&query).unwrap().0, r#"SELECT * FROM "t""#);
}

#[test]
fn case_construction_invariants() {
    let err = CaseX::new(Some(Operand::from("x")), Vec::<CaseArg>::new()).unwrap_err();
    assert_eq!(err.to_string(), "CASE expression must have at least one WHEN clause.");
    let err = CaseX::new(
        None,
        [
            CaseArg::from(WhenThen::new("a = 1", "1")),
            CaseArg::Else(Operand::from("2")),
            CaseArg::Else(Operand::from("3")),
        ],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "CASE expression can have only one \"else\" value.");
}

#[test]
fn like_escapes_and_wraps_single_value() {
    let qb = QueryBuilder::postgres();
    let (sql, params) = qb.build_where(&cond!["like", "name", "50%_off"]).unwrap();
    assert_eq!(sql, r#""name" LIKE :pv0"#);
    assert_eq!(params.len(), 1);
    assert_eq!(params.value(":pv0"), Some(&Value::String(r"%50\%\_off%".into())));
}

#[test]
fn in_definition_arity_is_checked() {
    let err = InCondition::from_definition("IN", vec![]).unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(err.to_string(), "Operator 'IN' requires two operands.");
}

#[test]
fn compiling_does_not_modify_the_query() {
    let query = busy_query();
    let before = format!("{query:?}");
    QueryBuilder::postgres().build(&query).unwrap();
    assert_eq!(format!("{query:?}"), before);
}

#[test]
fn builders_are_shared_across_threads() {
    let qb = std::sync::Arc::new(QueryBuilder::postgres());
    let expected = qb.build(&busy_query()).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let qb = qb.clone();
            std::thread::spawn(move || qb.build(&busy_query()).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn expression_values_render_in_place() {
    let qb = QueryBuilder::postgres();
    let (sql, params) = qb
        .build_where(&cond!["=", "updated_at", Expr::raw("NOW()")])
        .unwrap();
    assert_eq!(sql, r#""updated_at" = NOW()"#);
    assert!(params.is_empty());
}
