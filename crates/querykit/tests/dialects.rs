use chrono::NaiveDate;
use querykit::builder::simple_operator;
use querykit::expr::DateTimeType;
use querykit::{
    BuilderConfig, BuilderRegistry, DateTimeValue, Dialect, DialectKind, Expr,
    MultiOperandFunction, OperatorRegistry, PlaceholderStyle, Query, QueryBuilder, Quoter,
    StructuredValue, Value, Where, cond, hash, list, to_positional,
};

fn all() -> [QueryBuilder; 3] {
    [
        QueryBuilder::postgres(),
        QueryBuilder::mysql(),
        QueryBuilder::sqlite(),
    ]
}

fn where_sql(qb: &QueryBuilder, condition: Where) -> String {
    qb.build_where(&condition).unwrap().0
}

#[test]
fn test_quoting_per_dialect() {
    let query = Query::new()
        .select(["id", "name"])
        .from(["customer"])
        .where_(hash! {"status" => "active", "age" => [18, 19, 20]});
    let expected = [
        r#"SELECT "id", "name" FROM "customer" WHERE "status"=:pv0 AND "age" IN (:pv1, :pv2, :pv3)"#,
        "SELECT `id`, `name` FROM `customer` WHERE `status`=:pv0 AND `age` IN (:pv1, :pv2, :pv3)",
        "SELECT `id`, `name` FROM `customer` WHERE `status`=:pv0 AND `age` IN (:pv1, :pv2, :pv3)",
    ];
    for (qb, expected) in all().iter().zip(expected) {
        let (sql, params) = qb.build(&query).unwrap();
        assert_eq!(sql, expected);
        assert_eq!(params.len(), 4);
    }
}

#[test]
fn test_offset_without_limit() {
    let query = Query::new().from(["t"]).offset(10);
    let expected = [
        r#"SELECT * FROM "t" OFFSET 10"#,
        "SELECT * FROM `t` LIMIT 18446744073709551615 OFFSET 10",
        "SELECT * FROM `t` LIMIT -1 OFFSET 10",
    ];
    for (qb, expected) in all().iter().zip(expected) {
        assert_eq!(qb.build(&query).unwrap().0, expected);
    }
}

#[test]
fn test_boolean_literals() {
    let condition = cond!["=", "active", Expr::value(true)];
    let expected = [r#""active" = TRUE"#, "`active` = TRUE", "`active` = 1"];
    for (qb, expected) in all().iter().zip(expected) {
        assert_eq!(where_sql(qb, condition.clone()), expected);
    }
}

#[test]
fn test_composite_in_per_dialect() {
    let condition = cond!["in", ["id", "kind"], [list![1, "a"], list![2, "b"]]];
    assert_eq!(
        where_sql(&QueryBuilder::postgres(), condition.clone()),
        r#"("id", "kind") IN ((:pv0, :pv1), (:pv2, :pv3))"#
    );
    assert_eq!(
        where_sql(&QueryBuilder::mysql(), condition.clone()),
        "(`id`, `kind`) IN ((:pv0, :pv1), (:pv2, :pv3))"
    );
    assert_eq!(
        where_sql(&QueryBuilder::sqlite(), condition),
        "((`id` = :pv0 AND `kind` = :pv1) OR (`id` = :pv2 AND `kind` = :pv3))"
    );
}

#[test]
fn test_like_escape_clause_only_on_sqlite() {
    let condition = cond!["like", "name", "x"];
    assert_eq!(where_sql(&QueryBuilder::postgres(), condition.clone()), r#""name" LIKE :pv0"#);
    assert_eq!(where_sql(&QueryBuilder::mysql(), condition.clone()), "`name` LIKE :pv0");
    assert_eq!(
        where_sql(&QueryBuilder::sqlite(), condition),
        r"`name` LIKE :pv0 ESCAPE '\'"
    );
}

#[test]
fn test_greatest_least_names() {
    let greatest = MultiOperandFunction::greatest(["a", "b"]).unwrap();
    let least = MultiOperandFunction::least(["a", "b"]).unwrap();
    let query = Query::new()
        .select_as("hi", Expr::from(greatest))
        .select_as("lo", Expr::from(least));
    assert_eq!(
        QueryBuilder::postgres().build(&query).unwrap().0,
        r#"SELECT GREATEST(a, b) AS "hi", LEAST(a, b) AS "lo""#
    );
    assert_eq!(
        QueryBuilder::sqlite().build(&query).unwrap().0,
        "SELECT MAX(a, b) AS `hi`, MIN(a, b) AS `lo`"
    );
}

#[test]
fn test_array_merge_per_dialect() {
    let merge = MultiOperandFunction::array_merge([Expr::column("a"), Expr::column("b")]).unwrap();
    let build = |qb: &QueryBuilder| {
        let mut params = querykit::Params::new();
        qb.build_expression(&Expr::from(merge.clone()), &mut params).unwrap()
    };
    assert_eq!(
        build(&QueryBuilder::postgres()),
        r#"ARRAY(SELECT DISTINCT UNNEST("a" || "b"))"#
    );
    assert_eq!(
        build(&QueryBuilder::mysql()),
        concat!(
            "(SELECT JSON_ARRAYAGG(value) AS value FROM (",
            "SELECT value FROM JSON_TABLE(`a`, '$[*]' COLUMNS(value json PATH '$')) AS t UNION ",
            "SELECT value FROM JSON_TABLE(`b`, '$[*]' COLUMNS(value json PATH '$')) AS t) AS t)"
        )
    );
    assert_eq!(
        build(&QueryBuilder::sqlite()),
        "(SELECT json_group_array(value) AS value FROM (SELECT value FROM json_each(`a`) UNION SELECT value FROM json_each(`b`)))"
    );
}

#[test]
fn test_json_overlaps_per_dialect() {
    let condition = cond!["json overlaps", "tags", ["a", "b"]];
    let (pg_sql, pg_params) = QueryBuilder::postgres().build_where(&condition).unwrap();
    assert_eq!(
        pg_sql,
        r#"ARRAY(SELECT jsonb_array_elements_text("tags"::jsonb)) && ARRAY(SELECT jsonb_array_elements_text(:pv0::jsonb))"#
    );
    assert_eq!(pg_params.value(":pv0"), Some(&Value::String(r#"["a","b"]"#.into())));
    assert_eq!(
        where_sql(&QueryBuilder::mysql(), condition),
        "JSON_OVERLAPS(`tags`, :pv0)"
    );
}

#[test]
fn test_json_overlaps_rejects_expression_items() {
    let condition = cond!["json overlaps", "tags", list!["a", Expr::raw("NOW()")]];
    for qb in all() {
        let err = qb.build_where(&condition).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "Overlap values must be scalars or lists of scalars.");
    }
    let nested = cond!["json overlaps", "tags", list![list![1, 2], None::<i32>]];
    let (_, params) = QueryBuilder::mysql().build_where(&nested).unwrap();
    assert_eq!(params.value(":pv0"), Some(&Value::String("[[1,2],null]".into())));
}

#[test]
fn test_dialect_operators() {
    let pg = QueryBuilder::postgres();
    assert_eq!(where_sql(&pg, cond!["@>", "tags", "{a}"]), r#""tags" @> :pv0"#);
    assert_eq!(
        where_sql(&pg, cond!["or not ilike", "name", ["a", "b"]]),
        r#""name" NOT ILIKE :pv0 OR "name" NOT ILIKE :pv1"#
    );
    assert_eq!(
        where_sql(&pg, cond!["is distinct from", "a", 1]),
        r#""a" IS DISTINCT FROM :pv0"#
    );

    let mysql = QueryBuilder::mysql();
    assert_eq!(where_sql(&mysql, cond!["not regexp", "name", "^a"]), "`name` NOT REGEXP :pv0");
    assert!(mysql.build_where(&cond!["@>", "tags", "{a}"]).unwrap_err().is_invalid_argument());

    let sqlite = QueryBuilder::sqlite();
    assert_eq!(where_sql(&sqlite, cond!["glob", "name", "a*"]), "`name` GLOB :pv0");
    assert!(sqlite.build_where(&cond!["regexp", "name", "^a"]).is_err());
}

#[test]
fn test_structured_value_per_dialect() {
    let price = StructuredValue::new([("amount", Value::Int(10)), ("currency", "USD".into())])
        .with_type("currency_money");
    let condition = cond![">", "price", Expr::from(price)];
    let (sql, params) = QueryBuilder::postgres().build_where(&condition).unwrap();
    assert_eq!(sql, r#""price" > ROW(:pv0, :pv1)::currency_money"#);
    assert_eq!(params.value(":pv1"), Some(&Value::String("USD".into())));

    let (sql, params) = QueryBuilder::sqlite().build_where(&condition).unwrap();
    assert_eq!(sql, "`price` > :pv0");
    assert_eq!(
        params.value(":pv0"),
        Some(&Value::String(r#"{"amount":10,"currency":"USD"}"#.into()))
    );
}

#[test]
fn test_datetime_values_are_bound_as_text() {
    let at = NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|d| d.and_hms_opt(14, 5, 7))
        .unwrap();
    let condition = cond![">=", "created_at", Expr::from(DateTimeValue::from_naive(at, DateTimeType::DateTime))];
    for qb in all() {
        let (_, params) = qb.build_where(&condition).unwrap();
        assert_eq!(params.value(":pv0"), Some(&Value::String("2024-03-09 14:05:07".into())));
    }
}

#[test]
fn test_dialect_kind_round_trip() {
    for kind in [DialectKind::Postgres, DialectKind::MySql, DialectKind::Sqlite] {
        let parsed: DialectKind = kind.to_string().parse().unwrap();
        assert_eq!(parsed, kind);
        assert_eq!(QueryBuilder::for_dialect(kind).dialect().kind(), kind);
    }
}

#[test]
fn test_builder_from_toml_config() {
    let config = BuilderConfig::from_toml_str(
        r#"
dialect = "sqlite"
table_prefix = "app_"

[types]
money = "decimal(12,2)"

[log]
max_sql_length = 80
"#,
    )
    .unwrap();
    let qb = QueryBuilder::from_config(&config);
    assert_eq!(qb.dialect().kind(), DialectKind::Sqlite);
    assert_eq!(qb.column_type("money"), "decimal(12,2)");
    assert_eq!(qb.log_config().max_sql_length, Some(80));
    let (sql, _) = qb.build(&Query::new().from(["{{%user}}"])).unwrap();
    assert_eq!(sql, "SELECT * FROM `app_user`");
}

#[test]
fn test_positional_placeholders_for_drivers() {
    let query = Query::new()
        .from(["t"])
        .where_(cond!["and", hash! {"a" => 1}, cond!["like", "b", "x"]]);
    let (sql, params) = QueryBuilder::mysql().build(&query).unwrap();
    let (positional, ordered) = to_positional(&sql, &params, PlaceholderStyle::Question).unwrap();
    assert_eq!(positional, "SELECT * FROM `t` WHERE (`a`=?) AND (`b` LIKE ?)");
    assert_eq!(ordered.len(), 2);
    assert_eq!(ordered[1].value(), &Value::String("%x%".into()));

    let (sql, params) = QueryBuilder::postgres().build(&query).unwrap();
    let (positional, _) = to_positional(&sql, &params, PlaceholderStyle::Dollar).unwrap();
    assert_eq!(positional, r#"SELECT * FROM "t" WHERE ("a"=$1) AND ("b" LIKE $2)"#);
}

#[cfg(feature = "postgres")]
#[test]
fn test_pg_statement() {
    use querykit::PgStatement;

    let query = Query::new()
        .from(["t"])
        .where_(cond!["in", "id", [1, 2]])
        .and_where(Expr::raw_with_params("owner = :owner OR editor = :owner", [("owner", 9)]));
    let (sql, params) = QueryBuilder::postgres().build(&query).unwrap();
    let stmt = PgStatement::new(&sql, &params).unwrap();
    assert_eq!(
        stmt.sql(),
        r#"SELECT * FROM "t" WHERE ("id" IN ($1, $2)) AND (owner = $3 OR editor = $3)"#
    );
    assert_eq!(stmt.params().len(), 3);
}

/// A dialect defined outside the crate.
#[derive(Debug)]
struct Upper;

impl Dialect for Upper {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn quoter(&self) -> Quoter {
        Quoter::new(('[', ']'), ('[', ']'))
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "'Y'" } else { "'N'" }
    }

    fn default_types(&self) -> &'static [(&'static str, &'static str)] {
        &[("string", "nvarchar(255)")]
    }

    fn register(&self, _builders: &mut BuilderRegistry, operators: &mut OperatorRegistry) {
        operators.register("CONTAINS", simple_operator);
        operators.remove("NOT LIKE");
    }
}

#[test]
fn test_custom_dialect() {
    let qb = QueryBuilder::new(Upper);
    assert_eq!(
        where_sql(&qb, cond!["and", cond!["contains", "body", "x"], cond!["=", "ok", Expr::value(false)]]),
        "([body] CONTAINS :pv0) AND ([ok] = 'N')"
    );
    assert!(qb.build_where(&cond!["not like", "a", "b"]).is_err());
    assert_eq!(where_sql(&qb, cond!["like", "a", "b"]), "[a] LIKE :pv0");
    assert_eq!(qb.column_type("string(40)"), "nvarchar(40)");
    assert_eq!(
        qb.create_table("t", [("name", "string")], None).unwrap(),
        "CREATE TABLE [t] (\n\t[name] nvarchar(255)\n)"
    );
}
