use querykit::{
    ColumnDef, Expr, Operand, Query, QueryBuilder, Value, cond, hash, row,
};

// ==================== INSERT ====================

#[test]
fn test_insert() {
    let (sql, params) = QueryBuilder::postgres()
        .insert(
            "customer",
            row! {"name" => "Ann", "age" => 30, "note" => None::<&str>, "created_at" => Expr::raw("NOW()")},
        )
        .unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "customer" ("name", "age", "note", "created_at") VALUES (:pv0, :pv1, NULL, NOW())"#
    );
    assert_eq!(params.len(), 2);
    assert_eq!(params.value(":pv1"), Some(&Value::Int(30)));
}

#[test]
fn test_insert_sub_query_value() {
    let latest = Query::new().select([Expr::raw("MAX(id)")]).from(["batch"]);
    let (sql, _) = QueryBuilder::mysql()
        .insert("job", row! {"batch_id" => Expr::query(latest), "state" => "new"})
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO `job` (`batch_id`, `state`) VALUES ((SELECT MAX(id) FROM `batch`), :pv0)"
    );
}

#[test]
fn test_empty_insert_per_dialect() {
    let pg = QueryBuilder::postgres().insert("t", vec![]).unwrap().0;
    let mysql = QueryBuilder::mysql().insert("t", vec![]).unwrap().0;
    let sqlite = QueryBuilder::sqlite().insert("t", vec![]).unwrap().0;
    assert_eq!(pg, r#"INSERT INTO "t" DEFAULT VALUES"#);
    assert_eq!(mysql, "INSERT INTO `t` () VALUES ()");
    assert_eq!(sqlite, "INSERT INTO `t` DEFAULT VALUES");
}

#[test]
fn test_insert_batch() {
    let rows = vec![
        vec![Operand::from(1), Operand::from("a")],
        vec![Operand::from(2), Operand::Null],
    ];
    let (sql, params) = QueryBuilder::postgres()
        .insert_batch("item", &["id", "label"], rows)
        .unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "item" ("id", "label") VALUES (:pv0, :pv1), (:pv2, NULL)"#
    );
    assert_eq!(params.len(), 3);
}

#[test]
fn test_insert_batch_edge_cases() {
    let qb = QueryBuilder::postgres();
    let (sql, params) = qb
        .insert_batch("item", &["id"], Vec::<Vec<Operand>>::new())
        .unwrap();
    assert_eq!(sql, "");
    assert!(params.is_empty());

    let err = qb
        .insert_batch("item", &["id", "label"], vec![vec![1, 2, 3]])
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(
        err.to_string(),
        "Batch insert row has 3 values for 2 columns."
    );

    let (sql, _) = qb.insert_batch("item", &[], vec![vec![1, 2]]).unwrap();
    assert_eq!(sql, r#"INSERT INTO "item" VALUES (:pv0, :pv1)"#);
}

#[test]
fn test_insert_from_query() {
    let select = Query::new()
        .select(["id", "name"])
        .from(["customer"])
        .where_(hash! {"status" => "archived"});
    let (sql, params) = QueryBuilder::postgres()
        .insert_from_query("customer_archive", &["id", "name"], &select)
        .unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "customer_archive" ("id", "name") SELECT "id", "name" FROM "customer" WHERE "status"=:pv0"#
    );
    assert_eq!(params.value(":pv0"), Some(&Value::String("archived".into())));
}

// ==================== UPDATE / DELETE ====================

#[test]
fn test_update() {
    let (sql, params) = QueryBuilder::postgres()
        .update(
            "customer",
            row! {"status" => "inactive", "visits" => Expr::raw("visits + 1")},
            cond!["<", "last_seen", "2024-01-01"],
        )
        .unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "customer" SET "status"=:pv0, "visits"=visits + 1 WHERE "last_seen" < :pv1"#
    );
    assert_eq!(params.len(), 2);
}

#[test]
fn test_update_without_condition() {
    let (sql, _) = QueryBuilder::sqlite()
        .update("t", row! {"flag" => true}, None)
        .unwrap();
    assert_eq!(sql, "UPDATE `t` SET `flag`=:pv0");

    let err = QueryBuilder::sqlite().update("t", vec![], None).unwrap_err();
    assert_eq!(err.to_string(), "Update requires at least one column.");
}

#[test]
fn test_delete() {
    let qb = QueryBuilder::mysql();
    let (sql, params) = qb
        .delete("session", hash! {"user_id" => [1, 2], "expired" => true})
        .unwrap();
    assert_eq!(
        sql,
        "DELETE FROM `session` WHERE `user_id` IN (:pv0, :pv1) AND `expired`=:pv2"
    );
    assert_eq!(params.len(), 3);

    assert_eq!(qb.delete("session", None).unwrap().0, "DELETE FROM `session`");
    assert_eq!(qb.delete("session", cond!["and"]).unwrap().0, "DELETE FROM `session`");
}

#[test]
fn test_dml_uses_table_prefix() {
    let qb = QueryBuilder::postgres().with_table_prefix("app_");
    let (sql, _) = qb.delete("{{%token}}", hash! {"id" => 1}).unwrap();
    assert_eq!(sql, r#"DELETE FROM "app_token" WHERE "id"=:pv0"#);
}

// ==================== Tables and columns ====================

#[test]
fn test_create_table() {
    let sql = QueryBuilder::postgres()
        .create_table(
            "customer",
            [
                ColumnDef::column("id", "pk"),
                ColumnDef::column("email", "string(64) NOT NULL"),
                ColumnDef::column("profile", "json"),
                ColumnDef::raw("UNIQUE (email)"),
            ],
            None,
        )
        .unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE \"customer\" (\n\t\"id\" serial NOT NULL PRIMARY KEY,\n\t\"email\" varchar(64) NOT NULL,\n\t\"profile\" jsonb,\n\tUNIQUE (email)\n)"
    );
}

#[test]
fn test_create_table_options_and_types() {
    let mysql = QueryBuilder::mysql()
        .create_table("t", [("id", "pk"), ("name", "string")], Some("ENGINE=InnoDB"))
        .unwrap();
    assert_eq!(
        mysql,
        "CREATE TABLE `t` (\n\t`id` int(11) NOT NULL AUTO_INCREMENT PRIMARY KEY,\n\t`name` varchar(255)\n) ENGINE=InnoDB"
    );
    let sqlite = QueryBuilder::sqlite()
        .create_table("t", [("id", "pk")], None)
        .unwrap();
    assert_eq!(
        sqlite,
        "CREATE TABLE `t` (\n\t`id` integer PRIMARY KEY AUTOINCREMENT NOT NULL\n)"
    );
    let err = QueryBuilder::sqlite()
        .create_table("t", Vec::<ColumnDef>::new(), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Table must have at least one column.");
}

#[test]
fn test_table_statements() {
    let pg = QueryBuilder::postgres();
    assert_eq!(pg.drop_table("t", false, false).unwrap(), r#"DROP TABLE "t""#);
    assert_eq!(
        pg.drop_table("public.t", true, true).unwrap(),
        r#"DROP TABLE IF EXISTS "public"."t" CASCADE"#
    );
    assert_eq!(pg.rename_table("a", "b").unwrap(), r#"ALTER TABLE "a" RENAME TO "b""#);
    assert_eq!(pg.truncate_table("t").unwrap(), r#"TRUNCATE TABLE "t""#);

    let mysql = QueryBuilder::mysql();
    assert_eq!(mysql.rename_table("a", "b").unwrap(), "RENAME TABLE `a` TO `b`");
    assert_eq!(mysql.truncate_table("t").unwrap(), "TRUNCATE TABLE `t`");

    let sqlite = QueryBuilder::sqlite();
    assert_eq!(sqlite.truncate_table("t").unwrap(), "DELETE FROM `t`");
    assert_eq!(sqlite.rename_table("a", "b").unwrap(), "ALTER TABLE `a` RENAME TO `b`");
}

#[test]
fn test_column_statements() {
    let pg = QueryBuilder::postgres();
    assert_eq!(
        pg.add_column("t", "bio", "text").unwrap(),
        r#"ALTER TABLE "t" ADD "bio" text"#
    );
    assert_eq!(
        pg.drop_column("t", "bio").unwrap(),
        r#"ALTER TABLE "t" DROP COLUMN "bio""#
    );
    assert_eq!(
        pg.rename_column("t", "bio", "about").unwrap(),
        r#"ALTER TABLE "t" RENAME COLUMN "bio" TO "about""#
    );
    assert_eq!(
        pg.alter_column("t", "name", "string(100)").unwrap(),
        r#"ALTER TABLE "t" ALTER COLUMN "name" TYPE varchar(100)"#
    );
    assert_eq!(
        QueryBuilder::mysql().alter_column("t", "name", "string(100)").unwrap(),
        "ALTER TABLE `t` CHANGE `name` `name` varchar(100)"
    );
    let err = QueryBuilder::sqlite().alter_column("t", "name", "text").unwrap_err();
    assert!(err.is_not_supported());
    assert_eq!(err.to_string(), "sqlite does not support altering columns.");
}

// ==================== Constraints and indexes ====================

#[test]
fn test_constraints() {
    let pg = QueryBuilder::postgres();
    assert_eq!(
        pg.add_primary_key("pk_t", "t", &["a", "b"]).unwrap(),
        r#"ALTER TABLE "t" ADD CONSTRAINT "pk_t" PRIMARY KEY ("a", "b")"#
    );
    assert_eq!(
        pg.drop_primary_key("pk_t", "t").unwrap(),
        r#"ALTER TABLE "t" DROP CONSTRAINT "pk_t""#
    );
    assert_eq!(
        pg.add_foreign_key(
            "fk_order_customer",
            "order",
            &["customer_id"],
            "customer",
            &["id"],
            Some("CASCADE"),
            Some("NO ACTION"),
        )
        .unwrap(),
        r#"ALTER TABLE "order" ADD CONSTRAINT "fk_order_customer" FOREIGN KEY ("customer_id") REFERENCES "customer" ("id") ON DELETE CASCADE ON UPDATE NO ACTION"#
    );
    assert_eq!(
        pg.drop_foreign_key("fk_order_customer", "order").unwrap(),
        r#"ALTER TABLE "order" DROP CONSTRAINT "fk_order_customer""#
    );
    assert_eq!(
        pg.add_unique("uq_email", "customer", &["email"]).unwrap(),
        r#"ALTER TABLE "customer" ADD CONSTRAINT "uq_email" UNIQUE ("email")"#
    );
    assert_eq!(
        pg.add_check("ck_age", "customer", "age >= 0").unwrap(),
        r#"ALTER TABLE "customer" ADD CONSTRAINT "ck_age" CHECK (age >= 0)"#
    );
    assert_eq!(
        pg.drop_check("ck_age", "customer").unwrap(),
        r#"ALTER TABLE "customer" DROP CONSTRAINT "ck_age""#
    );
    assert_eq!(
        QueryBuilder::mysql().drop_foreign_key("fk", "order").unwrap(),
        "ALTER TABLE `order` DROP FOREIGN KEY `fk`"
    );
}

#[test]
fn test_sqlite_rejects_constraint_alteration() {
    let qb = QueryBuilder::sqlite();
    let err = qb.add_primary_key("pk", "t", &["id"]).unwrap_err();
    assert_eq!(err.to_string(), "sqlite does not support adding primary keys.");
    assert!(qb.drop_unique("uq", "t").unwrap_err().is_not_supported());
    assert!(qb.add_check("ck", "t", "a > 0").unwrap_err().is_not_supported());
    assert!(
        qb.add_foreign_key("fk", "a", &["b_id"], "b", &["id"], None, None)
            .unwrap_err()
            .is_not_supported()
    );
    assert!(qb.drop_foreign_key("fk", "a").unwrap_err().is_not_supported());
}

#[test]
fn test_indexes() {
    let pg = QueryBuilder::postgres();
    assert_eq!(
        pg.create_index("idx_name", "t", &["name"], None, None).unwrap(),
        r#"CREATE INDEX "idx_name" ON "t" ("name")"#
    );
    assert_eq!(
        pg.create_index("uq_email", "t", &["email", "tenant"], Some("UNIQUE"), Some("btree"))
            .unwrap(),
        r#"CREATE UNIQUE INDEX "uq_email" ON "t" USING btree ("email", "tenant")"#
    );
    assert_eq!(pg.drop_index("idx_name", "t").unwrap(), r#"DROP INDEX "idx_name""#);
    assert_eq!(
        QueryBuilder::mysql().drop_index("idx_name", "t").unwrap(),
        "DROP INDEX `idx_name` ON `t`"
    );
}

// ==================== Views and comments ====================

#[test]
fn test_create_view_inlines_parameters() {
    let query = Query::new()
        .select(["id", "name"])
        .from(["customer"])
        .where_(hash! {"status" => "it's active", "vip" => true})
        .and_where(cond![">", "age", 18]);
    assert_eq!(
        QueryBuilder::postgres().create_view("active_customer", &query).unwrap(),
        r#"CREATE VIEW "active_customer" AS SELECT "id", "name" FROM "customer" WHERE ("status"='it''s active' AND "vip"=TRUE) AND ("age" > 18)"#
    );
    assert_eq!(
        QueryBuilder::sqlite().create_view("v", &query).unwrap(),
        "CREATE VIEW `v` AS SELECT `id`, `name` FROM `customer` WHERE (`status`='it''s active' AND `vip`=1) AND (`age` > 18)"
    );
    assert_eq!(QueryBuilder::postgres().drop_view("v").unwrap(), r#"DROP VIEW "v""#);
}

#[test]
fn test_create_view_many_parameters() {
    let ids: Vec<i32> = (1..=12).collect();
    let query = Query::new().from(["t"]).where_(cond!["in", "id", ids]);
    let sql = QueryBuilder::postgres().create_view("v", &query).unwrap();
    assert_eq!(
        sql,
        r#"CREATE VIEW "v" AS SELECT * FROM "t" WHERE "id" IN (1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12)"#
    );
}

#[test]
fn test_create_view_rejects_binary() {
    let query = Query::new()
        .from(["t"])
        .where_(cond!["=", "digest", Value::Bytes(vec![0xde, 0xad])]);
    let err = QueryBuilder::postgres().create_view("v", &query).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Binary parameters cannot be inlined into a view."
    );
}

#[test]
fn test_comments() {
    let pg = QueryBuilder::postgres();
    assert_eq!(
        pg.add_comment_on_column("t", "name", "Display name").unwrap(),
        r#"COMMENT ON COLUMN "t"."name" IS 'Display name'"#
    );
    assert_eq!(
        pg.add_comment_on_table("t", "Customers").unwrap(),
        r#"COMMENT ON TABLE "t" IS 'Customers'"#
    );
    assert_eq!(
        pg.drop_comment_from_column("t", "name").unwrap(),
        r#"COMMENT ON COLUMN "t"."name" IS NULL"#
    );
    assert_eq!(pg.drop_comment_from_table("t").unwrap(), r#"COMMENT ON TABLE "t" IS NULL"#);

    let mysql = QueryBuilder::mysql();
    assert_eq!(
        mysql.add_comment_on_table("t", "Customers").unwrap(),
        "ALTER TABLE `t` COMMENT 'Customers'"
    );
    assert_eq!(mysql.drop_comment_from_table("t").unwrap(), "ALTER TABLE `t` COMMENT ''");
    assert!(mysql.add_comment_on_column("t", "c", "x").unwrap_err().is_not_supported());

    let sqlite = QueryBuilder::sqlite();
    assert!(sqlite.add_comment_on_table("t", "x").unwrap_err().is_not_supported());
    assert!(sqlite.drop_comment_from_column("t", "c").unwrap_err().is_not_supported());
}
