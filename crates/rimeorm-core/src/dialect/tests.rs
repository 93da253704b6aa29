use super::*;
use crate::{
    expr::{self, encode, eq, or_},
    model::{FieldDef, FieldRef, Record, TableModel},
    query::{Delete, Insert, Query, Update},
};
use serde_json::json;
use std::{collections::HashMap, sync::LazyLock};

static USER: LazyLock<TableModel> = LazyLock::new(|| {
    TableModel::define("user")
        .field(FieldDef::new("id").primary().autoincrement())
        .field(FieldDef::new("name"))
        .field(FieldDef::new("age").nullable())
        .build()
        .unwrap()
});

struct User {
    values: HashMap<String, Value>,
}

impl User {
    fn new(id: i64, name: &str, age: i64) -> Self {
        Self {
            values: HashMap::from([
                ("id".to_string(), Value::Int(id)),
                ("name".to_string(), Value::Text(name.to_string())),
                ("age".to_string(), Value::Int(age)),
            ]),
        }
    }

    fn unsaved(name: &str, age: i64) -> Self {
        Self {
            values: HashMap::from([
                ("id".to_string(), Value::Null),
                ("name".to_string(), Value::Text(name.to_string())),
                ("age".to_string(), Value::Int(age)),
            ]),
        }
    }
}

impl Record for User {
    fn model() -> &'static TableModel {
        &USER
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.values.get(field).cloned()
    }

    fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }
}

fn id() -> FieldRef {
    USER.field("id")
}

fn name() -> FieldRef {
    USER.field("name")
}

fn age() -> FieldRef {
    USER.field("age")
}

//
// mysql
//

#[test]
fn mysql_select_all_fields() {
    let (sql, params) = MySql::new().query(&Query::new(&USER)).unwrap();
    assert_eq!(
        sql,
        "select `user`.`id`, `user`.`name`, `user`.`age` from `user`"
    );
    assert!(params.is_empty());
}

#[test]
fn mysql_order_by() {
    let query = Query::new(&USER).order_by([id().asc(), name().desc()]);
    let (sql, _) = MySql::new().query(&query).unwrap();
    assert_eq!(
        sql,
        "select `user`.`id`, `user`.`name`, `user`.`age` from `user` \
         order by `user`.`id` asc, `user`.`name` desc"
    );
}

#[test]
fn mysql_limit() {
    let dialect = MySql::new();

    let (sql, _) = dialect.query(&Query::new(&USER).limit(5, 10)).unwrap();
    assert!(sql.ends_with("from `user` limit 5, 10"));

    let (sql, _) = dialect.query(&Query::new(&USER).first()).unwrap();
    assert!(sql.ends_with("from `user` limit 1"));

    let (sql, _) = dialect.query(&Query::new(&USER).limit(5, 10).all()).unwrap();
    assert!(sql.ends_with("from `user`"));
}

#[test]
fn mysql_full_query() {
    let query = Query::new(&USER)
        .filter([id().eq(1), name().eq("Tom")])
        .order_by([id().asc(), name().desc()])
        .limit(5, 10);

    let (sql, params) = MySql::new().query(&query).unwrap();
    assert_eq!(
        sql,
        "select `user`.`id`, `user`.`name`, `user`.`age` \
         from `user` \
         where `user`.`id` = %s and `user`.`name` = %s \
         order by `user`.`id` asc, `user`.`name` desc \
         limit 5, 10"
    );
    assert_eq!(params, vec![Value::Int(1), Value::Text("Tom".to_string())]);
}

#[test]
fn mysql_mixed_logic_brackets_or_only() {
    let query = Query::new(&USER)
        .filter([id().gt(1) & id().lt(10)])
        .filter([name().eq("tom") | name().eq("Tom")])
        .filter([age().gt(20) & age().eq(30)])
        .order_by([id().asc(), name().desc()])
        .limit(5, 10);

    let (sql, params) = MySql::new().query(&query).unwrap();
    assert_eq!(
        sql,
        "select `user`.`id`, `user`.`name`, `user`.`age` \
         from `user` \
         where `user`.`id` > %s and `user`.`id` < %s \
         and ( `user`.`name` = %s or `user`.`name` = %s ) \
         and `user`.`age` > %s and `user`.`age` = %s \
         order by `user`.`id` asc, `user`.`name` desc \
         limit 5, 10"
    );
    assert_eq!(
        params,
        vec![
            Value::Int(1),
            Value::Int(10),
            Value::Text("tom".to_string()),
            Value::Text("Tom".to_string()),
            Value::Int(20),
            Value::Int(30),
        ]
    );
}

#[test]
fn mysql_count_star_one_and_field() {
    let dialect = MySql::new();

    let (sql, _) = dialect.query(&Query::new(&USER).count("*")).unwrap();
    assert_eq!(sql, "select count(*) from `user`");

    let (sql, _) = dialect.query(&Query::new(&USER).count(1)).unwrap();
    assert_eq!(sql, "select count(1) from `user`");

    let (sql, _) = dialect.query(&Query::new(&USER).count(id())).unwrap();
    assert_eq!(sql, "select count(`user`.`id`) from `user`");

    let query = Query::new(&USER).filter([id().eq(1)]).count(id());
    let (sql, params) = dialect.query(&query).unwrap();
    assert_eq!(
        sql,
        "select count(`user`.`id`) from `user` where `user`.`id` = %s"
    );
    assert_eq!(params, vec![Value::Int(1)]);
}

#[test]
fn mysql_distinct_and_count_distinct() {
    let dialect = MySql::new();

    let query = Query::new(&USER).filter([name().eq("test")]).distinct(id());
    let (sql, params) = dialect.query(&query).unwrap();
    assert_eq!(
        sql,
        "select distinct `user`.`id` from `user` where `user`.`name` = %s"
    );
    assert_eq!(params, vec![Value::Text("test".to_string())]);

    let query = Query::new(&USER)
        .filter([name().eq("test")])
        .count_distinct("id");
    let (sql, _) = dialect.query(&query).unwrap();
    assert_eq!(
        sql,
        "select count(distinct `user`.`id`) from `user` where `user`.`name` = %s"
    );
}

#[test]
fn mysql_insert() {
    let insert = Insert::of::<User>()
        .row(&User::new(1, "test1", 20))
        .row(&User::new(2, "test2", 30));

    let (sql, rows) = MySql::new().insert(&insert).unwrap();
    assert_eq!(
        sql,
        "insert into `user` (`user`.`id`, `user`.`name`, `user`.`age`) values (%s, %s, %s)"
    );
    assert_eq!(
        rows,
        vec![
            vec![
                Value::Int(1),
                Value::Text("test1".to_string()),
                Value::Int(20)
            ],
            vec![
                Value::Int(2),
                Value::Text("test2".to_string()),
                Value::Int(30)
            ],
        ]
    );
}

#[test]
fn mysql_update() {
    let dialect = MySql::new();

    let update = Update::new(&USER).set("name", "test").unwrap();
    let (sql, params) = dialect.update(&update).unwrap();
    assert_eq!(sql, "update `user` set `user`.`name` = %s");
    assert_eq!(params, vec![Value::Text("test".to_string())]);

    let update = update.filter([id().eq(1)]);
    let (sql, params) = dialect.update(&update).unwrap();
    assert_eq!(
        sql,
        "update `user` set `user`.`name` = %s where `user`.`id` = %s"
    );
    assert_eq!(params, vec![Value::Text("test".to_string()), Value::Int(1)]);
}

#[test]
fn mysql_delete() {
    let dialect = MySql::new();

    let (sql, params) = dialect.delete(&Delete::new(&USER)).unwrap();
    assert_eq!(sql, "delete from `user`");
    assert!(params.is_empty());

    let delete = Delete::new(&USER).filter([id().eq(1)]);
    let (sql, params) = dialect.delete(&delete).unwrap();
    assert_eq!(sql, "delete from `user` where `user`.`id` = %s");
    assert_eq!(params, vec![Value::Int(1)]);
}

#[test]
fn mysql_upsert() {
    let user = User::new(1, "test", 20);
    let (sql, params) = MySql::new().upsert(&user).unwrap();
    assert_eq!(
        sql,
        "insert into `user` (`user`.`id`, `user`.`name`, `user`.`age`) values (%s, %s, %s) \
         on duplicate key update `user`.`name` = %s, `user`.`age` = %s"
    );
    assert_eq!(
        params,
        vec![
            Value::Int(1),
            Value::Text("test".to_string()),
            Value::Int(20),
            Value::Text("test".to_string()),
            Value::Int(20),
        ]
    );
}

#[test]
fn raw_sql_passes_through() {
    let (sql, params) = MySql::new().raw("select 1");
    assert_eq!(sql, "select 1");
    assert!(params.is_empty());

    let (sql, _) = Postgres::new().raw("select 1");
    assert_eq!(sql, "select 1");
}

//
// mysql predicate compilation
//

fn mysql_predicate(doc: serde_json::Value) -> (String, Params) {
    let dialect = MySql::new();
    let pred = encode(&doc).unwrap();
    dialect.predicate(&pred).unwrap()
}

#[test]
fn mysql_predicate_comparisons() {
    assert_eq!(
        mysql_predicate(json!({"name": "Tom"})),
        ("`name` = %s".to_string(), vec![Value::Text("Tom".to_string())])
    );
    assert_eq!(
        mysql_predicate(json!({"name": {"$ne": "Tom"}})),
        ("`name` != %s".to_string(), vec![Value::Text("Tom".to_string())])
    );
    assert_eq!(
        mysql_predicate(json!({"id": {"$gt": 1}})),
        ("`id` > %s".to_string(), vec![Value::Int(1)])
    );
    assert_eq!(
        mysql_predicate(json!({"id": {"$gte": 1}})),
        ("`id` >= %s".to_string(), vec![Value::Int(1)])
    );
    assert_eq!(
        mysql_predicate(json!({"id": {"$lt": 1}})),
        ("`id` < %s".to_string(), vec![Value::Int(1)])
    );
    assert_eq!(
        mysql_predicate(json!({"id": {"$lte": 1}})),
        ("`id` <= %s".to_string(), vec![Value::Int(1)])
    );
    assert_eq!(
        mysql_predicate(json!({"name": {"$regex": "Tom"}})),
        ("`name` REGEXP %s".to_string(), vec![Value::Text("Tom".to_string())])
    );
}

#[test]
fn mysql_predicate_like() {
    let (sql, params) = mysql_predicate(json!([
        {"name": {"$like": "_%"}},
        {"name": {"$not_like": "%_"}},
    ]));
    assert_eq!(sql, "`name` like %s and `name` not like %s");
    assert_eq!(
        params,
        vec![
            Value::Text("_%".to_string()),
            Value::Text("%_".to_string())
        ]
    );
}

#[test]
fn mysql_like_from_field_builder() {
    let name = FieldRef::synthetic("name");
    let dialect = MySql::new();

    let (sql, params) = dialect.predicate(&name.like("_%")).unwrap();
    assert_eq!(sql, "`name` like %s");
    assert_eq!(params, vec![Value::Text("_%".to_string())]);

    let (sql, _) = dialect.predicate(&name.not_like("%_")).unwrap();
    assert_eq!(sql, "`name` not like %s");
}

#[test]
fn mysql_predicate_logic() {
    let (sql, params) = mysql_predicate(json!({
        "$and": [
            {"id": {"$gt": 1}},
            {"name": {"$eq": "test"}},
        ],
        "id": {"$lt": 3},
    }));
    assert_eq!(sql, "`id` > %s and `name` = %s and `id` < %s");
    assert_eq!(
        params,
        vec![Value::Int(1), Value::Text("test".to_string()), Value::Int(3)]
    );

    let (sql, params) = mysql_predicate(json!({
        "$or": [
            {"id": {"$lt": 1}},
            {"id": {"$gt": 10}},
        ]
    }));
    assert_eq!(sql, "`id` < %s or `id` > %s");
    assert_eq!(params, vec![Value::Int(1), Value::Int(10)]);
}

#[test]
fn mysql_predicate_arithmetic() {
    for (doc, sql) in [
        (json!({"price": {"$add": [1, 2]}}), "`price` + %s = %s"),
        (json!({"price": {"$sub": [1, 2]}}), "`price` - %s = %s"),
        (json!({"price": {"$mul": [1, 2]}}), "`price` * %s = %s"),
        // historical symbol table: floordiv is `/`, truediv is `div`
        (json!({"price": {"$floordiv": [1, 2]}}), "`price` / %s = %s"),
        (json!({"price": {"$truediv": [1, 2]}}), "`price` div %s = %s"),
        (json!({"price": {"$mod": [1, 2]}}), "`price` % %s = %s"),
    ] {
        let (got, params) = mysql_predicate(doc);
        assert_eq!(got, sql);
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }
}

#[test]
fn mysql_predicate_dotted_path() {
    assert_eq!(
        mysql_predicate(json!({"user.name": "Tom"})),
        (
            "`user`.`name` = %s".to_string(),
            vec![Value::Text("Tom".to_string())]
        )
    );
}

#[test]
fn mysql_predicate_null_comparison() {
    let (sql, params) = mysql_predicate(json!({"age": null}));
    assert_eq!(sql, "`age` is null");
    assert!(params.is_empty());

    let (sql, params) = mysql_predicate(json!({"age": {"$ne": null}}));
    assert_eq!(sql, "`age` is not null");
    assert!(params.is_empty());
}

#[test]
fn mysql_predicate_in_binds_one_list_param() {
    let (sql, params) = mysql_predicate(json!({"id": {"$in": [1, 2, 3]}}));
    assert_eq!(sql, "`id` in %s");
    assert_eq!(
        params,
        vec![Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3)
        ])]
    );
}

//
// postgres
//

#[test]
fn postgres_select_and_full_query() {
    let dialect = Postgres::new();

    let (sql, _) = dialect.query(&Query::new(&USER)).unwrap();
    assert_eq!(sql, "select id, name, age from user");

    let query = Query::new(&USER)
        .filter([id().eq(1), name().eq("Tom")])
        .order_by([id().asc(), name().desc()])
        .limit(5, 10);
    let (sql, params) = dialect.query(&query).unwrap();
    assert_eq!(
        sql,
        "select id, name, age from user where id = %s and name = %s \
         order by id asc, name desc limit 5, 10"
    );
    assert_eq!(params, vec![Value::Int(1), Value::Text("Tom".to_string())]);
}

#[test]
fn postgres_mixed_logic() {
    let query = Query::new(&USER)
        .filter([id().gt(1) & id().lt(10)])
        .filter([name().eq("tom") | name().eq("Tom")])
        .filter([age().gt(20) & age().eq(30)]);
    let (sql, _) = Postgres::new().query(&query).unwrap();
    assert_eq!(
        sql,
        "select id, name, age from user \
         where id > %s and id < %s \
         and ( name = %s or name = %s ) \
         and age > %s and age = %s"
    );
}

#[test]
fn postgres_count_and_distinct() {
    let dialect = Postgres::new();

    let (sql, _) = dialect.query(&Query::new(&USER).count("*")).unwrap();
    assert_eq!(sql, "select count(*) from user");

    let (sql, _) = dialect.query(&Query::new(&USER).count(1)).unwrap();
    assert_eq!(sql, "select count(1) from user");

    let (sql, _) = dialect
        .query(&Query::new(&USER).filter([name().eq("test")]).count_distinct("id"))
        .unwrap();
    assert_eq!(sql, "select count(distinct id) from user where name = %s");
}

#[test]
fn postgres_insert() {
    let insert = Insert::of::<User>()
        .row(&User::new(1, "test1", 20))
        .row(&User::new(2, "test2", 30));

    let (sql, rows) = Postgres::new().insert(&insert).unwrap();
    assert_eq!(sql, "insert into user (id, name, age) values (%s, %s, %s)");
    assert_eq!(rows.len(), 2);
}

#[test]
fn postgres_insert_drops_unset_primary_keys() {
    let insert = Insert::of::<User>()
        .row(&User::unsaved("test1", 20))
        .row(&User::unsaved("test2", 30));

    let (sql, rows) = Postgres::new().insert(&insert).unwrap();
    assert_eq!(sql, "insert into user (name, age) values (%s, %s)");
    assert_eq!(
        rows,
        vec![
            vec![Value::Text("test1".to_string()), Value::Int(20)],
            vec![Value::Text("test2".to_string()), Value::Int(30)],
        ]
    );
}

#[test]
fn postgres_update_and_delete() {
    let dialect = Postgres::new();

    let update = Update::new(&USER)
        .set("name", "test")
        .unwrap()
        .filter([id().eq(1)]);
    let (sql, params) = dialect.update(&update).unwrap();
    assert_eq!(sql, "update user set name = %s where id = %s");
    assert_eq!(params, vec![Value::Text("test".to_string()), Value::Int(1)]);

    let delete = Delete::new(&USER).filter([id().eq(1)]);
    let (sql, params) = dialect.delete(&delete).unwrap();
    assert_eq!(sql, "delete from user where id = %s");
    assert_eq!(params, vec![Value::Int(1)]);
}

#[test]
fn postgres_regex_symbol() {
    let dialect = Postgres::new();
    let pred = expr::matches(FieldRef::synthetic("name"), "^a");
    let (sql, params) = dialect.predicate(&pred).unwrap();
    assert_eq!(sql, "name ~ %s");
    assert_eq!(params, vec![Value::Text("^a".to_string())]);
}

//
// failure modes
//

#[test]
fn unregistered_operator_is_rejected() {
    let custom = crate::operator::Operator::parse("$custom_sql_probe").unwrap();
    let pred = Predicate::new(custom, vec![id().into(), Value::Int(1).into()]);

    let err = MySql::new().predicate(&pred).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnregisteredOperator {
            dialect: "mysql",
            token: "$custom_sql_probe".to_string(),
        }
    );
}

#[test]
fn literal_in_identifier_position_is_rejected() {
    let pred = eq(Value::Int(1), Value::Int(2));
    let err = MySql::new().predicate(&pred).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedExpression { .. }));
}

#[test]
fn unary_comparison_is_rejected() {
    let pred = Predicate::new(crate::operator::EQ, vec![Value::Int(1).into()]);
    let err = MySql::new().predicate(&pred).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedExpression { .. }));
}

#[test]
fn comparison_against_field_is_rejected() {
    let pred = eq(id(), name());
    let err = MySql::new().predicate(&pred).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedExpression { .. }));
}

#[test]
fn or_of_predicate_helpers_matches_builder_output() {
    let pred = or_([id().lt(1), id().gt(10)]);
    let (sql, params) = MySql::new().predicate(&pred).unwrap();
    assert_eq!(sql, "`user`.`id` < %s or `user`.`id` > %s");
    assert_eq!(params, vec![Value::Int(1), Value::Int(10)]);
}
