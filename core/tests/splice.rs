//! WHERE injection: placement relative to trailing clauses.

use ride_analytics_core::splice::{split_trailing_clause, splice_predicates};

fn where_count(sql: &str) -> usize {
    sql.to_ascii_lowercase().matches("where").count()
}

#[test]
fn vehicle_filter_goes_before_order_by() {
    let out = splice_predicates("SELECT * FROM t ORDER BY x", "Vehicle_Type IN (:veh_0)");
    assert_eq!(out, "SELECT * FROM t WHERE Vehicle_Type IN (:veh_0) ORDER BY x;");
}

#[test]
fn existing_where_is_extended_with_and() {
    let out = splice_predicates("SELECT * FROM t WHERE y=1 GROUP BY z", "Payment_Method IN (:pay_0)");
    assert_eq!(out, "SELECT * FROM t WHERE y=1 AND Payment_Method IN (:pay_0) GROUP BY z;");
}

#[test]
fn query_without_trailing_clause_gets_single_where() {
    let bases = [
        "SELECT * FROM ola_clean",
        "SELECT Booking_ID, Booking_Value FROM ola_clean",
        "select count(*) from ola_clean;",
    ];
    for base in bases {
        let out = splice_predicates(base, "Vehicle_Type IN (:veh_0)");
        assert_eq!(where_count(&out), 1, "{out}");
        assert!(out.ends_with(" WHERE Vehicle_Type IN (:veh_0);"), "{out}");
    }
}

#[test]
fn existing_where_never_duplicated() {
    let bases = [
        "SELECT * FROM ola_clean WHERE Booking_Status = 'Success'",
        "SELECT * FROM ola_clean where Booking_Value > 100 ORDER BY Booking_Value DESC",
        "SELECT Vehicle_Type, AVG(Booking_Value) FROM ola_clean WHERE Booking_Value > 0 GROUP BY Vehicle_Type HAVING COUNT(*) > 1",
    ];
    for base in bases {
        let out = splice_predicates(base, "Payment_Method IN (:pay_0)");
        assert_eq!(where_count(&out), 1, "{out}");
        assert!(out.contains(" AND Payment_Method IN (:pay_0)"), "{out}");
    }
}

#[test]
fn trailing_clause_text_is_preserved_and_after_predicates() {
    let cases = [
        ("SELECT a FROM t\nGROUP BY a\nHAVING COUNT(*) > 2", "GROUP BY a\nHAVING COUNT(*) > 2"),
        ("SELECT a FROM t HAVING SUM(b) > 0", "HAVING SUM(b) > 0"),
        ("SELECT a FROM t order   by a desc LIMIT 5", "order   by a desc LIMIT 5"),
        ("SELECT a FROM t WHERE b = 1 LIMIT 10", "LIMIT 10"),
    ];
    let predicate = "Vehicle_Type IN (:veh_0)";
    for (base, tail) in cases {
        let out = splice_predicates(base, predicate);
        let tail_at = out.find(tail).unwrap_or_else(|| panic!("tail missing from {out}"));
        let pred_at = out.find(predicate).unwrap();
        assert!(pred_at < tail_at, "{out}");
        assert_eq!(&out[tail_at..], format!("{tail};"));
    }
}

#[test]
fn empty_predicates_only_normalize_terminator() {
    assert_eq!(splice_predicates("SELECT 1;", ""), "SELECT 1;");
    assert_eq!(
        splice_predicates("  SELECT * FROM t\nORDER BY x ;\n", ""),
        "SELECT * FROM t ORDER BY x;"
    );
}

#[test]
fn multiple_predicates_are_inserted_verbatim() {
    let preds = "Vehicle_Type IN (:veh_0, :veh_1) AND Payment_Method IN (:pay_0)";
    let out = splice_predicates("SELECT * FROM t", preds);
    assert_eq!(out, format!("SELECT * FROM t WHERE {preds};"));
}

#[test]
fn keywords_in_literals_do_not_split() {
    let base = "SELECT * FROM t WHERE note = 'limit reached' ORDER BY id";
    let out = splice_predicates(base, "x = :x");
    assert_eq!(out, "SELECT * FROM t WHERE note = 'limit reached' AND x = :x ORDER BY id;");
}

#[test]
fn subquery_clauses_are_not_top_level() {
    let base = "SELECT * FROM (SELECT * FROM t WHERE a = 1 ORDER BY b LIMIT 5) s";
    let split = split_trailing_clause(base);
    assert_eq!(split.tail, "");
    assert!(!split.head_has_where);

    let out = splice_predicates(base, "c = :c");
    assert_eq!(out, format!("{base} WHERE c = :c;"));
}

#[test]
fn window_order_by_is_ignored() {
    let base = "SELECT Booking_ID, ROW_NUMBER() OVER (ORDER BY Booking_Value) AS rn FROM t ORDER BY rn";
    let out = splice_predicates(base, "x = :x");
    assert_eq!(
        out,
        "SELECT Booking_ID, ROW_NUMBER() OVER (ORDER BY Booking_Value) AS rn FROM t WHERE x = :x ORDER BY rn;"
    );
}

#[test]
fn commented_where_is_not_counted() {
    let base = "SELECT * FROM t -- where clause added by filters\nORDER BY id";
    let out = splice_predicates(base, "x = :x");
    assert_eq!(out, "SELECT * FROM t -- where clause added by filters\nWHERE x = :x ORDER BY id;");
}

#[test]
fn trailing_line_comment_does_not_swallow_terminator() {
    let out = splice_predicates("SELECT * FROM t ORDER BY id -- newest last", "");
    assert_eq!(out, "SELECT * FROM t ORDER BY id -- newest last\n;");
}

#[test]
fn keyword_inside_slash_star_slash_comment_is_ignored() {
    let base = "SELECT * FROM t /*/ ORDER BY x */ WHERE a = 1";
    let out = splice_predicates(base, "v = :v");
    assert_eq!(out, "SELECT * FROM t /*/ ORDER BY x */ WHERE a = 1 AND v = :v;");
}

#[test]
fn bracketed_identifier_is_not_a_clause() {
    let out = splice_predicates("SELECT [order by] FROM t", "v = :v");
    assert_eq!(out, "SELECT [order by] FROM t WHERE v = :v;");
}

#[test]
fn where_in_earlier_union_arm_does_not_count() {
    let base = "SELECT a FROM t1 WHERE b = 1 UNION SELECT a FROM t2 ORDER BY a";
    let out = splice_predicates(base, "v = :v");
    assert_eq!(out, "SELECT a FROM t1 WHERE b = 1 UNION SELECT a FROM t2 WHERE v = :v ORDER BY a;");

    let split = split_trailing_clause("SELECT a FROM t1 UNION SELECT a FROM t2 WHERE c = 2");
    assert!(split.head_has_where);
}
