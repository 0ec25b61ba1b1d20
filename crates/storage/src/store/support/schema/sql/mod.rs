#![forbid(unsafe_code)]

mod core;
mod datasets;
mod indexes;
mod lineage;
mod pragmas;
mod stages;
mod workflows;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(pragmas::SQL);
    sql.push_str(core::SQL);
    sql.push_str(stages::SQL);
    sql.push_str(workflows::SQL);
    sql.push_str(datasets::SQL);
    sql.push_str(lineage::SQL);
    sql.push_str(indexes::SQL);
    sql
}
