use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    Postgres,
};
use uuid::Uuid;

#[derive(Clone)]
pub enum SqlxBinds {
    String(String),
    Int(i32),
    Uuid(Uuid),
}

pub fn binds_query_as<'a, T: for<'r> sqlx::FromRow<'r, PgRow>>(
    stmt: &'a str,
    binds: Vec<SqlxBinds>,
) -> QueryAs<'a, Postgres, T, PgArguments> {
    let mut q: QueryAs<'_, Postgres, T, PgArguments> = sqlx::query_as(stmt);
    for bind in binds.iter() {
        q = match bind {
            SqlxBinds::String(val) => q.bind(val.clone()),
            SqlxBinds::Int(val) => q.bind(*val),
            SqlxBinds::Uuid(val) => q.bind(*val),
        };
    }
    q
}

pub fn query_builder(
    select: Option<String>,
    table_name: &str,
    wheres: &[String],
    order_by: Vec<String>,
    limit: Option<u32>,
) -> String {
    // Select
    let mut stmt = "SELECT".to_string();
    if let Some(val) = select {
        stmt.push_str(&format!(" {}", val));
    } else {
        stmt.push_str(" *");
    }

    // From
    stmt.push_str(format!(" FROM {}", table_name).as_str());

    // Where
    if !wheres.is_empty() {
        stmt.push_str(" WHERE");
        for (idx, item) in wheres.iter().enumerate() {
            stmt.push_str(&format!(" {}", item));
            if idx < wheres.len() - 1 {
                stmt.push_str(" AND");
            }
        }
    }

    // order by
    if !order_by.is_empty() {
        stmt.push_str(" ORDER BY");
        for (idx, item) in order_by.iter().enumerate() {
            stmt.push_str(format!(" {}", item).as_str());
            if idx < order_by.len() - 1 {
                stmt.push(',');
            }
        }
    }

    // Limit
    if let Some(limit) = limit {
        stmt.push_str(format!(" LIMIT {}", limit).as_str());
    }
    stmt
}

#[cfg(test)]
mod tests {
    use super::query_builder;

    #[test]
    fn test_query_builder_full() {
        let stmt = query_builder(
            Some("id".to_string()),
            "public.student_skill",
            &["student_profile_id = $1".to_string(), "level = $2".to_string()],
            vec!["id ASC".to_string(), "name DESC".to_string()],
            Some(1),
        );
        assert_eq!(
            stmt,
            "SELECT id FROM public.student_skill WHERE student_profile_id = $1 AND level = $2 ORDER BY id ASC, name DESC LIMIT 1"
        );
    }

    #[test]
    fn test_query_builder_bare() {
        let stmt = query_builder(None, "public.student_profile", &[], vec![], None);
        assert_eq!(stmt, "SELECT * FROM public.student_profile");
    }
}
